//! MCP server for the data.gov.hk tools.
//!
//! Serves a [`ToolRegistry`] over the MCP streamable HTTP transport, or over
//! newline-delimited stdio.
//!
//! # Example
//!
//! ```ignore
//! use datagovhk_server::{Server, ServerConfig, shutdown_signal};
//! use datagovhk_tools::{Upstream, default_registry};
//!
//! let upstream = Upstream::http("https://data.gov.hk", Duration::from_secs(10))?;
//! let server = Server::new(default_registry(upstream), ServerConfig::new());
//! server.run(shutdown_signal(false)).await?;
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod shutdown;
pub mod state;
pub mod stdio;

pub use config::{ServerConfig, normalize_mcp_path};
pub use dispatch::{Dispatcher, parse_message, tool_result};
pub use error::{Result, ServerError};
pub use shutdown::shutdown_signal;
pub use state::{AppState, SessionStore};

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use datagovhk_tools::ToolRegistry;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The data.gov.hk MCP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server over `tools`.
    pub fn new(tools: ToolRegistry, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(tools, config),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(routes::health_routes())
            .merge(routes::mcp_routes(self.state.config.mcp_path()))
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size));

        let router = if self.state.config.request_logging {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        };

        router.with_state(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener (useful for testing).
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        let router = self.router();

        // Spawning clients wait for this line on stderr.
        info!(
            "MCP server listening on {} (endpoint http://{}{})",
            local,
            local,
            self.state.config.mcp_path()
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("MCP server stopped");
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC on this process's stdin/stdout.
    pub async fn run_stdio(self) -> Result<()> {
        info!("MCP server listening on stdio");
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        stdio::serve_stdio(&self.state.dispatcher, stdin, tokio::io::stdout()).await
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
