//! Serve command - runs the MCP server.

use std::net::SocketAddr;

use anyhow::{Context as _, Result};
use clap::Args;
use datagovhk_server::{Server, ServerConfig, shutdown_signal};
use datagovhk_tools::{Upstream, default_registry};

use super::Context;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (default from config, else 127.0.0.1:8000)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// HTTP path of the MCP endpoint (default: /mcp)
    #[arg(long)]
    pub path: Option<String>,

    /// Speak newline-delimited JSON-RPC on stdin/stdout instead of HTTP
    #[arg(long, conflicts_with_all = ["bind", "path", "shutdown_on_stdin_close"])]
    pub stdio: bool,

    /// Shut down gracefully once stdin is closed
    #[arg(long)]
    pub shutdown_on_stdin_close: bool,

    /// Base URL of the data.gov.hk API
    #[arg(long, env = "DATAGOVHK_UPSTREAM_URL")]
    pub upstream_url: Option<String>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let upstream_url = args
        .upstream_url
        .as_deref()
        .unwrap_or_else(|| ctx.config.upstream.base_url());
    let upstream = Upstream::http(upstream_url, ctx.config.upstream.timeout())
        .with_context(|| format!("invalid upstream URL '{}'", upstream_url))?;
    let tools = default_registry(upstream);

    tracing::info!(
        tools = tools.len(),
        upstream = %upstream_url,
        "starting data.gov.hk MCP server"
    );

    if args.stdio {
        let server = Server::new(tools, ServerConfig::new());
        server.run_stdio().await?;
        return Ok(());
    }

    let bind = match args.bind {
        Some(addr) => addr,
        None => ctx.config.server.bind_address()?,
    };
    let path = match args.path {
        Some(path) => path,
        None => ctx.config.server.mcp_path()?,
    };
    let config = ServerConfig::new()
        .with_bind_address(bind)
        .with_mcp_path(&path)?;

    Server::new(tools, config)
        .run(shutdown_signal(args.shutdown_on_stdin_close))
        .await?;
    Ok(())
}
