//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};

use crate::error::{Result, ServerError};

/// Default HTTP path of the MCP endpoint.
pub const DEFAULT_MCP_PATH: &str = "/mcp";

/// Default max body size for MCP requests (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Path of the MCP endpoint, e.g. `/mcp`. Served with and without a
    /// trailing slash. Only set through [`ServerConfig::with_mcp_path`].
    mcp_path: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Enable per-request HTTP tracing.
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            mcp_path: DEFAULT_MCP_PATH.to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_logging: true,
        }
    }
}

impl ServerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the MCP endpoint path. See [`normalize_mcp_path`].
    pub fn with_mcp_path(mut self, path: impl AsRef<str>) -> Result<Self> {
        self.mcp_path = normalize_mcp_path(path.as_ref())?;
        Ok(self)
    }

    /// The validated MCP endpoint path.
    pub fn mcp_path(&self) -> &str {
        &self.mcp_path
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }
}

/// Canonical form of an endpoint path: one leading `/`, no trailing `/`.
///
/// Segments are limited to unreserved URL characters so the path can never
/// be read as a route parameter or wildcard. The root path is rejected.
pub fn normalize_mcp_path(raw: &str) -> Result<String> {
    let invalid = |reason: &str| {
        ServerError::InvalidConfig(format!("MCP path '{}' {}", raw, reason))
    };

    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(invalid("must name an endpoint below '/'"));
    }

    for segment in trimmed.split('/') {
        if segment.is_empty() {
            return Err(invalid("contains an empty segment"));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~');
        if !segment.chars().all(allowed) {
            return Err(invalid(
                "may only contain letters, digits, '-', '_', '.', '~' and '/'",
            ));
        }
    }

    Ok(format!("/{}", trimmed))
}
