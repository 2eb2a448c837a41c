//! Configuration types.
//!
//! Each section mirrors a TOML table. Fields are optional so that several
//! files can be layered; the accessor methods resolve the final value.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default address the MCP server binds to.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Default HTTP path of the MCP endpoint.
pub const DEFAULT_MCP_PATH: &str = "/mcp";

/// Default upstream API base URL.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://data.gov.hk";

/// Default upstream request timeout (10 seconds).
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Default MCP endpoint the client connects to.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/mcp/";

/// Default time to wait for a spawned server to report readiness (20 seconds).
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(20);

/// Default substring that marks a spawned server as ready.
pub const DEFAULT_READY_MARKER: &str = "listening";

/// Default grace period between a terminate request and a force kill (2 seconds).
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatagovhkConfig {
    /// `[server]` table.
    pub server: ServerSection,
    /// `[upstream]` table.
    pub upstream: UpstreamSection,
    /// `[client]` table.
    pub client: ClientSection,
}

impl DatagovhkConfig {
    /// Create an empty configuration (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: DatagovhkConfig) {
        self.server.merge(other.server);
        self.upstream.merge(other.upstream);
        self.client.merge(other.client);
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Socket address to bind, e.g. `"127.0.0.1:8000"`.
    pub bind: Option<String>,
    /// HTTP path of the MCP endpoint.
    pub path: Option<String>,
}

impl ServerSection {
    fn merge(&mut self, other: ServerSection) {
        if other.bind.is_some() {
            self.bind = other.bind;
        }
        if other.path.is_some() {
            self.path = other.path;
        }
    }

    /// Resolved bind address.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let raw = self.bind.as_deref().unwrap_or(DEFAULT_BIND);
        raw.parse().map_err(|e| ConfigError::InvalidValue {
            field: "server.bind".to_string(),
            reason: format!("'{}': {}", raw, e),
        })
    }

    /// Resolved endpoint path, always starting with `/` and without a trailing slash.
    ///
    /// The root path and segments outside the unreserved URL characters are
    /// rejected.
    pub fn mcp_path(&self) -> Result<String> {
        let raw = self.path.as_deref().unwrap_or(DEFAULT_MCP_PATH);
        let invalid = |reason: &str| ConfigError::InvalidValue {
            field: "server.path".to_string(),
            reason: format!("'{}' {}", raw, reason),
        };

        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(invalid("must name an endpoint below '/'"));
        }
        let valid_segment = |segment: &str| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
        };
        if !trimmed.split('/').all(valid_segment) {
            return Err(invalid(
                "may only contain letters, digits, '-', '_', '.', '~' and '/'",
            ));
        }

        Ok(format!("/{}", trimmed))
    }
}

/// `[upstream]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamSection {
    /// Base URL of the data.gov.hk API.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl UpstreamSection {
    fn merge(&mut self, other: UpstreamSection) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// Resolved base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_UPSTREAM_BASE_URL)
    }

    /// Resolved request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT)
    }
}

/// `[client]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSection {
    /// MCP endpoint URL.
    pub server_url: Option<String>,
    /// Seconds to wait for a spawned server to report readiness.
    pub ready_timeout_secs: Option<u64>,
    /// Substring of a stderr line that marks the server as ready.
    pub ready_marker: Option<String>,
    /// Seconds between the terminate request and a force kill.
    pub shutdown_grace_secs: Option<u64>,
}

impl ClientSection {
    fn merge(&mut self, other: ClientSection) {
        if other.server_url.is_some() {
            self.server_url = other.server_url;
        }
        if other.ready_timeout_secs.is_some() {
            self.ready_timeout_secs = other.ready_timeout_secs;
        }
        if other.ready_marker.is_some() {
            self.ready_marker = other.ready_marker;
        }
        if other.shutdown_grace_secs.is_some() {
            self.shutdown_grace_secs = other.shutdown_grace_secs;
        }
    }

    /// Resolved server URL.
    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Resolved readiness timeout.
    pub fn ready_timeout(&self) -> Duration {
        self.ready_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_READY_TIMEOUT)
    }

    /// Resolved readiness marker.
    pub fn ready_marker(&self) -> &str {
        self.ready_marker.as_deref().unwrap_or(DEFAULT_READY_MARKER)
    }

    /// Resolved shutdown grace period.
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SHUTDOWN_GRACE)
    }
}
