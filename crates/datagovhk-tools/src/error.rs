//! Error types for tools and the upstream fetch capability.

use thiserror::Error;

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Failure to obtain JSON from the upstream API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be completed: network failure, timeout or a
    /// non-2xx status.
    #[error("{0}")]
    Transport(String),

    /// The response arrived but its body is not JSON.
    #[error("{0}")]
    Decode(String),

    /// The HTTP client could not be built or the URL is unusable.
    #[error("{0}")]
    Client(String),
}

impl FetchError {
    /// Message for the tool's error envelope.
    ///
    /// Transport failures name the data that could not be fetched; anything
    /// else is reported as unexpected.
    pub fn envelope_message(&self, label: &str) -> String {
        match self {
            Self::Transport(cause) => format!("Failed to fetch {} data: {}", label, cause),
            Self::Decode(cause) | Self::Client(cause) => {
                format!("An unexpected error occurred: {}", cause)
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::Client(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Failure to run a tool at all. Upstream problems never surface here; they
/// become error envelopes instead.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name is registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments do not match the tool's schema.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidParams {
        /// Tool name.
        tool: String,
        /// What was wrong.
        reason: String,
    },
}

impl ToolError {
    /// Create an invalid params error.
    pub fn invalid_params(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}
