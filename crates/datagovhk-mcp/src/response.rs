//! The payload shape every data.gov.hk tool returns.
//!
//! A tool either passes the upstream JSON through unchanged or returns an
//! object with a single `"error"` key. Peers tell the two apart by the
//! presence of that key, nothing else.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

/// Key whose presence marks a tool payload as an error envelope.
pub const ERROR_KEY: &str = "error";

/// Outcome of one tool execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    /// Upstream JSON, returned verbatim.
    Success(Value),
    /// Human-readable failure, serialized as `{"error": "<message>"}`.
    Error(String),
}

impl ToolResponse {
    /// Create an error envelope.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Classify an arbitrary payload.
    ///
    /// Any JSON object with an `"error"` key is an error; a non-string error
    /// value is rendered as JSON text.
    pub fn from_value(value: Value) -> Self {
        match value.get(ERROR_KEY) {
            Some(Value::String(message)) => Self::Error(message.clone()),
            Some(other) => Self::Error(other.to_string()),
            None => Self::Success(value),
        }
    }

    /// Check if this is an error envelope.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Convert into the wire payload.
    pub fn into_value(self) -> Value {
        match self {
            Self::Success(value) => value,
            Self::Error(message) => json!({ ERROR_KEY: message }),
        }
    }

    /// Render the wire payload as JSON text.
    pub fn to_json_string(&self) -> String {
        self.clone().into_value().to_string()
    }
}

impl Serialize for ToolResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(value) => value.serialize(serializer),
            Self::Error(message) => json!({ ERROR_KEY: message }).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ToolResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}
