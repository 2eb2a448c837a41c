//! One-shot tool invocation.
//!
//! Optionally spawns a local server, waits for it to come up, performs the
//! MCP handshake, calls a single tool and interprets its payload. Whatever
//! happens in between, a spawned server is always stopped before returning.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::client::McpClient;
use crate::error::{McpError, Result};
use crate::process::{ServerCommand, ServerProcess};
use crate::protocol::CallToolResult;
use crate::response::ToolResponse;
use crate::transport::HttpTransportConfig;

/// Payload used when the server returns no text content at all.
const EMPTY_PAYLOAD: &str = "{}";

/// How to start a local server for the invocation.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Program and arguments.
    pub command: ServerCommand,
    /// Case-insensitive substring of a stderr line that marks readiness.
    pub ready_marker: String,
    /// Upper bound on the readiness wait.
    pub ready_timeout: Duration,
    /// Time between the shutdown request and a forced kill.
    pub shutdown_grace: Duration,
}

impl SpawnConfig {
    /// Spawn settings with the standard marker and timings.
    pub fn new(command: ServerCommand) -> Self {
        Self {
            command,
            ready_marker: "listening".to_string(),
            ready_timeout: Duration::from_secs(20),
            shutdown_grace: Duration::from_secs(2),
        }
    }

    /// Set the readiness marker.
    pub fn with_ready_marker(mut self, marker: impl Into<String>) -> Self {
        self.ready_marker = marker.into();
        self
    }

    /// Set the readiness timeout.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Set the shutdown grace period.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

/// Everything needed for one invocation.
#[derive(Debug, Clone)]
pub struct InvocationConfig {
    /// MCP endpoint.
    pub transport: HttpTransportConfig,
    /// Local server to manage, if any.
    pub spawn: Option<SpawnConfig>,
}

impl InvocationConfig {
    /// Connect to an already running server at `url`.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            transport: HttpTransportConfig::new(url),
            spawn: None,
        }
    }

    /// Manage a local server for the duration of the call.
    pub fn with_spawn(mut self, spawn: SpawnConfig) -> Self {
        self.spawn = Some(spawn);
        self
    }
}

/// A tool name and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// Tool to call.
    pub tool: String,
    /// Arguments, always a JSON object.
    pub arguments: Map<String, Value>,
}

impl ToolRequest {
    /// Create a request.
    pub fn new(tool: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }
}

/// Steps of an invocation, logged as they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Init,
    Spawning,
    WaitingReady,
    Connected,
    Calling,
    Parsing,
    Done,
    Error,
    Finalizing,
}

fn enter(state: InvocationState) {
    tracing::debug!(state = ?state, "invocation state");
}

/// Run one tool invocation and return the tool's success payload.
///
/// Fails on spawn, connection, handshake or protocol errors, on malformed
/// tool output, and when the payload is an error envelope
/// ([`McpError::ToolError`] carrying the envelope's message).
pub async fn invoke(config: &InvocationConfig, request: &ToolRequest) -> Result<Value> {
    enter(InvocationState::Init);

    let mut process = match &config.spawn {
        Some(spawn) => {
            enter(InvocationState::Spawning);
            let mut process = ServerProcess::spawn(&spawn.command)?;

            enter(InvocationState::WaitingReady);
            process
                .wait_ready(&spawn.ready_marker, spawn.ready_timeout)
                .await;
            Some(process)
        }
        None => None,
    };

    let result = call_once(config, request).await;
    enter(if result.is_ok() {
        InvocationState::Done
    } else {
        InvocationState::Error
    });

    if let (Some(process), Some(spawn)) = (process.as_mut(), config.spawn.as_ref()) {
        enter(InvocationState::Finalizing);
        if let Err(e) = process.terminate(spawn.shutdown_grace).await {
            tracing::warn!(error = %e, "failed to stop MCP server");
        }
    }

    result
}

async fn call_once(config: &InvocationConfig, request: &ToolRequest) -> Result<Value> {
    let mut client = McpClient::connect(config.transport.clone())?;
    client.initialize().await?;
    enter(InvocationState::Connected);

    enter(InvocationState::Calling);
    tracing::info!(tool = %request.tool, "calling tool");
    let result = client
        .call_tool(&request.tool, Some(Value::Object(request.arguments.clone())))
        .await;
    client.shutdown().await;

    enter(InvocationState::Parsing);
    interpret(&result?)
}

/// Turn a tool result into its success payload.
///
/// Takes the first non-empty text item (`{}` when there is none), parses it
/// as JSON and rejects error envelopes.
pub fn interpret(result: &CallToolResult) -> Result<Value> {
    let text = result.first_text().unwrap_or(EMPTY_PAYLOAD);
    let payload: Value = serde_json::from_str(text)
        .map_err(|e| McpError::malformed_output(format!("{} in {:?}", e, text)))?;

    match ToolResponse::from_value(payload) {
        ToolResponse::Success(value) => Ok(value),
        ToolResponse::Error(message) => Err(McpError::ToolError(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Content;
    use serde_json::json;

    fn result_with(content: Vec<Content>) -> CallToolResult {
        CallToolResult {
            content,
            structured_content: None,
            is_error: None,
        }
    }

    #[test]
    fn test_interpret_success() {
        let result = result_with(vec![Content::text(r#"[{"id":"hk-dh"}]"#)]);
        assert_eq!(interpret(&result).unwrap(), json!([{"id": "hk-dh"}]));
    }

    #[test]
    fn test_interpret_no_text_defaults_to_empty_object() {
        let result = result_with(vec![Content::Other]);
        assert_eq!(interpret(&result).unwrap(), json!({}));
    }

    #[test]
    fn test_interpret_error_envelope() {
        let result = result_with(vec![Content::text(
            r#"{"error":"Failed to fetch providers data: boom"}"#,
        )]);
        let err = interpret(&result).unwrap_err();
        assert!(matches!(&err, McpError::ToolError(m) if m.contains("boom")));
    }

    #[test]
    fn test_interpret_malformed_text() {
        let result = result_with(vec![Content::text("<html>")]);
        let err = interpret(&result).unwrap_err();
        assert!(matches!(err, McpError::MalformedOutput(_)));
    }

    #[test]
    fn test_spawn_config_defaults() {
        let spawn = SpawnConfig::new(ServerCommand::new("datagovhk"));
        assert_eq!(spawn.ready_marker, "listening");
        assert_eq!(spawn.ready_timeout, Duration::from_secs(20));
        assert_eq!(spawn.shutdown_grace, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_invoke_spawn_failure() {
        let config = InvocationConfig::remote("http://127.0.0.1:1/mcp")
            .with_spawn(SpawnConfig::new(ServerCommand::new("nonexistent-command-xyz-12345")));
        let request = ToolRequest::new("get_providers", Map::new());

        let err = invoke(&config, &request).await.unwrap_err();
        assert!(matches!(err, McpError::SpawnFailed(_)));
    }
}
