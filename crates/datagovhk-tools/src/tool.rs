//! Tool trait and registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use datagovhk_mcp::{ToolInfo, ToolResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, ToolError};

/// A callable tool exposed over MCP.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the unique name of this tool.
    fn name(&self) -> &str;

    /// Get a human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for this tool's parameters.
    fn parameters(&self) -> Value;

    /// Execute the tool.
    ///
    /// Returns `Err` only for arguments that do not fit the schema. Upstream
    /// failures are reported as [`ToolResponse::Error`].
    async fn execute(&self, params: Value) -> Result<ToolResponse>;

    /// Descriptor advertised by `tools/list`.
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            input_schema: self.parameters(),
        }
    }
}

/// Decode tool arguments; a missing argument object counts as empty.
pub fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| ToolError::invalid_params(tool, e.to_string()))
}

/// Registry of available tools, ordered by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors of every tool.
    pub fn infos(&self) -> Vec<ToolInfo> {
        self.tools.values().map(|t| t.info()).collect()
    }

    /// Run a tool by name.
    pub async fn call(&self, name: &str, params: Value) -> Result<ToolResponse> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        tracing::debug!(tool = %name, "executing tool");
        let response = tool.execute(params).await?;
        if let ToolResponse::Error(message) = &response {
            tracing::warn!(tool = %name, error = %message, "tool reported an error");
        }
        Ok(response)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    struct EchoTool;

    #[derive(Deserialize)]
    struct EchoParams {
        message: String,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the message back"
        }

        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"message": {"type": "string"}},
                "required": ["message"]
            })
        }

        async fn execute(&self, params: Value) -> Result<ToolResponse> {
            let params: EchoParams = parse_params(self.name(), params)?;
            Ok(ToolResponse::Success(json!({"echo": params.message})))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(EchoTool);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
        assert_eq!(registry.names(), vec!["echo"]);

        let info = &registry.infos()[0];
        assert_eq!(info.name, "echo");
        assert_eq!(info.description.as_deref(), Some("Echo the message back"));
        assert_eq!(info.input_schema["required"], json!(["message"]));
    }

    #[tokio::test]
    async fn test_call_success() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let response = registry.call("echo", json!({"message": "hi"})).await.unwrap();
        assert_eq!(response, ToolResponse::Success(json!({"echo": "hi"})));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.call("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_call_invalid_params() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let err = registry.call("echo", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams { .. }));
    }
}
