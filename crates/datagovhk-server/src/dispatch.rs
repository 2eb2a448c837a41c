//! JSON-RPC method dispatch, shared by the HTTP and stdio transports.

use datagovhk_mcp::protocol::{
    JSONRPC_VERSION, MCP_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
use datagovhk_mcp::{
    CallToolParams, CallToolResult, Content, Implementation, InitializeResult, JsonRpcError,
    JsonRpcMessage, JsonRpcResponse, ListToolsResult, RequestId, ServerCapabilities, ToolResponse,
    ToolsCapability,
};
use datagovhk_tools::{ToolError, ToolRegistry};
use serde_json::{Value, json};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "datagovhk";

const INSTRUCTIONS: &str = "Tools for the Hong Kong government open data portal (data.gov.hk). \
     Use get_categories or get_providers to discover datasets, crawl_datasets to page \
     through a category, and get_package_data for one dataset's metadata.";

/// Parse one raw JSON-RPC message.
///
/// On failure returns the error response to send back.
pub fn parse_message(raw: &[u8]) -> Result<JsonRpcMessage, Box<JsonRpcResponse>> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| {
        Box::new(JsonRpcResponse::failure(
            None,
            JsonRpcError::parse_error(format!("Parse error: {}", e)),
        ))
    })?;

    // A present-but-null id is neither a request nor a notification.
    if value.get("id").is_some_and(Value::is_null) {
        return Err(Box::new(JsonRpcResponse::failure(
            None,
            JsonRpcError::invalid_request("Invalid request: id must not be null"),
        )));
    }

    // Recover the id, if any, so the error can be correlated.
    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    let message: JsonRpcMessage = serde_json::from_value(value).map_err(|e| {
        Box::new(JsonRpcResponse::failure(
            id.clone(),
            JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
        ))
    })?;

    if message.jsonrpc != JSONRPC_VERSION {
        return Err(Box::new(JsonRpcResponse::failure(
            id,
            JsonRpcError::invalid_request(format!(
                "Unsupported jsonrpc version '{}'",
                message.jsonrpc
            )),
        )));
    }

    Ok(message)
}

/// Routes MCP methods to the tool registry.
#[derive(Debug)]
pub struct Dispatcher {
    tools: ToolRegistry,
}

impl Dispatcher {
    /// Create a dispatcher over `tools`.
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    /// The tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one message. Notifications yield `None`.
    pub async fn handle(&self, message: JsonRpcMessage) -> Option<JsonRpcResponse> {
        let Some(id) = message.id else {
            tracing::debug!(method = %message.method, "received notification");
            return None;
        };

        tracing::debug!(method = %message.method, id = %id, "received request");

        let result = match message.method.as_str() {
            "initialize" => self.initialize(message.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(message.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => {
                tracing::warn!(
                    method = %message.method,
                    code = error.code,
                    error = %error.message,
                    "request failed"
                );
                JsonRpcResponse::failure(Some(id), error)
            }
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let requested = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);

        let protocol_version = match requested {
            Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v) => v.to_string(),
            Some(v) => {
                tracing::debug!(requested = %v, "unsupported protocol version, offering latest");
                SUPPORTED_PROTOCOL_VERSIONS
                    .first()
                    .copied()
                    .unwrap_or(MCP_PROTOCOL_VERSION)
                    .to_string()
            }
            None => MCP_PROTOCOL_VERSION.to_string(),
        };

        if let Some(client) = params
            .as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| serde_json::from_value::<Implementation>(c.clone()).ok())
        {
            tracing::info!(client = %client.name, version = %client.version, protocol = %protocol_version, "client initialized");
        }

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal(e.to_string()))
    }

    fn list_tools(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult {
            tools: self.tools.infos(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal(e.to_string()))
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params for tools/call"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
            })?;

        tracing::info!(tool = %params.name, "tool call");

        let response = self
            .tools
            .call(&params.name, params.arguments.unwrap_or(Value::Null))
            .await
            .map_err(|e| match e {
                ToolError::UnknownTool(_) | ToolError::InvalidParams { .. } => {
                    JsonRpcError::invalid_params(e.to_string())
                }
            })?;

        serde_json::to_value(tool_result(response))
            .map_err(|e| JsonRpcError::internal(e.to_string()))
    }
}

/// Wrap a tool payload as MCP content.
///
/// The payload is always sent as one text item; objects are also attached
/// as structured content.
pub fn tool_result(response: ToolResponse) -> CallToolResult {
    let is_error = response.is_error();
    let value = response.into_value();
    let text = value.to_string();

    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: value.is_object().then_some(value),
        is_error: Some(is_error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use datagovhk_tools::Tool;

    struct FixedTool(ToolResponse);

    #[async_trait]
    impl Tool for FixedTool {
        fn name(&self) -> &str {
            "fixed"
        }

        fn description(&self) -> &str {
            "Returns a fixed payload"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _params: Value) -> datagovhk_tools::Result<ToolResponse> {
            Ok(self.0.clone())
        }
    }

    fn dispatcher(response: ToolResponse) -> Dispatcher {
        let mut tools = ToolRegistry::new();
        tools.register(FixedTool(response));
        Dispatcher::new(tools)
    }

    fn request(id: u64, method: &str, params: Value) -> JsonRpcMessage {
        parse_message(
            json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
                .to_string()
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_error() {
        let err = parse_message(b"{not json").unwrap_err();
        assert!(err.id.is_none());
        assert_eq!(err.error.unwrap().code, JsonRpcError::PARSE_ERROR);
    }

    #[test]
    fn test_invalid_request_keeps_id() {
        let err = parse_message(br#"{"jsonrpc":"2.0","id":7}"#).unwrap_err();
        assert_eq!(err.id, Some(RequestId::Number(7)));
        assert_eq!(err.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_null_id_is_invalid_request() {
        let err = parse_message(br#"{"jsonrpc":"2.0","id":null,"method":"initialize"}"#)
            .unwrap_err();
        assert!(err.id.is_none());
        assert_eq!(err.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_wrong_jsonrpc_version() {
        let err = parse_message(br#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_initialize_echoes_supported_version() {
        let d = dispatcher(ToolResponse::Success(json!({})));
        let resp = d
            .handle(request(1, "initialize", json!({"protocolVersion": "2024-11-05"})))
            .await
            .unwrap();

        let result: InitializeResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.protocol_version, "2024-11-05");
        assert_eq!(result.server_info.name, SERVER_NAME);
        assert!(result.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_initialize_unknown_version_offers_latest() {
        let d = dispatcher(ToolResponse::Success(json!({})));
        let resp = d
            .handle(request(1, "initialize", json!({"protocolVersion": "1999-01-01"})))
            .await
            .unwrap();
        assert_eq!(resp.result.unwrap()["protocolVersion"], SUPPORTED_PROTOCOL_VERSIONS[0]);
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let d = dispatcher(ToolResponse::Success(json!({})));
        let msg =
            parse_message(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(d.handle(msg).await.is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let d = dispatcher(ToolResponse::Success(json!({})));
        let resp = d.handle(request(3, "ping", Value::Null)).await.unwrap();
        assert_eq!(resp.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let d = dispatcher(ToolResponse::Success(json!({})));
        let resp = d.handle(request(4, "resources/list", json!({}))).await.unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let d = dispatcher(ToolResponse::Success(json!({})));
        let resp = d.handle(request(2, "tools/list", json!({}))).await.unwrap();
        let result: ListToolsResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].name, "fixed");
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let d = dispatcher(ToolResponse::Success(json!({"categories": ["A"]})));
        let resp = d
            .handle(request(2, "tools/call", json!({"name": "fixed", "arguments": {}})))
            .await
            .unwrap();

        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(!result.is_error());
        assert_eq!(result.first_text(), Some(r#"{"categories":["A"]}"#));
        assert_eq!(result.structured_content, Some(json!({"categories": ["A"]})));
    }

    #[tokio::test]
    async fn test_tools_call_error_envelope() {
        let d = dispatcher(ToolResponse::error("Failed to fetch providers data: boom"));
        let resp = d
            .handle(request(2, "tools/call", json!({"name": "fixed"})))
            .await
            .unwrap();

        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.is_error());
        assert_eq!(
            result.first_text(),
            Some(r#"{"error":"Failed to fetch providers data: boom"}"#)
        );
    }

    #[tokio::test]
    async fn test_tools_call_array_has_no_structured_content() {
        let d = dispatcher(ToolResponse::Success(json!([1, 2])));
        let resp = d
            .handle(request(2, "tools/call", json!({"name": "fixed"})))
            .await
            .unwrap();
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.structured_content.is_none());
        assert_eq!(result.first_text(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let d = dispatcher(ToolResponse::Success(json!({})));
        let resp = d
            .handle(request(2, "tools/call", json!({"name": "nope"})))
            .await
            .unwrap();
        let error = resp.error.unwrap();
        assert_eq!(error.code, JsonRpcError::INVALID_PARAMS);
        assert!(error.message.contains("nope"));
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let d = dispatcher(ToolResponse::Success(json!({})));
        let msg = parse_message(br#"{"jsonrpc":"2.0","id":5,"method":"tools/call"}"#).unwrap();
        let resp = d.handle(msg).await.unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }
}
