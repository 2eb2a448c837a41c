//! Integration tests for the MCP client.
//!
//! A wiremock server stands in for the MCP endpoint so the full protocol
//! flow (handshake, session header, JSON and SSE replies) runs over real HTTP.

use datagovhk_mcp::{
    HttpTransportConfig, InvocationConfig, McpClient, McpError, ToolRequest, invoke,
};
use serde_json::{Map, Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION: &str = "session-123";

fn rpc_result(id: u64, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn text_result(text: &str) -> Value {
    json!({"content": [{"type": "text", "text": text}], "isError": false})
}

/// Mount `initialize` (id 1), the initialized notification and session teardown.
async fn mount_handshake(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/mcp/"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("mcp-session-id", SESSION)
                .set_body_json(rpc_result(
                    1,
                    json!({
                        "protocolVersion": "2025-03-26",
                        "capabilities": {"tools": {"listChanged": false}},
                        "serverInfo": {"name": "mock-datagovhk", "version": "9.9.9"}
                    }),
                )),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/mcp/"))
        .and(body_partial_json(json!({"method": "notifications/initialized"})))
        .and(header("mcp-session-id", SESSION))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/mcp/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn mount_tool_reply(server: &MockServer, reply: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/mcp/"))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .and(header("mcp-session-id", SESSION))
        .respond_with(reply)
        .expect(1)
        .mount(server)
        .await;
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/mcp/", server.uri())
}

fn request(tool: &str, arguments: Value) -> ToolRequest {
    let arguments = match arguments {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    ToolRequest::new(tool, arguments)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handshake
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_initialize_records_server_and_session() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    let mut client = McpClient::connect(HttpTransportConfig::new(endpoint(&server))).unwrap();
    let info = client.initialize().await.unwrap().clone();

    assert_eq!(info.name, "mock-datagovhk");
    assert_eq!(info.version, "9.9.9");
    assert!(client.is_initialized());
    assert_eq!(client.session_id(), Some(SESSION));
}

#[tokio::test]
async fn test_list_tools() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path("/mcp/"))
        .and(body_partial_json(json!({"method": "tools/list", "id": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(
            2,
            json!({"tools": [
                {"name": "get_providers", "description": "Providers", "inputSchema": {"type": "object"}},
                {"name": "get_categories", "inputSchema": {"type": "object"}}
            ]}),
        )))
        .mount(&server)
        .await;

    let mut client = McpClient::connect(HttpTransportConfig::new(endpoint(&server))).unwrap();
    client.initialize().await.unwrap();
    let tools = client.list_tools().await.unwrap();

    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["get_providers", "get_categories"]);
    assert_eq!(tools[0].description.as_deref(), Some("Providers"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_invoke_returns_payload_from_json_reply() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_tool_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(rpc_result(
            2,
            text_result(r#"[{"name":"Hospital Authority"}]"#),
        )),
    )
    .await;

    let config = InvocationConfig::remote(endpoint(&server));
    let data = invoke(&config, &request("get_providers", json!({"language": "en"})))
        .await
        .unwrap();

    assert_eq!(data, json!([{"name": "Hospital Authority"}]));
}

#[tokio::test]
async fn test_invoke_reads_event_stream_reply() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    let progress = json!({"jsonrpc": "2.0", "method": "notifications/progress", "params": {}});
    let response = rpc_result(2, text_result(r#"{"count":3}"#));
    let body = format!(
        "event: message\ndata: {}\n\nevent: message\ndata: {}\n\n",
        progress, response
    );
    mount_tool_reply(
        &server,
        ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
    )
    .await;

    let config = InvocationConfig::remote(endpoint(&server));
    let data = invoke(&config, &request("get_categories", json!({})))
        .await
        .unwrap();

    assert_eq!(data, json!({"count": 3}));
}

#[tokio::test]
async fn test_invoke_error_envelope_is_tool_error() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_tool_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(rpc_result(
            2,
            json!({
                "content": [{"type": "text", "text": r#"{"error":"Failed to fetch providers data: boom"}"#}],
                "isError": true
            }),
        )),
    )
    .await;

    let config = InvocationConfig::remote(endpoint(&server));
    let err = invoke(&config, &request("get_providers", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(&err, McpError::ToolError(m) if m.contains("boom")), "{err}");
}

#[tokio::test]
async fn test_invoke_jsonrpc_error_is_server_error() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_tool_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": {"code": -32602, "message": "Unknown tool: nope"}
        })),
    )
    .await;

    let config = InvocationConfig::remote(endpoint(&server));
    let err = invoke(&config, &request("nope", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, McpError::ServerError { code: -32602, .. }));
}

#[tokio::test]
async fn test_invoke_http_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("exploded"))
        .mount(&server)
        .await;

    let config = InvocationConfig::remote(endpoint(&server));
    let err = invoke(&config, &request("get_providers", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(&err, McpError::Transport(m) if m.contains("500")));
}

#[tokio::test]
async fn test_invoke_connection_refused() {
    // Port 1 is reserved and never has a listener in test environments.
    let config = InvocationConfig::remote("http://127.0.0.1:1/mcp/");
    let err = invoke(&config, &request("get_providers", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, McpError::Transport(_)));
}

#[tokio::test]
async fn test_invoke_mismatched_response_id() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_tool_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(rpc_result(99, text_result("{}"))),
    )
    .await;

    let config = InvocationConfig::remote(endpoint(&server));
    let err = invoke(&config, &request("get_providers", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, McpError::Protocol(_)));
}
