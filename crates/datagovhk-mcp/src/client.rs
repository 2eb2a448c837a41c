//! MCP client for communicating with an MCP server over streamable HTTP.

use serde_json::Value;

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcNotification, JsonRpcRequest, ListToolsResult, ToolInfo,
};
use crate::transport::{HttpTransport, HttpTransportConfig};

/// An MCP client connected to a single MCP server.
///
/// Requests are issued one at a time; ids start at 1 and increase by one.
pub struct McpClient {
    transport: HttpTransport,
    server_info: Option<Implementation>,
    next_id: u64,
    initialized: bool,
}

impl McpClient {
    /// Create a client for the endpoint in `config`.
    ///
    /// This does NOT initialize the connection - call `initialize()` after connecting.
    pub fn connect(config: HttpTransportConfig) -> Result<Self> {
        let transport = HttpTransport::connect(config)?;

        tracing::debug!(url = %transport.url(), "connecting to MCP server via HTTP");

        Ok(Self {
            transport,
            server_info: None,
            next_id: 1,
            initialized: false,
        })
    }

    /// Get the server info (after initialization).
    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    /// Check if the client has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Session id assigned by the server, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.transport.session_id()
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    async fn send_request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let request = JsonRpcRequest::new(self.next_request_id(), method, params);
        let response = self.transport.send_request(&request).await?;

        response
            .into_result()
            .map_err(|e| McpError::server_error(e.code, e.message, e.data))
    }

    async fn send_notification(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = JsonRpcNotification::new(method, params);
        self.transport.send_notification(&notification).await
    }

    /// Perform the MCP handshake.
    ///
    /// Sends `initialize`, records the session id and negotiated protocol
    /// version, then sends `notifications/initialized`.
    pub async fn initialize(&mut self) -> Result<&Implementation> {
        if !self.initialized {
            let params = InitializeParams::default();
            let result = self
                .send_request("initialize", Some(serde_json::to_value(&params)?))
                .await?;

            let init_result: InitializeResult = serde_json::from_value(result)?;

            tracing::info!(
                server = %init_result.server_info.name,
                version = %init_result.server_info.version,
                protocol = %init_result.protocol_version,
                "MCP server initialized"
            );

            self.transport
                .set_protocol_version(init_result.protocol_version.clone());
            self.send_notification("notifications/initialized", None)
                .await?;

            self.server_info = Some(init_result.server_info);
            self.initialized = true;
        }

        self.server_info.as_ref().ok_or(McpError::NotInitialized)
    }

    /// List available tools from the server.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>> {
        if !self.initialized {
            return Err(McpError::NotInitialized);
        }

        let result = self.send_request("tools/list", None).await?;
        let list_result: ListToolsResult = serde_json::from_value(result)?;

        tracing::debug!(tool_count = list_result.tools.len(), "listed MCP tools");

        Ok(list_result.tools)
    }

    /// Call a tool on the server.
    pub async fn call_tool(&mut self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        if !self.initialized {
            return Err(McpError::NotInitialized);
        }

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let result = self
            .send_request("tools/call", Some(serde_json::to_value(&params)?))
            .await?;
        let call_result: CallToolResult = serde_json::from_value(result)?;

        if call_result.is_error() {
            tracing::warn!(tool = %name, "tool call returned error");
        } else {
            tracing::debug!(tool = %name, "tool call succeeded");
        }

        Ok(call_result)
    }

    /// End the session. The connection is unusable afterwards.
    pub async fn shutdown(&mut self) {
        tracing::debug!("shutting down MCP client");
        self.transport.close().await;
        self.initialized = false;
    }
}
