//! MCP (Model Context Protocol) plumbing for datagovhk.
//!
//! Protocol types shared by the server and the client, a streamable HTTP
//! client, and the one-shot invocation flow used by the CLI.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  invoke()                                                   │
//! │  - Optionally spawns a local server (ServerProcess)         │
//! │  - Waits for a readiness marker on its stderr               │
//! │  - Calls one tool, interprets the payload, stops the server │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpClient                                                  │
//! │  - initialize, tools/list, tools/call                       │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  HttpTransport                                              │
//! │  - JSON-RPC 2.0 over HTTP POST, JSON or SSE replies         │
//! │  - Mcp-Session-Id tracking                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use datagovhk_mcp::{InvocationConfig, ToolRequest, invoke};
//!
//! let config = InvocationConfig::remote("http://127.0.0.1:8000/mcp/");
//! let request = ToolRequest::new("get_providers", serde_json::Map::new());
//! let providers = invoke(&config, &request).await?;
//! ```
//!
//! # Protocol flow
//!
//! 1. Client sends `initialize`; the server answers with its capabilities
//!    and an `Mcp-Session-Id` header
//! 2. Client sends `notifications/initialized`
//! 3. Client calls `tools/list` or `tools/call`, echoing the session id

pub mod client;
pub mod error;
pub mod invocation;
pub mod process;
pub mod protocol;
pub mod response;
pub mod transport;

pub use client::McpClient;
pub use error::{McpError, Result};
pub use invocation::{InvocationConfig, SpawnConfig, ToolRequest, interpret, invoke};
pub use process::{ProcessState, ServerCommand, ServerProcess};
pub use protocol::{
    CallToolParams, CallToolResult, Content, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, RequestId, ServerCapabilities, ToolInfo, ToolsCapability,
};
pub use response::ToolResponse;
pub use transport::{HttpTransport, HttpTransportConfig};
