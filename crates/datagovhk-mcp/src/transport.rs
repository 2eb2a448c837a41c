//! Streamable HTTP transport for MCP.
//!
//! Every message is an HTTP POST to a single endpoint. The server answers a
//! request either with a plain JSON body or with a `text/event-stream` body
//! whose events carry JSON-RPC messages; both shapes are accepted here.
//! Notifications are acknowledged with `202 Accepted` and no body.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};

use crate::error::{McpError, Result};
use crate::protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION_HEADER,
    SESSION_ID_HEADER,
};

/// Media types a streamable HTTP client must accept.
const ACCEPT_STREAMABLE: &str = "application/json, text/event-stream";

/// Configuration for HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Full URL of the MCP endpoint.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::from_secs(30),
            headers: Vec::new(),
        }
    }
}

impl HttpTransportConfig {
    /// Create a new HTTP transport config with the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// A streamable HTTP connection to one MCP endpoint.
///
/// Holds the session id handed out by the server on `initialize` and echoes
/// it on every later request.
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
    session_id: Option<String>,
    protocol_version: Option<String>,
}

impl HttpTransport {
    /// Create a new HTTP transport. No request is sent until the first message.
    pub fn connect(config: HttpTransportConfig) -> Result<Self> {
        let _parsed = url::Url::parse(&config.url)
            .map_err(|e| McpError::transport(format!("invalid URL '{}': {}", config.url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| McpError::transport(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            url = %config.url,
            timeout_secs = config.timeout.as_secs(),
            "created HTTP transport"
        );

        Ok(Self {
            client,
            config,
            session_id: None,
            protocol_version: None,
        })
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Session id assigned by the server, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Record the protocol version negotiated during `initialize`.
    pub fn set_protocol_version(&mut self, version: impl Into<String>) {
        self.protocol_version = Some(version.into());
    }

    fn post(&self, body: String) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_STREAMABLE)
            .body(body);

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }
        if let Some(session) = &self.session_id {
            req = req.header(SESSION_ID_HEADER, session);
        }
        if let Some(version) = &self.protocol_version {
            req = req.header(PROTOCOL_VERSION_HEADER, version);
        }
        req
    }

    fn remember_session(&mut self, headers: &HeaderMap) {
        if let Some(session) = headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            && self.session_id.as_deref() != Some(session)
        {
            tracing::debug!(session_id = %session, "MCP session established");
            self.session_id = Some(session.to_string());
        }
    }

    async fn send(&mut self, body: String) -> Result<reqwest::Response> {
        let resp = self
            .post(body)
            .send()
            .await
            .map_err(|e| McpError::transport(format!("HTTP request to {} failed: {}", self.config.url, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(McpError::transport(format!("HTTP error {}: {}", status, body)));
        }

        self.remember_session(resp.headers());
        Ok(resp)
    }

    /// Send a JSON-RPC request and wait for its response.
    pub async fn send_request(&mut self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        let json = serde_json::to_string(request)?;

        tracing::trace!(url = %self.config.url, json = %json, "sending MCP request");

        let resp = self.send(json).await?;

        let is_event_stream = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        let response = if is_event_stream {
            read_event_stream(resp, request).await?
        } else {
            let text = resp
                .text()
                .await
                .map_err(|e| McpError::transport(format!("failed to read response body: {}", e)))?;
            tracing::trace!(json = %text, "received MCP response");
            serde_json::from_str::<JsonRpcResponse>(&text)?
        };

        if response.id.as_ref() != Some(&request.id) {
            return Err(McpError::protocol(format!(
                "response id {:?} does not match request id {}",
                response.id, request.id
            )));
        }

        Ok(response)
    }

    /// Send a notification. The server is expected to acknowledge without a body.
    pub async fn send_notification(&mut self, notification: &JsonRpcNotification) -> Result<()> {
        let json = serde_json::to_string(notification)?;

        tracing::trace!(url = %self.config.url, json = %json, "sending MCP notification");

        self.send(json).await?;
        Ok(())
    }

    /// End the session on the server. Failures are logged and ignored.
    pub async fn close(&mut self) {
        let Some(session) = self.session_id.take() else {
            return;
        };

        let result = self
            .client
            .delete(&self.config.url)
            .header(SESSION_ID_HEADER, &session)
            .send()
            .await;

        match result {
            Ok(resp) => {
                tracing::debug!(session_id = %session, status = %resp.status(), "closed MCP session")
            }
            Err(e) => {
                tracing::debug!(session_id = %session, error = %e, "failed to close MCP session")
            }
        }
    }
}

/// Read SSE events until the response matching `request` arrives.
///
/// Server-initiated notifications and requests on the same stream are skipped.
async fn read_event_stream(
    resp: reqwest::Response,
    request: &JsonRpcRequest,
) -> Result<JsonRpcResponse> {
    let mut stream = resp.bytes_stream().eventsource();

    while let Some(event) = stream.next().await {
        let event = event.map_err(|e| McpError::transport(format!("event stream error: {}", e)))?;
        if event.data.is_empty() {
            continue;
        }

        tracing::trace!(event = %event.event, data = %event.data, "received MCP event");

        let value: serde_json::Value = match serde_json::from_str(&event.data) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(data = %event.data, error = %e, "skipping unparseable MCP event");
                continue;
            }
        };

        // Only responses carry a result or an error.
        if value.get("result").is_none() && value.get("error").is_none() {
            continue;
        }

        let response: JsonRpcResponse = serde_json::from_value(value)?;
        if response.id.as_ref() == Some(&request.id) {
            return Ok(response);
        }
    }

    Err(McpError::protocol(format!(
        "event stream ended without a response to request {}",
        request.id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_config() {
        let config = HttpTransportConfig::new("http://localhost:8000/mcp/")
            .with_timeout(Duration::from_secs(5))
            .with_header("X-Trace", "1");

        assert_eq!(config.url, "http://localhost:8000/mcp/");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.headers, vec![("X-Trace".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_http_transport_config_default() {
        let config = HttpTransportConfig::default();
        assert!(config.url.is_empty());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_http_transport_creation() {
        let transport =
            HttpTransport::connect(HttpTransportConfig::new("http://localhost:8000/mcp")).unwrap();
        assert_eq!(transport.url(), "http://localhost:8000/mcp");
        assert!(transport.session_id().is_none());
    }

    #[test]
    fn test_http_transport_invalid_url() {
        let result = HttpTransport::connect(HttpTransportConfig::new("not a valid url"));
        let err = result.err().unwrap();
        assert!(err.to_string().contains("invalid URL"));
    }
}
