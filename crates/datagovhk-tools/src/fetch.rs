//! Outbound HTTP GET returning JSON.
//!
//! Tools build a [`FetchRequest`] and hand it to a [`JsonFetcher`]. The
//! production fetcher is [`HttpFetcher`]; tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// User agent sent with every upstream request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0";

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Request headers, in order.
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// A request with the default `Accept` and `User-Agent` headers.
    pub fn json(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
        }
    }

    /// A request with no headers at all.
    pub fn bare(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Capability to GET a URL and decode the body as JSON.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// Perform the request once. No retries.
    async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, FetchError>;
}

/// [`JsonFetcher`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        tracing::debug!(url = %request.url, query = ?request.query, "fetching upstream JSON");

        let mut req = self.client.get(&request.url).query(&request.query);
        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        let resp = req.send().await?.error_for_status()?;
        let status = resp.status();
        let body = resp.bytes().await?;

        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| FetchError::Decode(format!("invalid JSON from {}: {}", request.url, e)))?;

        tracing::debug!(url = %request.url, status = %status, bytes = body.len(), "upstream JSON received");
        Ok(value)
    }
}
