//! The data.gov.hk tools.

mod categories;
mod crawl;
mod package;
mod providers;

use std::sync::Arc;
use std::time::Duration;

use datagovhk_mcp::ToolResponse;
use serde_json::{Value, json};

use crate::endpoints::Endpoints;
use crate::error::FetchError;
use crate::fetch::{FetchRequest, HttpFetcher, JsonFetcher};
use crate::tool::ToolRegistry;

pub use categories::{CategoriesTool, categories_request};
pub use crawl::{CrawlDatasetsTool, crawl_request};
pub use package::{PackageDataTool, package_request};
pub use providers::{ProvidersTool, providers_request};

/// What every tool needs to reach the upstream API.
#[derive(Clone)]
pub struct Upstream {
    fetcher: Arc<dyn JsonFetcher>,
    endpoints: Endpoints,
}

impl Upstream {
    /// Combine a fetcher with an endpoint table.
    pub fn new(fetcher: Arc<dyn JsonFetcher>, endpoints: Endpoints) -> Self {
        Self { fetcher, endpoints }
    }

    /// Real HTTP access to `base_url`.
    pub fn http(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self::new(
            Arc::new(HttpFetcher::new(timeout)?),
            Endpoints::new(base_url)?,
        ))
    }

    /// The endpoint table.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Run `request` and fold any failure into an error envelope labelled `label`.
    pub async fn fetch(&self, request: FetchRequest, label: &str) -> ToolResponse {
        match self.fetcher.fetch_json(&request).await {
            Ok(value) => ToolResponse::Success(value),
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "failed to fetch {} data", label);
                ToolResponse::error(e.envelope_message(label))
            }
        }
    }
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// Registry holding all four data.gov.hk tools.
pub fn default_registry(upstream: Upstream) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CrawlDatasetsTool::new(upstream.clone()));
    registry.register(ProvidersTool::new(upstream.clone()));
    registry.register(CategoriesTool::new(upstream.clone()));
    registry.register(PackageDataTool::new(upstream));
    registry
}

/// Schema fragment for the shared `language` argument.
fn language_schema() -> Value {
    json!({
        "type": "string",
        "description": "The language code (en, tc, sc) for the data (default is 'en').",
        "default": "en"
    })
}
