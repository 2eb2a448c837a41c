use async_trait::async_trait;
use datagovhk_mcp::ToolResponse;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Upstream, language_schema};
use crate::endpoints::Endpoints;
use crate::error::Result;
use crate::fetch::FetchRequest;
use crate::language::Language;
use crate::tool::{Tool, parse_params};

#[derive(Debug, Deserialize)]
struct PackageParams {
    package_id: String,
    #[serde(default)]
    language: Option<String>,
}

/// Build the `package_show` request for one package.
pub fn package_request(endpoints: &Endpoints, package_id: &str, language: Language) -> FetchRequest {
    FetchRequest::json(endpoints.package_show(language)).with_query("id", package_id)
}

/// `get_package_data`: CKAN metadata for one dataset package.
#[derive(Debug, Clone)]
pub struct PackageDataTool {
    upstream: Upstream,
}

impl PackageDataTool {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl Tool for PackageDataTool {
    fn name(&self) -> &str {
        "get_package_data"
    }

    fn description(&self) -> &str {
        "Fetch package data from data.gov.hk API using the provided ID and language, \
         typically obtained from the crawler tool."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "package_id": {
                    "type": "string",
                    "description": "The unique identifier of the package to retrieve."
                },
                "language": language_schema()
            },
            "required": ["package_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResponse> {
        let params: PackageParams = parse_params(self.name(), params)?;
        let language = Language::parse_lenient(params.language.as_deref().unwrap_or("en"));

        tracing::debug!(package_id = %params.package_id, language = %language, "fetching package data");
        let request = package_request(self.upstream.endpoints(), &params.package_id, language);
        Ok(self.upstream.fetch(request, "package").await)
    }
}
