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
struct ProvidersParams {
    #[serde(default)]
    language: Option<String>,
}

/// Build the provider list request.
pub fn providers_request(endpoints: &Endpoints, language: Language) -> FetchRequest {
    FetchRequest::json(endpoints.providers(language))
}

/// `get_providers`: the list of data providers.
#[derive(Debug, Clone)]
pub struct ProvidersTool {
    upstream: Upstream,
}

impl ProvidersTool {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl Tool for ProvidersTool {
    fn name(&self) -> &str {
        "get_providers"
    }

    fn description(&self) -> &str {
        "Fetch providers from data.gov.hk based on language (en, tc, sc)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"language": language_schema()}
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResponse> {
        let params: ProvidersParams = parse_params(self.name(), params)?;
        let language = Language::parse_lenient(params.language.as_deref().unwrap_or("en"));

        let request = providers_request(self.upstream.endpoints(), language);
        Ok(self.upstream.fetch(request, "providers").await)
    }
}
