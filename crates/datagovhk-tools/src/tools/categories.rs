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
struct CategoriesParams {
    #[serde(default)]
    language: Option<String>,
}

/// Build the category list request.
pub fn categories_request(endpoints: &Endpoints, language: Language) -> FetchRequest {
    FetchRequest::json(endpoints.categories(language))
}

/// `get_categories`: the dataset category list.
#[derive(Debug, Clone)]
pub struct CategoriesTool {
    upstream: Upstream,
}

impl CategoriesTool {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl Tool for CategoriesTool {
    fn name(&self) -> &str {
        "get_categories"
    }

    fn description(&self) -> &str {
        "Fetch categories from data.gov.hk based on language (en, tc, sc)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"language": language_schema()}
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResponse> {
        let params: CategoriesParams = parse_params(self.name(), params)?;
        let language = Language::parse_lenient(params.language.as_deref().unwrap_or("en"));

        let request = categories_request(self.upstream.endpoints(), language);
        Ok(self.upstream.fetch(request, "categories").await)
    }
}
