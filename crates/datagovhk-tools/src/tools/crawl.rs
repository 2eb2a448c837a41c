use async_trait::async_trait;
use datagovhk_mcp::ToolResponse;
use serde::Deserialize;
use serde_json::{Value, json};

use super::Upstream;
use crate::endpoints::{DATASETS_PAGE_SIZE, Endpoints};
use crate::error::Result;
use crate::fetch::{FetchRequest, USER_AGENT};
use crate::tool::{Tool, parse_params};

#[derive(Debug, Deserialize)]
struct CrawlParams {
    category: String,
    #[serde(default)]
    page: Option<i64>,
}

/// Build the dataset search request. `page` is 1-based.
///
/// The header set mirrors what the data.gov.hk web front end sends; the
/// search API rejects requests that do not look like they came from it.
pub fn crawl_request(endpoints: &Endpoints, category: &str, page: u32) -> FetchRequest {
    let page = page.max(1);
    let offset = u64::from(page - 1) * u64::from(DATASETS_PAGE_SIZE);

    FetchRequest::bare(endpoints.datasets())
        .with_query("limit", DATASETS_PAGE_SIZE)
        .with_query("offset", offset)
        .with_query("category", category)
        .with_query("lang", "en")
        .with_header("Accept", "application/json, text/javascript, */*; q=0.01")
        .with_header(
            "Accept-Language",
            "en-US,en;q=0.9,zh-TW;q=0.8,zh-CN;q=0.7,zh;q=0.6,ru;q=0.5",
        )
        .with_header("Connection", "keep-alive")
        .with_header(
            "Referer",
            format!("https://data.gov.hk/en-datasets?page={}&category={}", page, category),
        )
        .with_header("Sec-Fetch-Dest", "empty")
        .with_header("Sec-Fetch-Mode", "cors")
        .with_header("Sec-Fetch-Site", "same-origin")
        .with_header("User-Agent", USER_AGENT)
        .with_header("X-Requested-With", "XMLHttpRequest")
        .with_header(
            "sec-ch-ua",
            r#""Not)A;Brand";v="8", "Chromium";v="138", "Microsoft Edge";v="138""#,
        )
        .with_header("sec-ch-ua-mobile", "?0")
        .with_header("sec-ch-ua-platform", r#""Windows""#)
}

/// `crawl_datasets`: one page of the dataset search for a category.
#[derive(Debug, Clone)]
pub struct CrawlDatasetsTool {
    upstream: Upstream,
}

impl CrawlDatasetsTool {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl Tool for CrawlDatasetsTool {
    fn name(&self) -> &str {
        "crawl_datasets"
    }

    fn description(&self) -> &str {
        "Crawl datasets from data.gov.hk based on category and page."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "description": "The category to filter datasets."
                },
                "page": {
                    "type": "integer",
                    "description": "The page number to retrieve (default is 1).",
                    "default": 1
                }
            },
            "required": ["category"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResponse> {
        let params: CrawlParams = parse_params(self.name(), params)?;
        let requested = params.page.unwrap_or(1);
        let page = u32::try_from(requested.max(1)).unwrap_or(u32::MAX);
        if i64::from(page) != requested {
            tracing::warn!(requested, page, "page out of range, clamped");
        }

        tracing::debug!(category = %params.category, page, "crawling datasets");
        let request = crawl_request(self.upstream.endpoints(), &params.category, page);
        Ok(self.upstream.fetch(request, "datasets").await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query<'a>(request: &'a FetchRequest, key: &str) -> Option<&'a str> {
        request
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_pagination_offsets() {
        let endpoints = Endpoints::default();
        for (page, offset) in [(1, "0"), (2, "12"), (3, "24"), (10, "108")] {
            let request = crawl_request(&endpoints, "finance", page);
            assert_eq!(query(&request, "limit"), Some("12"));
            assert_eq!(query(&request, "offset"), Some(offset));
        }
    }

    #[test]
    fn test_page_zero_is_first_page() {
        let request = crawl_request(&Endpoints::default(), "finance", 0);
        assert_eq!(query(&request, "offset"), Some("0"));
        assert_eq!(
            request.header("referer"),
            Some("https://data.gov.hk/en-datasets?page=1&category=finance")
        );
    }

    #[test]
    fn test_request_shape() {
        let request = crawl_request(&Endpoints::default(), "city-management", 2);
        assert_eq!(request.url, "https://data.gov.hk/api/v1/datasets");
        assert_eq!(query(&request, "category"), Some("city-management"));
        assert_eq!(query(&request, "lang"), Some("en"));
        assert_eq!(request.header("x-requested-with"), Some("XMLHttpRequest"));
        assert_eq!(request.header("sec-fetch-site"), Some("same-origin"));
        assert_eq!(
            request.header("referer"),
            Some("https://data.gov.hk/en-datasets?page=2&category=city-management")
        );
    }
}
