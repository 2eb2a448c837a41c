//! data.gov.hk tools.
//!
//! Four read-only tools over the Hong Kong open data portal, each a single
//! HTTP GET whose JSON is passed through unchanged:
//!
//! | Tool | Upstream |
//! |---|---|
//! | `crawl_datasets` | `/api/v1/datasets` |
//! | `get_providers` | `/filestore/json/providers_{lang}.json` |
//! | `get_categories` | `/filestore/json/categories_{lang}.json` |
//! | `get_package_data` | `/{lang}-data/api/3/action/package_show` |
//!
//! Upstream failures never escape a tool: they become an error envelope
//! `{"error": "..."}` (see [`ToolResponse`]).

pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod language;
pub mod tool;
pub mod tools;

pub use datagovhk_mcp::ToolResponse;
pub use endpoints::Endpoints;
pub use error::{FetchError, Result, ToolError};
pub use fetch::{FetchRequest, HttpFetcher, JsonFetcher};
pub use language::Language;
pub use tool::{Tool, ToolRegistry};
pub use tools::{
    CategoriesTool, CrawlDatasetsTool, PackageDataTool, ProvidersTool, Upstream, default_registry,
};
