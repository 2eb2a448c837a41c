//! HTTP routes.

mod health;
mod mcp;

pub use health::{HealthResponse, health, health_routes};
pub use mcp::{delete_handler, mcp_routes, post_handler};
