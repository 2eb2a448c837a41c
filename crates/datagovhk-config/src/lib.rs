//! Configuration for the data.gov.hk MCP server and invocation client.
//!
//! Provides TOML-based configuration with:
//! - `[server]`: bind address and endpoint path of the MCP server
//! - `[upstream]`: base URL and timeout for data.gov.hk requests
//! - `[client]`: server URL and subprocess readiness settings for `datagovhk call`
//!
//! Every key is optional. Missing keys fall back to the defaults in [`types`].

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, load_config, load_config_file, load_config_with_options, xdg_config_dir,
    xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
