//! CLI command handlers.

use std::path::PathBuf;

use datagovhk_config::DatagovhkConfig;

pub mod call;
pub mod serve;
pub mod tools;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration.
    pub config: DatagovhkConfig,
    /// Explicit `--config` path, forwarded to spawned servers.
    pub config_path: Option<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}
