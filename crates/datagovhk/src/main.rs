//! datagovhk - MCP server and client for the data.gov.hk open data portal
//!
//! Main entry point for the datagovhk CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod params;

use commands::{call, serve, tools};
use logging::LogConfig;

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// datagovhk - MCP tools for the data.gov.hk open data portal
#[derive(Parser)]
#[command(name = "datagovhk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (skips discovery)
    #[arg(long, global = true, env = "DATAGOVHK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server
    Serve(serve::ServeArgs),

    /// Call one tool on an MCP server and print its result
    Call(call::CallArgs),

    /// List the tools an MCP server exposes
    Tools(tools::ToolsArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        verbose: cli.verbose,
        json: cli.log_json,
    };
    if let Err(e) = logging::init_logging(&log_config) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loaded = datagovhk_config::load_config(cli.config.as_deref())?;
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }
    for path in loaded.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    let ctx = commands::Context {
        config: loaded.config,
        config_path: cli.config,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Call(args) => call::run(args, &ctx).await,
        Commands::Tools(args) => tools::run(args, &ctx).await,
    }
}
