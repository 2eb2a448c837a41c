//! Call command - invokes one tool and prints its JSON result.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use clap::Args;
use datagovhk_mcp::{InvocationConfig, ServerCommand, SpawnConfig, ToolRequest, invoke};
use datagovhk_server::normalize_mcp_path;
use url::Url;

use super::Context;
use crate::params;

/// Arguments for the call command.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// MCP endpoint URL (default: http://127.0.0.1:8000/mcp/)
    #[arg(long, env = "DATAGOVHK_SERVER_URL")]
    pub server_url: Option<String>,

    /// Name of the tool to call
    #[arg(short, long)]
    pub tool: String,

    /// Tool arguments as inline JSON or a path to a JSON file (default: piped stdin)
    #[arg(short, long)]
    pub params: Option<String>,

    /// Start a local server for the duration of the call
    #[arg(long)]
    pub stdio: bool,

    /// Command line that starts the server (default: this executable with `serve`)
    #[arg(long, requires = "stdio")]
    pub server_command: Option<String>,

    /// Seconds to wait for a spawned server to report readiness
    #[arg(long, requires = "stdio")]
    pub ready_timeout: Option<u64>,
}

/// Run the call command.
pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let arguments = params::acquire(args.params.as_deref())?;
    let server_url = args
        .server_url
        .clone()
        .unwrap_or_else(|| ctx.config.client.server_url().to_string());

    let mut config = InvocationConfig::remote(server_url.clone());
    if args.stdio {
        let command = match args.server_command.as_deref() {
            Some(line) => ServerCommand::parse(line)
                .ok_or_else(|| anyhow!("--server-command must not be empty"))?,
            None => {
                let exe = std::env::current_exe()
                    .context("cannot locate the datagovhk executable")?;
                self_serve_command(&exe, &server_url, ctx.config_path.as_deref())?
            }
        };
        let ready_timeout = args
            .ready_timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| ctx.config.client.ready_timeout());

        tracing::debug!(command = %command, "server will be spawned");
        config = config.with_spawn(
            SpawnConfig::new(command)
                .with_ready_marker(ctx.config.client.ready_marker())
                .with_ready_timeout(ready_timeout)
                .with_shutdown_grace(ctx.config.client.shutdown_grace()),
        );
    }

    let request = ToolRequest::new(&args.tool, arguments);
    let payload = invoke(&config, &request)
        .await
        .with_context(|| format!("tool '{}' failed", args.tool))?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// `datagovhk serve` bound to the host, port and path of `server_url`.
///
/// Fails when the URL path is not one the server can serve, such as `/`.
fn self_serve_command(
    exe: &Path,
    server_url: &str,
    config_path: Option<&Path>,
) -> Result<ServerCommand> {
    let url = Url::parse(server_url).with_context(|| format!("invalid server URL '{}'", server_url))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("server URL '{}' has no host", server_url))?;
    let host = if host.eq_ignore_ascii_case("localhost") {
        "127.0.0.1"
    } else {
        host
    };
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow!("server URL '{}' has no port", server_url))?;
    let bind = format!("{}:{}", host, port);
    let path = normalize_mcp_path(url.path()).with_context(|| {
        format!(
            "server URL '{}' cannot be served by a spawned server; use a path such as /mcp/",
            server_url
        )
    })?;

    let mut command = ServerCommand::new(exe.to_string_lossy());
    if let Some(path) = config_path {
        command = command.with_arg("--config").with_arg(path.to_string_lossy());
    }
    Ok(command.with_args([
        "serve",
        "--bind",
        bind.as_str(),
        "--path",
        path.as_str(),
        "--shutdown-on-stdin-close",
    ]))
}
