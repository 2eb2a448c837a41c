//! Tools command - lists the tools a server exposes.

use anyhow::Result;
use clap::Args;
use datagovhk_mcp::{HttpTransportConfig, McpClient};

use super::Context;

/// Arguments for the tools command.
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// MCP endpoint URL (default: http://127.0.0.1:8000/mcp/)
    #[arg(long, env = "DATAGOVHK_SERVER_URL")]
    pub server_url: Option<String>,

    /// Print the tool descriptors as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the tools command.
pub async fn run(args: ToolsArgs, ctx: &Context) -> Result<()> {
    let server_url = args
        .server_url
        .unwrap_or_else(|| ctx.config.client.server_url().to_string());

    let mut client = McpClient::connect(HttpTransportConfig::new(&server_url))?;
    let (name, version) = {
        let info = client.initialize().await?;
        (info.name.clone(), info.version.clone())
    };
    let tools = client.list_tools().await;
    client.shutdown().await;
    let tools = tools?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("{} v{} at {}", name, version, server_url);
    println!();
    for tool in &tools {
        println!("  • {}", tool.name);
        if ctx.verbose
            && let Some(description) = &tool.description
        {
            println!("      {}", description);
        }
    }
    Ok(())
}
