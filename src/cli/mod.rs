//! CLI for inspecting and exercising the SolvaPay MCP server.

use clap::{Args, Parser, Subcommand};

use crate::config::{resolve_config, PluginConfig, ProcessEnv, ResolvedConfig};
use crate::error::{BridgeError, Result};
use crate::mcp::{BridgeOptions, JsonObject, McpBridge};
use crate::plugin::{TOOL_LABEL, TOOL_PREFIX};

/// SolvaPay MCP CLI
#[derive(Parser, Debug)]
#[command(name = "solvapay-mcp", version, about = "SolvaPay MCP bridge CLI")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection overrides; unset values fall back to the environment.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// MCP endpoint (defaults to SOLVAPAY_MCP_ENDPOINT, then the hosted server)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// API key (defaults to SOLVAPAY_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tools the server exposes
    Tools,
    /// Invoke a tool and print its text result
    Call(CallArgs),
}

/// Arguments for `solvapay-mcp call`.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Tool name, with or without the `solvapay_` prefix
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(long, default_value = "{}")]
    pub args: String,
}

/// Resolve connection settings: flags, then environment, then default.
pub fn resolve(connection: &ConnectionArgs) -> Result<ResolvedConfig> {
    let flags = PluginConfig {
        api_key: connection.api_key.clone(),
        endpoint: connection.endpoint.clone(),
    };
    resolve_config(Some(&flags), &ProcessEnv)
}

/// Parse `--args` into an argument mapping.
pub fn parse_arguments(raw: &str) -> Result<JsonObject> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(JsonObject::new());
    }
    match serde_json::from_str(trimmed)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(BridgeError::Other(format!(
            "tool arguments must be a JSON object; got {other}"
        ))),
    }
}

/// Run a command against a freshly connected bridge, closing it afterwards.
pub async fn run(cli: Cli) -> Result<()> {
    let resolved = resolve(&cli.connection)?;
    let bridge = McpBridge::new(BridgeOptions {
        endpoint: resolved.endpoint,
        api_key: resolved.api_key,
    });

    bridge.connect().await?;
    let result = match cli.command {
        Commands::Tools => handle_tools(&bridge).await,
        Commands::Call(args) => handle_call(&bridge, &args).await,
    };
    bridge.close().await?;
    result
}

async fn handle_tools(bridge: &McpBridge) -> Result<()> {
    let tools = bridge.list_tools().await?;
    for tool in &tools {
        let description = tool
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{TOOL_LABEL}: {}", tool.name));
        println!("{TOOL_PREFIX}{}\t{description}", tool.name);
    }
    Ok(())
}

async fn handle_call(bridge: &McpBridge, args: &CallArgs) -> Result<()> {
    let name = args.tool.strip_prefix(TOOL_PREFIX).unwrap_or(&args.tool);
    let arguments = parse_arguments(&args.args)?;
    let text = bridge.call_tool(name, arguments).await?;
    println!("{text}");
    Ok(())
}
