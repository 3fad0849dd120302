//! SolvaPay MCP CLI binary entry point.

use clap::Parser;
use solvapay_mcp::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = solvapay_mcp::cli::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
