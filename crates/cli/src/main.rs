//! feedstash command-line entry point.
//!
//! Wires configuration, the selected cache store, and the HTTP transport
//! into the local and remote loaders. Feed output goes to stdout as JSON;
//! logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "feedstash", version, about = "Fetch an image feed and keep a local cache of it")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "FEEDSTASH_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Fetch the remote feed and replace the cached copy with it
    Refresh,
    /// Print the cached feed if it is still fresh
    Cached,
    /// Evict the cached feed if it is stale or unreadable
    Validate,
    /// Fetch and print the remote feed without touching the cache
    Remote,
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = feedstash_core::AppConfig::load()?;
    tracing::info!(command = ?cli.cmd, store = ?config.store, "starting feedstash");

    commands::run(cli.cmd, &config).await
}
