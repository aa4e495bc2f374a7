mod abi;
mod chain;
mod cli;
mod commands;
mod config;
mod error;
mod lifecycle;
mod networks;
mod report;
mod rpc;
mod signer;
#[cfg(test)]
mod testing;
mod types;

use anyhow::Result;
use clap::Parser;

use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true) // show module path
        .with_thread_ids(true) // useful for async
        .with_line_number(true)
        .with_writer(std::io::stderr) // keep stdout for command output
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = cli::Cli::parse();
    let config = config::Config::load(cli.global.config_path.as_deref())?;
    tracing::debug!(path = %config.path.display(), "config loaded");
    cli.run(config).await
}
