use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use axview::cli::Cli;
use axview::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // chromiumoxide logs every CDP event it can't deserialize; keep those quiet
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cli.verbose { "debug" } else { "warn" };
        EnvFilter::new(format!(
            "{},chromiumoxide::conn=warn,chromiumoxide::handler=warn",
            level
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli.run().await
}
