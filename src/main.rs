//! scout-rs binary entry point.

use anyhow::Result;
use clap::Parser;

use scout_rs::cli::{Cli, commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; missing files are fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        "scout_rs=debug"
    } else {
        "scout_rs=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = commands::execute(&cli).await?;
    println!("{output}");
    Ok(())
}
