//! Main entry point for the spectra-data-downloader CLI

use clap::Parser;
use spectra_data_downloader::cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    // Check if JSON output is requested via environment variable
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spectra_data_downloader=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result: anyhow::Result<()> = match &cli.command {
        Commands::List(cmd) => cmd.execute(&cli).map_err(anyhow::Error::from),
        Commands::Info(cmd) => cmd.execute(&cli).map_err(anyhow::Error::from),
        Commands::Rvs(cmd) => cmd.execute(&cli).map_err(anyhow::Error::from),
        Commands::Download(cmd) => cmd.execute(&cli).map_err(anyhow::Error::from),
    };

    if let Err(e) = result {
        error!("Command failed: {e}");
        std::process::exit(1);
    }
}
