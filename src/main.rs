//! hserv - Supabase stack configuration tool
//!
//! Command-line entry point: loads settings, applies flags and runs the
//! selected command.

use clap::Parser;
use hserv::cli::Cli;
use hserv::config::{load_settings, Settings};
use hserv::error::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    let mut settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    cli.apply_to(&mut settings);

    // Initialize logging
    init_logging(settings.debug);

    // Execute the command
    if let Err(e) = run(cli, settings) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, settings: Settings) -> Result<()> {
    info!("Starting hserv for project '{}'", settings.project);
    cli.execute(settings)
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "hserv=debug" } else { "hserv=warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
