//! Swallower CLI
//!
//! Entry point for the swallower command-line application.

use anyhow::Result;
use clap::Parser;

use swallower::cli::output::{display_error, OutputConfig};
use swallower::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_config = OutputConfig::new(cli.quiet, cli.json, cli.verbose);

    // RUST_LOG takes precedence over -v/-q
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(output_config.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.run() {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
