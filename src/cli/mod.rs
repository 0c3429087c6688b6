//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;

use commands::{Commands, Context};
use crate::core::global_config::GlobalConfig;
use crate::infra::dirs::SwallowerDirs;

/// Swallower - plugin-driven build task registry
///
/// Composes glob sets, tasks and task sets from a manifest and its plugins.
#[derive(Parser, Debug)]
#[command(name = "swallower")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the manifest (defaults to swallower.toml in the current directory)
    #[arg(short, long, global = true, env = "SWALLOWER_MANIFEST")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let Some(command) = self.command else {
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            return Ok(());
        };

        let config = GlobalConfig::load(&SwallowerDirs::new())
            .context("Failed to load global configuration")?;

        let manifest_path = match self.manifest {
            Some(path) => path,
            None => std::env::current_dir()?.join(config.manifest()),
        };

        let context = Context {
            manifest_path,
            json: self.json || config.json(),
            quiet: self.quiet,
            strict: config.strict(),
        };

        command.run(&context)
    }
}
