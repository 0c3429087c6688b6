//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod check;
pub mod globs;
pub mod plan;
pub mod run;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use clap::Subcommand;

use crate::core::manifest::Manifest;
use crate::core::scheduler::StuckPlugins;
use crate::core::swallower::Swallower;
use crate::core::templates::TemplateRegistry;
use crate::error::SwallowerError;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// Manifest to load
    pub manifest_path: PathBuf,
    /// Print JSON instead of text
    pub json: bool,
    /// Suppress non-error output
    pub quiet: bool,
    /// Fail when plugins cannot be scheduled
    pub strict: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what would be registered with the build runtime, in order
    Plan,

    /// Validate the manifest without running anything
    Check,

    /// Show glob sets after plugins have run
    Globs {
        /// Only show this glob set
        id: Option<String>,
    },

    /// Materialize the build and run a task or task set
    Run {
        /// Task or task set to run
        #[arg(default_value = crate::config::defaults::DEFAULT_TARGET)]
        target: String,
    },
}

impl Commands {
    /// Execute the command
    pub fn run(self, context: &Context) -> Result<()> {
        match self {
            Self::Plan => plan::execute(context),
            Self::Check => check::execute(context),
            Self::Globs { id } => globs::execute(context, id.as_deref()),
            Self::Run { target } => run::execute(context, &target),
        }
    }
}

/// Load the manifest at `context.manifest_path`
pub fn load_manifest(context: &Context) -> Result<Manifest> {
    Manifest::load(&context.manifest_path)
        .with_context(|| format!("Failed to load {}", context.manifest_path.display()))
}

/// Load the manifest and register it with a fresh swallower
pub fn load_swallower(context: &Context) -> Result<Swallower> {
    let manifest = load_manifest(context)?;
    let templates = Rc::new(TemplateRegistry::with_builtins());

    let mut swallower = Swallower::new();
    manifest.apply(&mut swallower, &templates)?;

    tracing::info!(
        "Loaded {} tasks and {} plugins from {}",
        swallower.task_ids().len(),
        swallower.pending_plugins().len(),
        context.manifest_path.display()
    );
    Ok(swallower)
}

/// Fail on stuck plugins in strict mode, warn otherwise
pub fn enforce_strict(context: &Context, stuck: Option<&StuckPlugins>) -> Result<()> {
    let Some(stuck) = stuck else {
        return Ok(());
    };

    if context.strict {
        return Err(SwallowerError::Stuck(stuck.clone()).into());
    }
    if !context.quiet && !context.json {
        eprintln!("{} {stuck}", super::output::status::WARNING);
    }
    Ok(())
}
