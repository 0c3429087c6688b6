//! Run command implementation
//!
//! Implements `swallower run [TARGET]`: materializes the build into the
//! in-process runtime and runs one task or task set.

use anyhow::{bail, Result};

use super::{enforce_strict, load_swallower, Context};
use crate::cli::output::status;
use crate::runtime::local::LocalRuntime;

/// Execute the run command
pub fn execute(context: &Context, target: &str) -> Result<()> {
    let mut swallower = load_swallower(context)?;
    let mut runtime = LocalRuntime::new();
    let summary = swallower.run(&mut runtime)?;

    enforce_strict(context, summary.stuck.as_ref())?;

    if !runtime.contains(target) {
        bail!(
            "Unknown target '{target}' (available: {})",
            runtime.names().join(", ")
        );
    }

    runtime.run(target)?;

    if !context.quiet && !context.json {
        println!("{} Finished '{target}'", status::SUCCESS);
    }
    Ok(())
}
