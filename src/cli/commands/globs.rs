//! Globs command implementation
//!
//! Implements `swallower globs [ID]`: runs plugins and prints the resulting
//! glob sets.

use anyhow::{bail, Result};
use serde::Serialize;

use super::{enforce_strict, load_swallower, Context};
use crate::cli::output::print_json;

#[derive(Serialize)]
struct GlobSetReport<'a> {
    id: &'a str,
    patterns: &'a [String],
}

/// Execute the globs command
pub fn execute(context: &Context, id: Option<&str>) -> Result<()> {
    let mut swallower = load_swallower(context)?;
    let outcome = swallower.run_plugins()?;
    enforce_strict(context, (!outcome.stuck.is_empty()).then_some(&outcome.stuck))?;

    let mut sets = swallower.glob_sets();
    if let Some(id) = id {
        sets.retain(|(name, _)| name == id);
        if sets.is_empty() {
            bail!("Glob set '{id}' is not defined");
        }
    }

    if context.json {
        let report: Vec<GlobSetReport<'_>> = sets
            .iter()
            .map(|(id, patterns)| GlobSetReport { id, patterns })
            .collect();
        return print_json(&report);
    }

    if context.quiet {
        return Ok(());
    }

    for (id, patterns) in &sets {
        println!("{id}:");
        for pattern in patterns {
            println!("  {pattern}");
        }
    }
    Ok(())
}
