//! Check command implementation
//!
//! Implements `swallower check` to validate the manifest without running it.

use anyhow::{bail, Result};

use super::{load_manifest, Context};
use crate::cli::output::{print_json, status};
use crate::core::check;
use crate::core::templates::TemplateRegistry;

/// Execute the check command
pub fn execute(context: &Context) -> Result<()> {
    let manifest = load_manifest(context)?;
    let result = check::check(&manifest, &TemplateRegistry::with_builtins());

    if context.json {
        print_json(&result)?;
    } else if !context.quiet {
        println!("Checking {}...\n", context.manifest_path.display());

        if result.is_valid() {
            println!("{} Manifest is valid", status::SUCCESS);
        } else {
            println!("{} Manifest has errors", status::ERROR);
            for error in &result.errors {
                println!("  - {error}");
            }
        }

        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &result.warnings {
                println!("  {} {warning}", status::WARNING);
            }
        }

        println!("\nPlugin order:");
        if result.plugin_order.is_empty() {
            println!("  (none)");
        }
        for (position, id) in result.plugin_order.iter().enumerate() {
            println!("  {}. {id}", position + 1);
        }

        println!(
            "\n{} {} tasks, {} task sets",
            status::INFO,
            result.tasks.len(),
            result.task_sets.len()
        );
    }

    if !result.is_valid() {
        bail!("Check failed with {} error(s)", result.errors.len());
    }
    Ok(())
}
