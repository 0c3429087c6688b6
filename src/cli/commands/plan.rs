//! Plan command implementation
//!
//! Implements `swallower plan`: runs plugins and records what would be
//! registered with a build runtime, without executing any task.

use anyhow::Result;
use serde::Serialize;

use super::{enforce_strict, load_swallower, Context};
use crate::cli::output::{print_json, status};
use crate::core::scheduler::StuckPlugin;
use crate::runtime::plan::{PlanEntry, PlanKind, PlanRuntime};

#[derive(Serialize)]
struct PlanReport<'a> {
    plugins: &'a [String],
    stuck: &'a [StuckPlugin],
    entries: &'a [PlanEntry],
}

/// Execute the plan command
pub fn execute(context: &Context) -> Result<()> {
    let mut swallower = load_swallower(context)?;
    let mut plan = PlanRuntime::new();
    let summary = swallower.run(&mut plan)?;

    enforce_strict(context, summary.stuck.as_ref())?;

    if context.json {
        return print_json(&PlanReport {
            plugins: &summary.plugins_run,
            stuck: summary
                .stuck
                .as_ref()
                .map(|stuck| stuck.0.as_slice())
                .unwrap_or_default(),
            entries: plan.entries(),
        });
    }

    if context.quiet {
        return Ok(());
    }

    if summary.plugins_run.is_empty() {
        println!("Plugins: (none)");
    } else {
        println!("Plugins: {}", summary.plugins_run.join(" → "));
    }

    println!();
    for entry in plan.entries() {
        match &entry.kind {
            PlanKind::Task => println!("  task {}", entry.name),
            PlanKind::Set { mode, members } => {
                println!("  {mode} {} [{}]", entry.name, members.join(", "));
            }
        }
    }

    println!(
        "\n{} {} tasks, {} task sets",
        status::SUCCESS,
        summary.tasks_registered,
        summary.task_sets_registered
    );
    Ok(())
}
