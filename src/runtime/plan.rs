//! Recording runtime
//!
//! Captures what would be registered with a build runtime, in order. Used by
//! `swallower plan` and by tests.

use std::collections::HashMap;

use serde::Serialize;

use super::BuildRuntime;
use crate::core::task::BoundTask;
use crate::core::task_set::TaskSetMode;
use crate::error::RuntimeError;

/// What a plan entry registers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlanKind {
    /// A single task
    Task,
    /// A combined task set
    Set {
        /// How members are combined
        mode: TaskSetMode,
        /// Member names in order
        members: Vec<String>,
    },
}

/// One registration, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// Registered name
    pub name: String,
    /// What was registered
    #[serde(flatten)]
    pub kind: PlanKind,
}

/// Combined unit recorded by [`PlanRuntime`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUnit {
    /// How members are combined
    pub mode: TaskSetMode,
    /// Member names in order
    pub members: Vec<String>,
}

/// Runtime that records registrations
#[derive(Debug, Default)]
pub struct PlanRuntime {
    entries: Vec<PlanEntry>,
    tasks: HashMap<String, BoundTask>,
}

impl PlanRuntime {
    /// Create an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrations in order
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Executable unit registered for a task
    pub fn task(&self, name: &str) -> Option<&BoundTask> {
        self.tasks.get(name)
    }

    /// Number of times `name` was registered
    pub fn count(&self, name: &str) -> usize {
        self.entries.iter().filter(|entry| entry.name == name).count()
    }
}

impl BuildRuntime for PlanRuntime {
    type Unit = PlannedUnit;

    fn register_task(&mut self, name: &str, task: BoundTask) -> Result<(), RuntimeError> {
        self.entries.push(PlanEntry {
            name: name.to_string(),
            kind: PlanKind::Task,
        });
        self.tasks.insert(name.to_string(), task);
        Ok(())
    }

    fn series(&mut self, tasks: &[String]) -> Result<Self::Unit, RuntimeError> {
        Ok(PlannedUnit {
            mode: TaskSetMode::Series,
            members: tasks.to_vec(),
        })
    }

    fn parallel(&mut self, tasks: &[String]) -> Result<Self::Unit, RuntimeError> {
        Ok(PlannedUnit {
            mode: TaskSetMode::Parallel,
            members: tasks.to_vec(),
        })
    }

    fn register_unit(&mut self, name: &str, unit: Self::Unit) -> Result<(), RuntimeError> {
        self.entries.push(PlanEntry {
            name: name.to_string(),
            kind: PlanKind::Set {
                mode: unit.mode,
                members: unit.members,
            },
        });
        Ok(())
    }
}
