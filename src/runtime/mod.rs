//! Host build runtime
//!
//! Materialized tasks and task sets are handed to a [`BuildRuntime`]. The
//! crate ships two hosts:
//!
//! - [`plan::PlanRuntime`] - records registrations without running anything
//! - [`local::LocalRuntime`] - runs registered tasks in-process

pub mod local;
pub mod plan;

use crate::core::task::BoundTask;
use crate::error::RuntimeError;

/// Operations the registry needs from a build runtime
pub trait BuildRuntime {
    /// Combined unit produced by [`series`](Self::series) and [`parallel`](Self::parallel)
    type Unit;

    /// Register a single task under `name`
    fn register_task(&mut self, name: &str, task: BoundTask) -> Result<(), RuntimeError>;

    /// Combine named tasks into a unit that runs them in order
    fn series(&mut self, tasks: &[String]) -> Result<Self::Unit, RuntimeError>;

    /// Combine named tasks into a unit that runs them concurrently
    fn parallel(&mut self, tasks: &[String]) -> Result<Self::Unit, RuntimeError>;

    /// Register a combined unit under `name`
    fn register_unit(&mut self, name: &str, unit: Self::Unit) -> Result<(), RuntimeError>;
}
