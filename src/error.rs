//! Error types for swallower
//!
//! Domain-specific error types using thiserror.

use thiserror::Error;

use crate::core::scheduler::StuckPlugins;

/// Task set insertion errors
///
/// A rejected insertion leaves the task set exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskSetError {
    /// The `before` and `after` constraints cannot both be met
    #[error(
        "Cannot place '{task}' in task set '{set}': last 'before' task is at index {last_before}, \
         first 'after' task is at index {first_after}"
    )]
    OrderingConflict {
        set: String,
        task: String,
        last_before: isize,
        first_after: usize,
    },

    /// Ordering constraints supplied for a task set that does not exist yet
    #[error("Cannot place '{task}' with ordering constraints: task set '{set}' does not exist yet")]
    ConstraintsOnMissingSet { set: String, task: String },
}

/// Template construction errors
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Options could not be decoded into the template's option type
    #[error("Invalid options for template '{template}': {error}")]
    InvalidOptions { template: String, error: String },

    /// Template-specific failure
    #[error("{0}")]
    Other(String),
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum TaskError {
    /// Glob set could not be read through the gated accessor
    #[error("Glob set '{id}' is not available")]
    GlobSetUnavailable { id: String },

    /// External process could not be started
    #[error("Failed to spawn '{program}': {error}")]
    Spawn { program: String, error: String },

    /// External process exited unsuccessfully
    #[error("'{program}' exited with {status}")]
    ExitStatus { program: String, status: String },

    /// Task-specific failure
    #[error("{0}")]
    Failed(String),
}

/// Host runtime errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A combinator referenced a task the runtime does not know
    #[error("Task '{name}' is not registered with the runtime")]
    UnknownTask { name: String },

    /// A registered task failed while executing
    #[error("Task '{name}' failed: {source}")]
    TaskFailed {
        name: String,
        #[source]
        source: TaskError,
    },

    /// A worker thread panicked while running a parallel unit
    #[error("Task '{name}' panicked")]
    Panicked { name: String },
}

/// Manifest errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest not found at '{path}'")]
    NotFound { path: String },

    /// IO error while reading the manifest
    #[error("IO error for '{path}': {error}")]
    Io { path: String, error: String },

    /// TOML parse error
    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    /// Task references a template that is not registered
    #[error("Task '{task}' uses unknown template '{template}'")]
    UnknownTemplate { task: String, template: String },
}

/// Top-level swallower error type
#[derive(Error, Debug)]
pub enum SwallowerError {
    /// Task set error
    #[error("Task set error: {0}")]
    TaskSet(#[from] TaskSetError),

    /// Template error
    #[error("Template error for task '{task}': {source}")]
    Template {
        task: String,
        #[source]
        source: TemplateError,
    },

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// A plugin failed while running
    #[error("Plugin '{id}' failed: {source}")]
    Plugin {
        id: String,
        #[source]
        source: Box<SwallowerError>,
    },

    /// Some plugins could not be scheduled
    #[error("{0}")]
    Stuck(StuckPlugins),

    /// A task set names something that is neither a task nor an earlier task set
    #[error("Task set '{set}' references unknown task '{task}'")]
    UnknownTaskSetMember { set: String, task: String },

    /// `run` was called a second time
    #[error("Tasks have already been materialized")]
    AlreadyRan,
}
