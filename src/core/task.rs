//! Task templates, actions and definitions
//!
//! Building a task happens in two phases:
//!
//! 1. **Construction** - [`TaskTemplate::construct`] turns options into a
//!    [`TaskAction`]. It runs at registration time, while glob sets are still
//!    being composed, and has no glob access.
//! 2. **Execution** - [`TaskAction::execute`] runs later, inside the host
//!    runtime, and receives the [`GlobSetGetter`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::gate::GlobSetGetter;
use crate::error::{TaskError, TemplateError};

/// Free-form options passed to templates and definition constructors
pub type TaskOptions = serde_json::Value;

/// Replace `null` options with an empty object
pub fn normalize_options(options: TaskOptions) -> TaskOptions {
    if options.is_null() {
        TaskOptions::Object(serde_json::Map::new())
    } else {
        options
    }
}

/// Deferred body of a task
pub trait TaskAction: Send + Sync {
    /// Run the task
    fn execute(&self, globs: &GlobSetGetter) -> Result<(), TaskError>;
}

impl<F> TaskAction for F
where
    F: Fn(&GlobSetGetter) -> Result<(), TaskError> + Send + Sync,
{
    fn execute(&self, globs: &GlobSetGetter) -> Result<(), TaskError> {
        self(globs)
    }
}

/// Box a closure as a [`TaskAction`]
pub fn action<F>(f: F) -> Box<dyn TaskAction>
where
    F: Fn(&GlobSetGetter) -> Result<(), TaskError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Factory that renders options into a task action
pub trait TaskTemplate {
    /// Template name used in error messages
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Build the task action. Must not read glob sets.
    fn construct(&self, options: &TaskOptions) -> Result<Box<dyn TaskAction>, TemplateError>;
}

impl<F> TaskTemplate for F
where
    F: Fn(&TaskOptions) -> Result<Box<dyn TaskAction>, TemplateError>,
{
    fn construct(&self, options: &TaskOptions) -> Result<Box<dyn TaskAction>, TemplateError> {
        self(options)
    }
}

/// A task action bound to the gated glob accessor
///
/// This is the executable unit handed to the host runtime.
#[derive(Clone)]
pub struct BoundTask {
    action: Arc<dyn TaskAction>,
    globs: GlobSetGetter,
}

impl BoundTask {
    pub(crate) fn new(action: Arc<dyn TaskAction>, globs: GlobSetGetter) -> Self {
        Self { action, globs }
    }

    /// Execute the task
    pub fn run(&self) -> Result<(), TaskError> {
        self.action.execute(&self.globs)
    }
}

impl fmt::Debug for BoundTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundTask")
            .field("globs_ready", &self.globs.state())
            .finish_non_exhaustive()
    }
}

/// Name and options for one task rendered from a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task name
    pub name: String,
    /// Options passed to the template
    #[serde(default)]
    pub options: TaskOptions,
}

impl TaskDefinition {
    /// Create a definition
    pub fn new(name: impl Into<String>, options: TaskOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// One or more task definitions produced by a definition constructor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDefinitions(pub Vec<TaskDefinition>);

impl From<TaskDefinition> for TaskDefinitions {
    fn from(definition: TaskDefinition) -> Self {
        Self(vec![definition])
    }
}

impl From<Vec<TaskDefinition>> for TaskDefinitions {
    fn from(definitions: Vec<TaskDefinition>) -> Self {
        Self(definitions)
    }
}

impl IntoIterator for TaskDefinitions {
    type Item = TaskDefinition;
    type IntoIter = std::vec::IntoIter<TaskDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Registered task actions in registration order
#[derive(Default)]
pub struct Tasks {
    order: Vec<String>,
    actions: HashMap<String, Arc<dyn TaskAction>>,
}

impl Tasks {
    /// Create an empty task registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an action. Re-registering keeps the original position.
    pub fn insert(&mut self, id: &str, action: Box<dyn TaskAction>) {
        if self.actions.insert(id.to_string(), Arc::from(action)).is_some() {
            tracing::debug!("Replaced task '{id}'");
        } else {
            self.order.push(id.to_string());
            tracing::debug!("Registered task '{id}'");
        }
    }

    /// Check whether a task exists
    pub fn contains(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    /// Task ids in registration order
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Iterate tasks in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn TaskAction>)> {
        self.order
            .iter()
            .filter_map(|id| self.actions.get(id).map(|action| (id.as_str(), action)))
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if there are no tasks
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for Tasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tasks").field("order", &self.order).finish()
    }
}
