//! Plugin contract and pending queue
//!
//! A plugin bundles glob sets, tasks and task-set entries that extend a
//! build. Plugins declare the ids of plugins that must run before them;
//! [`crate::core::scheduler`] turns those declarations into a run order.

use std::collections::VecDeque;
use std::fmt;

use super::swallower::Swallower;
use crate::error::SwallowerError;

/// Free-form options passed to plugin factories
pub type PluginOptions = serde_json::Value;

/// A unit of build configuration that runs once its requirements have run
pub trait Plugin {
    /// Unique plugin id
    fn id(&self) -> &str;

    /// Ids of plugins that must run first
    fn requirements(&self) -> &[String] {
        &[]
    }

    /// Apply the plugin to the registry
    fn run(&mut self, swallower: &mut Swallower) -> Result<(), SwallowerError>;
}

/// Plugins waiting to run, in registration order
#[derive(Default)]
pub struct PluginQueue {
    pending: VecDeque<Box<dyn Plugin>>,
}

impl PluginQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plugin
    pub fn push(&mut self, plugin: Box<dyn Plugin>) {
        tracing::debug!(
            "Queued plugin '{}' (requires: [{}])",
            plugin.id(),
            plugin.requirements().join(", ")
        );
        self.pending.push_back(plugin);
    }

    /// Remove and return every queued plugin
    pub fn take(&mut self) -> Vec<Box<dyn Plugin>> {
        self.pending.drain(..).collect()
    }

    /// Put plugins back at the front of the queue, keeping their order
    pub fn requeue(&mut self, plugins: Vec<Box<dyn Plugin>>) {
        for plugin in plugins.into_iter().rev() {
            self.pending.push_front(plugin);
        }
    }

    /// Ids of queued plugins
    pub fn ids(&self) -> Vec<&str> {
        self.pending.iter().map(|plugin| plugin.id()).collect()
    }

    /// Number of queued plugins
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl fmt::Debug for PluginQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginQueue")
            .field("pending", &self.ids())
            .finish()
    }
}
