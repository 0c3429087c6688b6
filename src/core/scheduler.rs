//! Plugin scheduling
//!
//! Computes the order plugins run in from their declared requirements, and
//! reports plugins whose requirements can never be met.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

/// A plugin that could not be scheduled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StuckPlugin {
    /// Plugin id
    pub id: String,
    /// Requirements no queued plugin provides
    pub missing: Vec<String>,
    /// Requirements provided by plugins that never complete (cycles)
    pub blocked: Vec<String>,
}

/// Plugins abandoned by a scheduling run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StuckPlugins(pub Vec<StuckPlugin>);

impl StuckPlugins {
    /// Ids of the stuck plugins
    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|plugin| plugin.id.as_str()).collect()
    }

    /// Check if nothing is stuck
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StuckPlugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plugins could not be scheduled:")?;
        for plugin in &self.0 {
            write!(f, " '{}'", plugin.id)?;
            if !plugin.missing.is_empty() {
                write!(f, " (missing: {})", plugin.missing.join(", "))?;
            }
            if !plugin.blocked.is_empty() {
                write!(f, " (circular: {})", plugin.blocked.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Outcome of scheduling a batch of plugins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Indices into the batch, in the order they should run
    pub order: Vec<usize>,
    /// Plugins that can never run
    pub stuck: Vec<StuckPlugin>,
}

/// Order a batch of `(id, requirements)` pairs
///
/// Requirements already in `completed` count as satisfied. Plugins with no
/// outstanding requirements run in batch order; each completion appends the
/// dependents it unblocks, again in batch order. Every plugin appears in
/// `order` at most once.
pub fn schedule(plugins: &[(&str, &[String])], completed: &HashSet<String>) -> Schedule {
    let mut provided: HashSet<&str> = HashSet::new();
    let mut waiting_on: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut unmet: Vec<HashSet<&str>> = Vec::with_capacity(plugins.len());

    for (index, &(id, requirements)) in plugins.iter().enumerate() {
        provided.insert(id);

        let outstanding: HashSet<&str> = requirements
            .iter()
            .map(String::as_str)
            .filter(|requirement| !completed.contains(*requirement))
            .collect();
        for &requirement in &outstanding {
            waiting_on.entry(requirement).or_default().push(index);
        }
        unmet.push(outstanding);
    }

    let mut ready: VecDeque<usize> = (0..plugins.len())
        .filter(|&index| unmet[index].is_empty())
        .collect();
    let mut done: HashSet<&str> = HashSet::new();
    let mut order = Vec::with_capacity(plugins.len());

    while let Some(index) = ready.pop_front() {
        order.push(index);

        let id = plugins[index].0;
        if !done.insert(id) {
            continue;
        }

        if let Some(dependents) = waiting_on.get(id) {
            for &dependent in dependents {
                if unmet[dependent].remove(id) && unmet[dependent].is_empty() {
                    ready.push_back(dependent);
                }
            }
        }
    }

    let scheduled: HashSet<usize> = order.iter().copied().collect();
    let stuck = (0..plugins.len())
        .filter(|index| !scheduled.contains(index))
        .map(|index| {
            let (id, requirements) = plugins[index];
            let mut missing = Vec::new();
            let mut blocked = Vec::new();

            for requirement in requirements {
                let requirement = requirement.as_str();
                if !unmet[index].contains(requirement)
                    || missing.contains(&requirement.to_string())
                    || blocked.contains(&requirement.to_string())
                {
                    continue;
                }
                if provided.contains(requirement) {
                    blocked.push(requirement.to_string());
                } else {
                    missing.push(requirement.to_string());
                }
            }

            StuckPlugin {
                id: id.to_string(),
                missing,
                blocked,
            }
        })
        .collect();

    Schedule { order, stuck }
}
