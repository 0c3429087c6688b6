//! Manifest validation
//!
//! Validates identifiers, template names, task set members, glob set
//! references and plugin requirements without registering anything.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::manifest::Manifest;
use super::scheduler;
use super::templates::{referenced_glob_sets, TemplateRegistry, LIST_GLOBS_TEMPLATE};

/// Valid task, glob set, task set and plugin identifiers
pub const IDENTIFIER_PATTERN: &str = r"^[A-Za-z0-9_][A-Za-z0-9_:.\-]*$";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).expect("Invalid identifier pattern"));

/// Result of the check operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    /// Problems that would break a run
    pub errors: Vec<String>,
    /// Suspicious but runnable configuration
    pub warnings: Vec<String>,
    /// Order plugins would run in
    pub plugin_order: Vec<String>,
    /// Plugins that could never run
    pub stuck_plugins: Vec<String>,
    /// Declared tasks, plugins included
    pub tasks: Vec<String>,
    /// Declared task sets, plugins included
    pub task_sets: Vec<String>,
}

impl CheckResult {
    /// Create an empty check result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all validations passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// Validate a manifest against the available templates
pub fn check(manifest: &Manifest, templates: &TemplateRegistry) -> CheckResult {
    let mut result = CheckResult::new();

    let mut glob_sets: Vec<String> = manifest.glob_sets.keys().cloned().collect();
    for plugin in &manifest.plugins {
        for id in plugin.glob_sets.keys().chain(plugin.extend_glob_sets.keys()) {
            push_unique(&mut glob_sets, id);
        }
    }

    let mut seen_tasks = HashSet::new();
    for entry in manifest.all_tasks() {
        if !seen_tasks.insert(entry.name.as_str()) {
            result
                .warnings
                .push(format!("Task '{}' is defined more than once; the last definition wins", entry.name));
        }
        push_unique(&mut result.tasks, &entry.name);
    }

    for set in &manifest.task_sets {
        push_unique(&mut result.task_sets, &set.name);
    }
    for plugin in &manifest.plugins {
        for insert in &plugin.task_sets {
            push_unique(&mut result.task_sets, &insert.name);
        }
    }

    check_identifiers(manifest, &glob_sets, &mut result);

    // Templates
    for entry in manifest.all_tasks() {
        if !templates.contains(&entry.template) {
            result.errors.push(format!(
                "Task '{}' uses unknown template '{}' (available: {})",
                entry.name,
                entry.template,
                templates.names().join(", ")
            ));
        }
    }

    // Plugin scheduling
    let batch: Vec<(&str, &[String])> = manifest
        .plugins
        .iter()
        .map(|plugin| (plugin.id.as_str(), plugin.requires.as_slice()))
        .collect();
    let schedule = scheduler::schedule(&batch, &HashSet::new());

    result.plugin_order = schedule
        .order
        .iter()
        .map(|&index| batch[index].0.to_string())
        .collect();

    check_task_sets(manifest, &schedule.order, &mut result);

    // Glob set references
    for entry in manifest.all_tasks() {
        let mut referenced = referenced_glob_sets(&entry.options);
        if entry.template == LIST_GLOBS_TEMPLATE {
            if let Some(ids) = entry.options.get("glob_sets").and_then(|value| value.as_array()) {
                for id in ids.iter().filter_map(|value| value.as_str()) {
                    push_unique(&mut referenced, id);
                }
            }
        }

        for id in referenced {
            if !glob_sets.contains(&id) {
                result.warnings.push(format!(
                    "Task '{}' references undefined glob set '{id}'",
                    entry.name
                ));
            }
        }
    }

    for stuck in &schedule.stuck {
        let mut reasons = Vec::new();
        if !stuck.missing.is_empty() {
            reasons.push(format!("missing: {}", stuck.missing.join(", ")));
        }
        if !stuck.blocked.is_empty() {
            reasons.push(format!("circular: {}", stuck.blocked.join(", ")));
        }
        result
            .errors
            .push(format!("Plugin '{}' can never run ({})", stuck.id, reasons.join("; ")));
        result.stuck_plugins.push(stuck.id.clone());
    }

    result
}

/// Check task set members in the order sets are created at run time
///
/// Top-level sets come first, in manifest order, followed by plugin
/// insertions in plugin run order. A member must be a task or a set created
/// before the set that lists it.
fn check_task_sets(manifest: &Manifest, plugin_order: &[usize], result: &mut CheckResult) {
    let tasks: HashSet<&str> = manifest.all_tasks().map(|entry| entry.name.as_str()).collect();
    let mut created: HashSet<&str> = HashSet::new();
    let is_member = |created: &HashSet<&str>, name: &str| tasks.contains(name) || created.contains(name);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let created_later = |name: &str, created: &HashSet<&str>| {
        let declared = manifest
            .task_sets
            .iter()
            .any(|entry| entry.name == name && !entry.tasks.is_empty())
            || manifest
                .plugins
                .iter()
                .any(|plugin| plugin.task_sets.iter().any(|insert| insert.name == name));
        declared && !created.contains(name)
    };

    for set in &manifest.task_sets {
        if set.tasks.is_empty() {
            warnings.push(format!("Task set '{}' has no tasks and is never created", set.name));
            continue;
        }
        for task in &set.tasks {
            if is_member(&created, task.as_str()) {
                continue;
            }
            if created_later(task.as_str(), &created) {
                errors.push(format!(
                    "Task set '{}' references task set '{task}' before it is created",
                    set.name
                ));
            } else {
                errors.push(format!("Task set '{}' references unknown task '{task}'", set.name));
            }
        }
        created.insert(set.name.as_str());
    }

    for plugin in plugin_order.iter().map(|&index| &manifest.plugins[index]) {
        for insert in &plugin.task_sets {
            if !is_member(&created, insert.task.as_str()) {
                let problem = if created_later(insert.task.as_str(), &created) {
                    "task set that is created later"
                } else {
                    "unknown task"
                };
                errors.push(format!(
                    "Plugin '{}' adds {problem} '{}' to task set '{}'",
                    plugin.id, insert.task, insert.name
                ));
            }
            for constraint in insert.before.iter().chain(&insert.after) {
                if !is_member(&created, constraint.as_str()) {
                    warnings.push(format!(
                        "Plugin '{}' orders '{}' against unknown task '{constraint}'; the constraint is ignored",
                        plugin.id, insert.task
                    ));
                }
            }
            created.insert(insert.name.as_str());
        }
    }

    let mut collisions: Vec<&str> = created.into_iter().filter(|set| tasks.contains(set)).collect();
    collisions.sort_unstable();
    for name in collisions {
        warnings.push(format!(
            "Task set '{name}' has the same name as a task; the runtime registers the set in its place"
        ));
    }

    result.errors.extend(errors);
    result.warnings.extend(warnings);
}

fn check_identifiers(manifest: &Manifest, glob_sets: &[String], result: &mut CheckResult) {
    let mut invalid = |kind: &str, id: &str| {
        if !IDENTIFIER.is_match(id) {
            result.errors.push(format!("Invalid {kind} name '{id}'"));
        }
    };

    for id in glob_sets {
        invalid("glob set", id);
    }
    for entry in manifest.all_tasks() {
        invalid("task", &entry.name);
    }
    for set in &manifest.task_sets {
        invalid("task set", &set.name);
    }
    for plugin in &manifest.plugins {
        invalid("plugin", &plugin.id);
        for insert in &plugin.task_sets {
            invalid("task set", &insert.name);
        }
    }
}
