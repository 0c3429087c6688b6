//! Build manifest (swallower.toml) parsing and application
//!
//! A manifest declares glob sets, tasks rendered from named templates,
//! task sets, and declarative plugins. String values may reference
//! environment variables as `${VAR}`, and a manifest may inherit from a base
//! file with `extends = "base.toml"`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::glob_set::Patterns;
use super::plugin::Plugin;
use super::swallower::Swallower;
use super::task::TaskOptions;
use super::task_set::{OrderPosition, TaskSetMode};
use super::templates::TemplateRegistry;
use crate::error::{ManifestError, SwallowerError};

/// The build manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Glob sets registered before anything else
    #[serde(default)]
    pub glob_sets: BTreeMap<String, Patterns>,

    /// Tasks rendered from templates
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,

    /// Task sets, members appended in order
    #[serde(default)]
    pub task_sets: Vec<TaskSetEntry>,

    /// Declarative plugins
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
}

/// A task rendered from a named template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    /// Task name
    pub name: String,

    /// Template name
    pub template: String,

    /// Options passed to the template
    #[serde(default, skip_serializing_if = "TaskOptions::is_null")]
    pub options: TaskOptions,
}

/// A task set and its members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSetEntry {
    /// Task set name
    pub name: String,

    /// How members are combined
    #[serde(default = "default_mode")]
    pub mode: TaskSetMode,

    /// Members in order
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// A plugin declared in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEntry {
    /// Plugin id
    pub id: String,

    /// Plugins that must run first
    #[serde(default)]
    pub requires: Vec<String>,

    /// Glob sets to register (replacing existing values)
    #[serde(default)]
    pub glob_sets: BTreeMap<String, Patterns>,

    /// Glob sets to extend
    #[serde(default)]
    pub extend_glob_sets: BTreeMap<String, Patterns>,

    /// Tasks to register
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,

    /// Task set insertions, with optional ordering constraints
    #[serde(default)]
    pub task_sets: Vec<TaskSetInsert>,
}

/// One task added to a task set by a plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSetInsert {
    /// Task set name
    pub name: String,

    /// How members are combined
    #[serde(default = "default_mode")]
    pub mode: TaskSetMode,

    /// Task to add
    pub task: String,

    /// Tasks that must stay ahead of the new task
    #[serde(default)]
    pub before: Vec<String>,

    /// Tasks that must stay behind the new task
    #[serde(default)]
    pub after: Vec<String>,
}

impl TaskSetInsert {
    /// Ordering constraints for this insertion
    pub fn position(&self) -> OrderPosition {
        OrderPosition {
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

fn default_mode() -> TaskSetMode {
    TaskSetMode::Series
}

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid environment variable pattern")
});

/// Replace `${VAR}` references with values from the environment
///
/// Unset variables expand to an empty string.
pub fn expand_env_vars(input: &str) -> Cow<'_, str> {
    ENV_VAR.replace_all(input, |caps: &Captures<'_>| std::env::var(&caps[1]).unwrap_or_default())
}

/// Expand environment variables in every string of a TOML tree
fn expand_strings(value: &mut toml::Value) {
    match value {
        toml::Value::String(text) => {
            let expanded = expand_env_vars(text).into_owned();
            *text = expanded;
        }
        toml::Value::Array(items) => items.iter_mut().for_each(expand_strings),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| expand_strings(v)),
        _ => {}
    }
}

/// Layer `overlay` on top of `base`; nested tables merge key by key
fn overlay_table(base: &mut toml::value::Table, overlay: toml::value::Table) {
    for (key, upper) in overlay {
        let merged = match (base.remove(&key), upper) {
            (Some(toml::Value::Table(mut lower)), toml::Value::Table(upper)) => {
                overlay_table(&mut lower, upper);
                toml::Value::Table(lower)
            }
            (_, upper) => upper,
        };
        base.insert(key, merged);
    }
}

/// Read a TOML file and resolve its `extends` chain
fn load_value(path: &Path, depth: usize) -> Result<toml::Value, ManifestError> {
    if depth > crate::config::defaults::MAX_EXTENDS_DEPTH {
        return Err(ManifestError::Parse(format!(
            "'extends' chain deeper than {} at '{}'",
            crate::config::defaults::MAX_EXTENDS_DEPTH,
            path.display()
        )));
    }

    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let mut value: toml::Value =
        toml::from_str(&content).map_err(|e| ManifestError::Parse(e.to_string()))?;

    let extends = value
        .get("extends")
        .and_then(toml::Value::as_str)
        .map(ToString::to_string);

    if let toml::Value::Table(table) = &mut value {
        table.remove("extends");
    }

    if let Some(extends) = extends {
        let base_dir = path.parent().unwrap_or(Path::new("."));
        tracing::debug!("Manifest '{}' extends '{extends}'", path.display());

        let base = load_value(&base_dir.join(&extends), depth + 1)?;
        value = match (base, value) {
            (toml::Value::Table(mut merged), toml::Value::Table(current)) => {
                overlay_table(&mut merged, current);
                toml::Value::Table(merged)
            }
            (_, current) => current,
        };
    }

    Ok(value)
}

impl Manifest {
    /// Load a manifest, resolving `extends` and `${VAR}` substitution
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let mut value = load_value(path, 0)?;
        expand_strings(&mut value);

        value
            .try_into()
            .map_err(|e: toml::de::Error| ManifestError::Parse(e.to_string()))
    }

    /// Parse a manifest from TOML, without substitution or inheritance
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        toml::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))
    }

    /// Serialize the manifest to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Every task entry, including those declared by plugins
    pub fn all_tasks(&self) -> impl Iterator<Item = &TaskEntry> {
        self.tasks
            .iter()
            .chain(self.plugins.iter().flat_map(|plugin| plugin.tasks.iter()))
    }

    /// Register everything in the manifest with `swallower`
    ///
    /// Plugins are queued, not run; they run when the swallower runs.
    pub fn apply(
        &self,
        swallower: &mut Swallower,
        templates: &Rc<TemplateRegistry>,
    ) -> Result<(), SwallowerError> {
        if let Some(entry) = self
            .all_tasks()
            .find(|entry| !templates.contains(&entry.template))
        {
            return Err(ManifestError::UnknownTemplate {
                task: entry.name.clone(),
                template: entry.template.clone(),
            }
            .into());
        }

        for (id, patterns) in &self.glob_sets {
            swallower.register_glob_set(id, patterns.clone());
        }

        for entry in &self.tasks {
            register_entry(swallower, templates, entry)?;
        }

        for set in &self.task_sets {
            if set.tasks.is_empty() {
                tracing::warn!("Task set '{}' has no tasks and is not created", set.name);
            }
            for task in &set.tasks {
                swallower.extend_task_set(&set.name, set.mode, task, &OrderPosition::none())?;
            }
        }

        for entry in &self.plugins {
            swallower.register_plugin(ManifestPlugin::new(entry.clone(), Rc::clone(templates)));
        }

        Ok(())
    }
}

fn register_entry(
    swallower: &mut Swallower,
    templates: &TemplateRegistry,
    entry: &TaskEntry,
) -> Result<(), SwallowerError> {
    let template = templates
        .get(&entry.template)
        .ok_or_else(|| ManifestError::UnknownTemplate {
            task: entry.name.clone(),
            template: entry.template.clone(),
        })?;

    swallower.register_task(&entry.name, template, entry.options.clone())
}

/// Plugin declared in a manifest
///
/// Registers its glob sets, extends glob sets, registers its tasks and then
/// inserts into task sets, in that order. A rejected task set insertion fails
/// the plugin.
#[derive(Debug)]
pub struct ManifestPlugin {
    entry: PluginEntry,
    templates: Rc<TemplateRegistry>,
}

impl ManifestPlugin {
    /// Create a plugin from its manifest entry
    pub fn new(entry: PluginEntry, templates: Rc<TemplateRegistry>) -> Self {
        Self { entry, templates }
    }
}

impl Plugin for ManifestPlugin {
    fn id(&self) -> &str {
        &self.entry.id
    }

    fn requirements(&self) -> &[String] {
        &self.entry.requires
    }

    fn run(&mut self, swallower: &mut Swallower) -> Result<(), SwallowerError> {
        for (id, patterns) in &self.entry.glob_sets {
            swallower.register_glob_set(id, patterns.clone());
        }

        for (id, patterns) in &self.entry.extend_glob_sets {
            swallower.extend_glob_set(id, patterns.clone());
        }

        for task in &self.entry.tasks {
            register_entry(swallower, &self.templates, task)?;
        }

        for insert in &self.entry.task_sets {
            swallower.extend_task_set(&insert.name, insert.mode, &insert.task, &insert.position())?;
        }

        Ok(())
    }
}
