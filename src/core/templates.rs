//! Built-in task templates
//!
//! Manifests refer to templates by name. [`TemplateRegistry::with_builtins`]
//! provides:
//!
//! - `command` - run an external program; an argument of the form
//!   `{globs:<id>}` expands to the patterns of that glob set
//! - `list-globs` - print the patterns of the given glob sets

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::gate::{GlobLookup, GlobSetGetter};
use super::task::{action, TaskAction, TaskOptions, TaskTemplate};
use crate::error::{TaskError, TemplateError};

/// Name of the process-spawning template
pub const COMMAND_TEMPLATE: &str = "command";

/// Name of the glob listing template
pub const LIST_GLOBS_TEMPLATE: &str = "list-globs";

const GLOB_PLACEHOLDER: &str = r"\{globs:([A-Za-z0-9_][A-Za-z0-9_:.\-]*)\}";

/// `{globs:<id>}` anywhere in a string
static GLOB_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GLOB_PLACEHOLDER).expect("Invalid glob placeholder pattern"));

/// An argument that is exactly one `{globs:<id>}`
static GLOB_ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{GLOB_PLACEHOLDER}$")).expect("Invalid glob placeholder pattern")
});

/// Templates available by name
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Box<dyn TaskTemplate>>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.names())
            .finish()
    }
}

impl TemplateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in templates
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(COMMAND_TEMPLATE, CommandTemplate);
        registry.register(LIST_GLOBS_TEMPLATE, ListGlobsTemplate);
        registry
    }

    /// Add or replace a template
    pub fn register<T>(&mut self, name: &str, template: T)
    where
        T: TaskTemplate + 'static,
    {
        self.templates.insert(name.to_string(), Box::new(template));
    }

    /// Look up a template
    pub fn get(&self, name: &str) -> Option<&dyn TaskTemplate> {
        self.templates.get(name).map(|template| &**template)
    }

    /// Check whether a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered template names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Glob set ids referenced through `{globs:<id>}` anywhere in `options`
pub fn referenced_glob_sets(options: &TaskOptions) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(options, &mut found);
    found
}

fn collect_references(value: &TaskOptions, found: &mut Vec<String>) {
    match value {
        TaskOptions::String(s) => {
            for cap in GLOB_REFERENCE.captures_iter(s) {
                let id = cap[1].to_string();
                if !found.contains(&id) {
                    found.push(id);
                }
            }
        }
        TaskOptions::Array(items) => {
            for item in items {
                collect_references(item, found);
            }
        }
        TaskOptions::Object(map) => {
            for item in map.values() {
                collect_references(item, found);
            }
        }
        _ => {}
    }
}

fn decode_options<T: DeserializeOwned>(template: &str, options: &TaskOptions) -> Result<T, TemplateError> {
    serde_json::from_value(options.clone()).map_err(|e| TemplateError::InvalidOptions {
        template: template.to_string(),
        error: e.to_string(),
    })
}

fn read_glob_set(globs: &GlobSetGetter, id: &str) -> Result<Vec<String>, TaskError> {
    match globs.get_glob_set(id) {
        GlobLookup::Found(patterns) => Ok(patterns),
        GlobLookup::NotFound | GlobLookup::NotAvailable => Err(TaskError::GlobSetUnavailable {
            id: id.to_string(),
        }),
    }
}

/// Options for the `command` template
#[derive(Debug, Clone, Deserialize)]
struct CommandOptions {
    program: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    cwd: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CommandArg {
    Literal(String),
    Globs(String),
}

/// Runs an external program
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTemplate;

impl TaskTemplate for CommandTemplate {
    fn name(&self) -> &str {
        COMMAND_TEMPLATE
    }

    fn construct(&self, options: &TaskOptions) -> Result<Box<dyn TaskAction>, TemplateError> {
        let options: CommandOptions = decode_options(COMMAND_TEMPLATE, options)?;

        // Placeholders are resolved now; glob sets are read only when the task runs.
        let args: Vec<CommandArg> = options
            .args
            .iter()
            .map(|arg| match GLOB_ARGUMENT.captures(arg) {
                Some(cap) => CommandArg::Globs(cap[1].to_string()),
                None => CommandArg::Literal(arg.clone()),
            })
            .collect();

        let CommandOptions { program, cwd, .. } = options;
        Ok(action(move |globs| {
            let mut resolved = Vec::with_capacity(args.len());
            for arg in &args {
                match arg {
                    CommandArg::Literal(value) => resolved.push(value.clone()),
                    CommandArg::Globs(id) => resolved.extend(read_glob_set(globs, id)?),
                }
            }

            tracing::debug!("Running {program} {}", resolved.join(" "));
            let mut command = Command::new(&program);
            command.args(&resolved);
            if let Some(dir) = &cwd {
                command.current_dir(dir);
            }

            let status = command.status().map_err(|e| TaskError::Spawn {
                program: program.clone(),
                error: e.to_string(),
            })?;

            if status.success() {
                Ok(())
            } else {
                Err(TaskError::ExitStatus {
                    program: program.clone(),
                    status: status.to_string(),
                })
            }
        }))
    }
}

/// Options for the `list-globs` template
#[derive(Debug, Clone, Deserialize)]
struct ListGlobsOptions {
    glob_sets: Vec<String>,
}

/// Prints glob set patterns, one per line
#[derive(Debug, Clone, Copy, Default)]
pub struct ListGlobsTemplate;

impl TaskTemplate for ListGlobsTemplate {
    fn name(&self) -> &str {
        LIST_GLOBS_TEMPLATE
    }

    fn construct(&self, options: &TaskOptions) -> Result<Box<dyn TaskAction>, TemplateError> {
        let ListGlobsOptions { glob_sets } = decode_options(LIST_GLOBS_TEMPLATE, options)?;

        Ok(action(move |globs| {
            for id in &glob_sets {
                for pattern in read_glob_set(globs, id)? {
                    println!("{id}: {pattern}");
                }
            }
            Ok(())
        }))
    }
}
