//! Task, glob set and plugin registry
//!
//! [`Swallower`] owns every registration made while composing a build:
//! tasks, glob sets, task sets and queued plugins. [`Swallower::run`]
//! schedules the plugins, opens the glob gate and hands everything to a
//! [`BuildRuntime`].

use std::collections::HashSet;
use std::sync::Arc;

use super::gate::GlobSetGetter;
use super::glob_set::{NamedGlobSet, Patterns};
use super::plugin::{Plugin, PluginOptions, PluginQueue};
use super::scheduler::{self, StuckPlugin, StuckPlugins};
use super::task::{normalize_options, BoundTask, TaskDefinitions, TaskOptions, TaskTemplate, Tasks};
use super::task_set::{OrderPosition, TaskSetMode, TaskSets};
use crate::error::SwallowerError;
use crate::runtime::BuildRuntime;

/// Outcome of [`Swallower::run_plugins`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginRun {
    /// Ids of plugins that ran, in order
    pub ran: Vec<String>,
    /// Plugins that could not be scheduled
    pub stuck: StuckPlugins,
}

/// Outcome of [`Swallower::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ids of plugins that ran, in order
    pub plugins_run: Vec<String>,
    /// Plugins that could not be scheduled, if any
    pub stuck: Option<StuckPlugins>,
    /// Number of tasks registered with the runtime
    pub tasks_registered: usize,
    /// Number of task sets registered with the runtime
    pub task_sets_registered: usize,
}

/// Registry for one build configuration
#[derive(Debug, Default)]
pub struct Swallower {
    tasks: Tasks,
    task_sets: TaskSets,
    globs: GlobSetGetter,
    plugins: PluginQueue,
    ran: bool,
}

impl Swallower {
    /// Create an empty registry with a closed glob gate
    pub fn new() -> Self {
        Self::default()
    }

    // Glob sets

    /// Register a glob set, replacing any previous value
    pub fn register_glob_set(&mut self, id: &str, patterns: impl Into<Patterns>) {
        self.globs.with_globs_mut(|sets| sets.register(id, patterns));
    }

    /// Append patterns to a glob set, creating it if needed
    pub fn extend_glob_set(&mut self, id: &str, patterns: impl Into<Patterns>) {
        self.globs.with_globs_mut(|sets| sets.extend(id, patterns));
    }

    /// Register a named glob set
    pub fn register_named_glob_set(&mut self, named: NamedGlobSet) {
        self.register_glob_set(&named.name, named.glob_set);
    }

    /// Register several named glob sets in order
    pub fn register_named_glob_sets(&mut self, named: impl IntoIterator<Item = NamedGlobSet>) {
        for set in named {
            self.register_named_glob_set(set);
        }
    }

    /// Extend a named glob set
    pub fn extend_named_glob_set(&mut self, named: NamedGlobSet) {
        self.extend_glob_set(&named.name, named.glob_set);
    }

    /// Extend several named glob sets in order
    pub fn extend_named_glob_sets(&mut self, named: impl IntoIterator<Item = NamedGlobSet>) {
        for set in named {
            self.extend_named_glob_set(set);
        }
    }

    /// Get a copy of a glob set, ignoring the gate
    pub fn get_glob_set(&self, id: &str) -> Option<Vec<String>> {
        self.globs.with_globs(|sets| sets.get(id).map(<[String]>::to_vec))
    }

    /// All glob sets in registration order, ignoring the gate
    pub fn glob_sets(&self) -> Vec<(String, Vec<String>)> {
        self.globs.with_globs(|sets| {
            sets.iter()
                .map(|(id, globs)| (id.to_string(), globs.to_vec()))
                .collect()
        })
    }

    /// Gated accessor shared with task actions
    pub fn glob_set_getter(&self) -> GlobSetGetter {
        self.globs.clone()
    }

    // Tasks

    /// Render a template into a task and register it under `id`
    ///
    /// The template is constructed immediately, before glob sets are ready.
    pub fn register_task<T>(
        &mut self,
        id: &str,
        template: &T,
        options: TaskOptions,
    ) -> Result<(), SwallowerError>
    where
        T: TaskTemplate + ?Sized,
    {
        let options = normalize_options(options);
        tracing::debug!("Registering task '{id}' from template '{}'", template.name());
        let action = template
            .construct(&options)
            .map_err(|source| SwallowerError::Template {
                task: id.to_string(),
                source,
            })?;

        self.tasks.insert(id, action);
        Ok(())
    }

    /// Register every task produced by a definition constructor
    pub fn define_tasks<T, F, O, D>(
        &mut self,
        template: &T,
        constructor: F,
        definition_options: O,
    ) -> Result<(), SwallowerError>
    where
        T: TaskTemplate + ?Sized,
        F: FnOnce(O) -> D,
        D: Into<TaskDefinitions>,
    {
        let definitions: TaskDefinitions = constructor(definition_options).into();
        for definition in definitions {
            self.register_task(&definition.name, template, definition.options)?;
        }
        Ok(())
    }

    /// Check whether a task is registered
    pub fn has_task(&self, id: &str) -> bool {
        self.tasks.contains(id)
    }

    /// Registered task ids in order
    pub fn task_ids(&self) -> &[String] {
        self.tasks.ids()
    }

    // Task sets

    /// Add a task to a task set, creating the set if needed
    ///
    /// The mode is recorded even if the insertion is rejected. On rejection
    /// the set is unchanged.
    pub fn extend_task_set(
        &mut self,
        set_id: &str,
        mode: TaskSetMode,
        task_id: &str,
        position: &OrderPosition,
    ) -> Result<(), SwallowerError> {
        self.task_sets
            .insert(set_id, mode, task_id, position)
            .map_err(|e| {
                tracing::warn!("{e}");
                SwallowerError::from(e)
            })
    }

    /// Members of a task set
    pub fn get_task_set(&self, set_id: &str) -> Option<&[String]> {
        self.task_sets.get(set_id)
    }

    /// Recorded mode of a task set
    pub fn task_set_mode(&self, set_id: &str) -> Option<TaskSetMode> {
        self.task_sets.mode(set_id)
    }

    /// All task sets in creation order
    pub fn task_sets(&self) -> &TaskSets {
        &self.task_sets
    }

    // Plugins

    /// Queue a plugin
    pub fn register_plugin<P>(&mut self, plugin: P)
    where
        P: Plugin + 'static,
    {
        self.plugins.push(Box::new(plugin));
    }

    /// Build a plugin with a factory and queue it
    pub fn register_plugin_with<F, P>(&mut self, factory: F, options: PluginOptions)
    where
        F: FnOnce(&Swallower, PluginOptions) -> P,
        P: Plugin + 'static,
    {
        let plugin = factory(self, normalize_options(options));
        self.register_plugin(plugin);
    }

    /// Ids of plugins waiting to run
    pub fn pending_plugins(&self) -> Vec<&str> {
        self.plugins.ids()
    }

    /// Run queued plugins in dependency order
    ///
    /// Plugins queued while another plugin runs are scheduled too. Plugins
    /// whose requirements can never be met are dropped and reported in
    /// [`PluginRun::stuck`]; plugins that already ran keep their effects.
    /// If a plugin fails, the plugins that did not get to run go back on the
    /// queue ahead of anything it queued.
    pub fn run_plugins(&mut self) -> Result<PluginRun, SwallowerError> {
        let mut completed: HashSet<String> = HashSet::new();
        let mut ran = Vec::new();
        let mut pending: Vec<Box<dyn Plugin>> = Vec::new();
        let mut stuck: Vec<StuckPlugin> = Vec::new();

        loop {
            pending.extend(self.plugins.take());
            if pending.is_empty() {
                break;
            }

            let schedule = {
                let batch: Vec<(&str, &[String])> = pending
                    .iter()
                    .map(|plugin| (plugin.id(), plugin.requirements()))
                    .collect();
                scheduler::schedule(&batch, &completed)
            };

            let mut slots: Vec<Option<Box<dyn Plugin>>> = pending.into_iter().map(Some).collect();
            for index in schedule.order {
                let Some(mut plugin) = slots[index].take() else {
                    continue;
                };
                let id = plugin.id().to_string();

                tracing::info!("Running plugin '{id}'");
                if let Err(source) = plugin.run(self) {
                    self.plugins.requeue(slots.into_iter().flatten().collect());
                    return Err(SwallowerError::Plugin {
                        id,
                        source: Box::new(source),
                    });
                }

                completed.insert(id.clone());
                ran.push(id);
            }
            pending = slots.into_iter().flatten().collect();

            if self.plugins.is_empty() {
                stuck = schedule.stuck;
                break;
            }
        }

        let stuck = StuckPlugins(stuck);
        if !stuck.is_empty() {
            tracing::warn!("{stuck}");
        }

        Ok(PluginRun { ran, stuck })
    }

    // Materialization

    /// Run plugins, open the glob gate and register everything with `runtime`
    ///
    /// Stuck plugins do not stop materialization; they are reported in the
    /// summary. Can only be called once, even when the first call failed.
    pub fn run<R>(&mut self, runtime: &mut R) -> Result<RunSummary, SwallowerError>
    where
        R: BuildRuntime,
    {
        if self.ran {
            return Err(SwallowerError::AlreadyRan);
        }

        self.ran = true;

        tracing::info!("Running {} queued plugins", self.plugins.len());
        let plugins = self.run_plugins()?;

        self.globs.ready();

        let (tasks_registered, task_sets_registered) = self.materialize(runtime)?;
        tracing::info!(
            "Registered {tasks_registered} tasks and {task_sets_registered} task sets"
        );

        Ok(RunSummary {
            plugins_run: plugins.ran,
            stuck: (!plugins.stuck.is_empty()).then_some(plugins.stuck),
            tasks_registered,
            task_sets_registered,
        })
    }

    /// Whether [`run`](Self::run) has been called
    pub fn has_run(&self) -> bool {
        self.ran
    }

    fn materialize<R>(&self, runtime: &mut R) -> Result<(usize, usize), SwallowerError>
    where
        R: BuildRuntime,
    {
        for (id, action) in self.tasks.iter() {
            runtime.register_task(id, BoundTask::new(Arc::clone(action), self.globs.clone()))?;
        }

        let mut registered_sets: HashSet<&str> = HashSet::new();
        for (set_id, mode, members) in self.task_sets.iter() {
            if let Some(unknown) = members
                .iter()
                .find(|member| !self.tasks.contains(member) && !registered_sets.contains(member.as_str()))
            {
                return Err(SwallowerError::UnknownTaskSetMember {
                    set: set_id.to_string(),
                    task: unknown.clone(),
                });
            }

            let unit = match mode {
                TaskSetMode::Series => runtime.series(members)?,
                TaskSetMode::Parallel => runtime.parallel(members)?,
            };
            runtime.register_unit(set_id, unit)?;
            registered_sets.insert(set_id);
        }

        Ok((self.tasks.len(), registered_sets.len()))
    }
}
