//! In-process runtime
//!
//! Runs registered tasks and task sets directly. Series units stop at the
//! first failure; parallel units run every member on its own scoped thread
//! and report the first failure in member order.
//!
//! Combinators bind their members when they are created, so registering a
//! unit under an existing name only affects units created afterwards.

use std::collections::HashMap;
use std::thread;

use super::BuildRuntime;
use crate::core::task::BoundTask;
use crate::error::RuntimeError;

/// Unit registered with a [`LocalRuntime`]
#[derive(Debug, Clone)]
pub enum LocalUnit {
    /// A single task
    Task(BoundTask),
    /// Members run one after another
    Series(Vec<(String, LocalUnit)>),
    /// Members run concurrently
    Parallel(Vec<(String, LocalUnit)>),
}

/// Runtime that executes units in-process
#[derive(Debug, Default)]
pub struct LocalRuntime {
    units: HashMap<String, LocalUnit>,
    order: Vec<String>,
}

impl LocalRuntime {
    /// Create an empty runtime
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Run a registered unit
    pub fn run(&self, name: &str) -> Result<(), RuntimeError> {
        let unit = self.units.get(name).ok_or_else(|| RuntimeError::UnknownTask {
            name: name.to_string(),
        })?;
        run_unit(name, unit)
    }

    fn insert(&mut self, name: &str, unit: LocalUnit) {
        if self.units.insert(name.to_string(), unit).is_none() {
            self.order.push(name.to_string());
        }
    }

    fn resolve(&self, tasks: &[String]) -> Result<Vec<(String, LocalUnit)>, RuntimeError> {
        tasks
            .iter()
            .map(|task| {
                let unit = self.units.get(task).ok_or_else(|| RuntimeError::UnknownTask {
                    name: task.clone(),
                })?;
                Ok((task.clone(), unit.clone()))
            })
            .collect()
    }
}

fn run_unit(name: &str, unit: &LocalUnit) -> Result<(), RuntimeError> {
    tracing::info!("Starting '{name}'");
    match unit {
        LocalUnit::Task(task) => task.run().map_err(|source| RuntimeError::TaskFailed {
            name: name.to_string(),
            source,
        })?,
        LocalUnit::Series(members) => {
            for (member, unit) in members {
                run_unit(member, unit)?;
            }
        }
        LocalUnit::Parallel(members) => run_parallel(members)?,
    }
    tracing::info!("Finished '{name}'");

    Ok(())
}

fn run_parallel(members: &[(String, LocalUnit)]) -> Result<(), RuntimeError> {
    thread::scope(|scope| {
        let handles: Vec<_> = members
            .iter()
            .map(|(member, unit)| (member, scope.spawn(move || run_unit(member, unit))))
            .collect();

        let mut first_error = None;
        for (member, handle) in handles {
            let result = handle.join().unwrap_or_else(|_| {
                Err(RuntimeError::Panicked {
                    name: member.clone(),
                })
            });
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    })
}

impl BuildRuntime for LocalRuntime {
    type Unit = LocalUnit;

    fn register_task(&mut self, name: &str, task: BoundTask) -> Result<(), RuntimeError> {
        self.insert(name, LocalUnit::Task(task));
        Ok(())
    }

    fn series(&mut self, tasks: &[String]) -> Result<Self::Unit, RuntimeError> {
        Ok(LocalUnit::Series(self.resolve(tasks)?))
    }

    fn parallel(&mut self, tasks: &[String]) -> Result<Self::Unit, RuntimeError> {
        Ok(LocalUnit::Parallel(self.resolve(tasks)?))
    }

    fn register_unit(&mut self, name: &str, unit: Self::Unit) -> Result<(), RuntimeError> {
        self.insert(name, unit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gate::GlobSetGetter;
    use crate::core::task::action;
    use crate::error::TaskError;
    use std::sync::{Arc, Mutex};

    fn recording_task(log: &Arc<Mutex<Vec<String>>>, name: &str) -> BoundTask {
        let log = Arc::clone(log);
        let name = name.to_string();
        BoundTask::new(
            Arc::from(action(move |_| {
                log.lock().unwrap().push(name.clone());
                Ok(())
            })),
            GlobSetGetter::new(),
        )
    }

    fn failing_task(message: &str) -> BoundTask {
        let message = message.to_string();
        BoundTask::new(
            Arc::from(action(move |_| Err(TaskError::Failed(message.clone())))),
            GlobSetGetter::new(),
        )
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_series_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = LocalRuntime::new();
        runtime.register_task("a", recording_task(&log, "a")).unwrap();
        runtime.register_task("b", recording_task(&log, "b")).unwrap();
        let unit = runtime.series(&names(&["b", "a", "b"])).unwrap();
        runtime.register_unit("all", unit).unwrap();

        runtime.run("all").unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["b", "a", "b"]);
    }

    #[test]
    fn test_series_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = LocalRuntime::new();
        runtime.register_task("bad", failing_task("boom")).unwrap();
        runtime.register_task("after", recording_task(&log, "after")).unwrap();
        let unit = runtime.series(&names(&["bad", "after"])).unwrap();
        runtime.register_unit("all", unit).unwrap();

        let err = runtime.run("all").unwrap_err();

        assert!(matches!(err, RuntimeError::TaskFailed { ref name, .. } if name == "bad"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parallel_runs_every_member() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = LocalRuntime::new();
        runtime.register_task("bad", failing_task("boom")).unwrap();
        runtime.register_task("x", recording_task(&log, "x")).unwrap();
        runtime.register_task("y", recording_task(&log, "y")).unwrap();
        let unit = runtime.parallel(&names(&["x", "bad", "y"])).unwrap();
        runtime.register_unit("all", unit).unwrap();

        assert!(runtime.run("all").is_err());

        let mut ran = log.lock().unwrap().clone();
        ran.sort();
        assert_eq!(ran, vec!["x", "y"]);
    }

    #[test]
    fn test_combinator_rejects_unknown_names() {
        let mut runtime = LocalRuntime::new();
        let err = runtime.series(&names(&["ghost"])).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownTask { ref name } if name == "ghost"));
    }

    #[test]
    fn test_set_named_like_its_member_runs_the_task() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = LocalRuntime::new();
        runtime.register_task("build", recording_task(&log, "build")).unwrap();
        let unit = runtime.series(&names(&["build"])).unwrap();
        runtime.register_unit("build", unit).unwrap();

        runtime.run("build").unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["build"]);
        assert_eq!(runtime.names(), ["build"]);
    }

    #[test]
    fn test_units_bind_members_at_creation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = LocalRuntime::new();
        runtime.register_task("a", recording_task(&log, "old")).unwrap();
        let unit = runtime.parallel(&names(&["a"])).unwrap();
        runtime.register_unit("all", unit).unwrap();
        runtime.register_task("a", recording_task(&log, "new")).unwrap();

        runtime.run("all").unwrap();
        runtime.run("a").unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["old", "new"]);
    }

    #[test]
    fn test_run_unknown_name() {
        let runtime = LocalRuntime::new();
        assert!(runtime.run("nothing").is_err());
        assert!(!runtime.contains("nothing"));
    }
}
