//! Ordered task sets
//!
//! A task set is a named, ordered list of task ids that materializes as a
//! single series or parallel unit. Tasks are added one at a time with
//! optional ordering constraints relative to tasks already in the set.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TaskSetError;

/// How the members of a task set are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSetMode {
    /// Run members one after another
    Series,
    /// Run members concurrently
    Parallel,
}

impl fmt::Display for TaskSetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Series => write!(f, "series"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for TaskSetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "series" => Ok(Self::Series),
            "parallel" => Ok(Self::Parallel),
            other => Err(format!(
                "Unknown task set mode '{other}' (expected 'series' or 'parallel')"
            )),
        }
    }
}

/// Ordering constraints for a task being added to a set
///
/// Tasks listed in `before` that are already in the set must end up ahead of
/// the new task; tasks listed in `after` must end up behind it. Tasks that
/// are not in the set are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPosition {
    /// Tasks that must run before the new task
    #[serde(default)]
    pub before: Vec<String>,
    /// Tasks that must run after the new task
    #[serde(default)]
    pub after: Vec<String>,
}

impl OrderPosition {
    /// No constraints
    pub fn none() -> Self {
        Self::default()
    }

    /// Place the new task behind these tasks
    #[must_use]
    pub fn before<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.extend(tasks.into_iter().map(Into::into));
        self
    }

    /// Place the new task ahead of these tasks
    #[must_use]
    pub fn after<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(tasks.into_iter().map(Into::into));
        self
    }

    /// Whether no constraint was given
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Named task sets, iterated in creation order
#[derive(Debug, Clone, Default)]
pub struct TaskSets {
    order: Vec<String>,
    members: HashMap<String, Vec<String>>,
    modes: HashMap<String, TaskSetMode>,
}

impl TaskSets {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `task_id` to `set_id`, creating the set if needed
    ///
    /// The set's mode is recorded whether or not the insertion succeeds.
    /// On error the set is left unchanged.
    pub fn insert(
        &mut self,
        set_id: &str,
        mode: TaskSetMode,
        task_id: &str,
        position: &OrderPosition,
    ) -> Result<(), TaskSetError> {
        if let Some(previous) = self.modes.insert(set_id.to_string(), mode) {
            if previous != mode {
                tracing::debug!("Task set '{set_id}' mode changed from {previous} to {mode}");
            }
        }

        let Some(members) = self.members.get_mut(set_id) else {
            if !position.is_empty() {
                return Err(TaskSetError::ConstraintsOnMissingSet {
                    set: set_id.to_string(),
                    task: task_id.to_string(),
                });
            }

            self.order.push(set_id.to_string());
            self.members
                .insert(set_id.to_string(), vec![task_id.to_string()]);
            tracing::debug!("Created task set '{set_id}' ({mode}) with '{task_id}'");
            return Ok(());
        };

        let index = insertion_index(members, position).map_err(|(last_before, first_after)| {
            TaskSetError::OrderingConflict {
                set: set_id.to_string(),
                task: task_id.to_string(),
                last_before,
                first_after,
            }
        })?;

        members.insert(index, task_id.to_string());
        tracing::debug!("Inserted '{task_id}' into task set '{set_id}' at {index}");
        Ok(())
    }

    /// Members of a task set
    pub fn get(&self, set_id: &str) -> Option<&[String]> {
        self.members.get(set_id).map(Vec::as_slice)
    }

    /// Recorded mode of a task set
    ///
    /// A mode can be recorded for a set that was never created, when the
    /// insertion that named it was rejected.
    pub fn mode(&self, set_id: &str) -> Option<TaskSetMode> {
        self.modes.get(set_id).copied()
    }

    /// Check whether a task set exists
    pub fn contains(&self, set_id: &str) -> bool {
        self.members.contains_key(set_id)
    }

    /// Iterate created task sets in creation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, TaskSetMode, &[String])> {
        self.order.iter().filter_map(|id| {
            let members = self.members.get(id)?;
            let mode = self.modes.get(id).copied().unwrap_or(TaskSetMode::Series);
            Some((id.as_str(), mode, members.as_slice()))
        })
    }

    /// Number of created task sets
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if no task set has been created
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Compute where a new task goes in `members`
///
/// Returns the `(last_before, first_after)` pair when the constraints
/// contradict each other.
fn insertion_index(
    members: &[String],
    position: &OrderPosition,
) -> Result<usize, (isize, usize)> {
    let index_of = |task: &String| members.iter().position(|member| member == task);

    let last_before = position
        .before
        .iter()
        .filter_map(index_of)
        .max()
        .map_or(-1, |index| index as isize);

    let first_after = position
        .after
        .iter()
        .filter_map(index_of)
        .min()
        .unwrap_or(members.len());

    if last_before >= first_after as isize {
        Err((last_before, first_after))
    } else {
        Ok(first_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set_with(members: &[&str]) -> TaskSets {
        let mut sets = TaskSets::new();
        for member in members {
            sets.insert("build", TaskSetMode::Series, member, &OrderPosition::none())
                .unwrap();
        }
        sets
    }

    #[test]
    fn test_mode_display_and_parse() {
        assert_eq!(TaskSetMode::Series.to_string(), "series");
        assert_eq!("parallel".parse::<TaskSetMode>(), Ok(TaskSetMode::Parallel));
        assert!("sideways".parse::<TaskSetMode>().is_err());
    }

    #[test]
    fn test_new_set_without_constraints_is_singleton() {
        let mut sets = TaskSets::new();
        sets.insert("default", TaskSetMode::Parallel, "lint", &OrderPosition::none())
            .unwrap();

        assert_eq!(sets.get("default").unwrap(), ["lint"]);
        assert_eq!(sets.mode("default"), Some(TaskSetMode::Parallel));
    }

    #[test]
    fn test_new_set_with_constraints_is_rejected() {
        let mut sets = TaskSets::new();
        let result = sets.insert(
            "default",
            TaskSetMode::Series,
            "lint",
            &OrderPosition::none().after(["build"]),
        );

        assert!(matches!(
            result,
            Err(TaskSetError::ConstraintsOnMissingSet { .. })
        ));
        assert!(sets.get("default").is_none());
        assert!(sets.is_empty());
        // The mode is still recorded.
        assert_eq!(sets.mode("default"), Some(TaskSetMode::Series));
    }

    #[test]
    fn test_unconstrained_insert_appends() {
        let sets = set_with(&["a", "b", "c"]);
        assert_eq!(sets.get("build").unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn test_after_places_task_ahead_of_named_task() {
        let mut sets = set_with(&["A", "X", "B"]);
        sets.insert(
            "build",
            TaskSetMode::Series,
            "new",
            &OrderPosition::none().after(["X"]),
        )
        .unwrap();

        assert_eq!(sets.get("build").unwrap(), ["A", "new", "X", "B"]);
    }

    #[test]
    fn test_before_alone_appends_at_end() {
        let mut sets = set_with(&["A", "B"]);
        sets.insert(
            "build",
            TaskSetMode::Series,
            "new",
            &OrderPosition::none().before(["A"]),
        )
        .unwrap();

        assert_eq!(sets.get("build").unwrap(), ["A", "B", "new"]);
    }

    #[test]
    fn test_before_and_after_between() {
        let mut sets = set_with(&["A", "B", "C"]);
        sets.insert(
            "build",
            TaskSetMode::Series,
            "new",
            &OrderPosition::none().before(["A"]).after(["C", "B"]),
        )
        .unwrap();

        assert_eq!(sets.get("build").unwrap(), ["A", "new", "B", "C"]);
    }

    #[test]
    fn test_contradictory_constraints_are_rejected() {
        let mut sets = set_with(&["A", "B"]);
        let result = sets.insert(
            "build",
            TaskSetMode::Series,
            "new",
            &OrderPosition::none().before(["B"]).after(["A"]),
        );

        assert_eq!(
            result,
            Err(TaskSetError::OrderingConflict {
                set: "build".to_string(),
                task: "new".to_string(),
                last_before: 1,
                first_after: 0,
            })
        );
        assert_eq!(sets.get("build").unwrap(), ["A", "B"]);
    }

    #[test]
    fn test_missing_constraint_tasks_are_ignored() {
        let mut sets = set_with(&["A", "B"]);
        sets.insert(
            "build",
            TaskSetMode::Series,
            "new",
            &OrderPosition::none().before(["ghost"]).after(["phantom"]),
        )
        .unwrap();

        assert_eq!(sets.get("build").unwrap(), ["A", "B", "new"]);
    }

    #[test]
    fn test_mode_overwritten_even_on_rejection() {
        let mut sets = set_with(&["A", "B"]);
        let _ = sets.insert(
            "build",
            TaskSetMode::Parallel,
            "new",
            &OrderPosition::none().before(["B"]).after(["A"]),
        );

        assert_eq!(sets.mode("build"), Some(TaskSetMode::Parallel));
    }

    #[test]
    fn test_iter_in_creation_order() {
        let mut sets = TaskSets::new();
        sets.insert("z", TaskSetMode::Series, "a", &OrderPosition::none()).unwrap();
        sets.insert("m", TaskSetMode::Parallel, "b", &OrderPosition::none()).unwrap();
        sets.insert("z", TaskSetMode::Series, "c", &OrderPosition::none()).unwrap();

        let listed: Vec<(&str, TaskSetMode)> = sets.iter().map(|(id, mode, _)| (id, mode)).collect();
        assert_eq!(
            listed,
            vec![("z", TaskSetMode::Series), ("m", TaskSetMode::Parallel)]
        );
    }

    fn member_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set("[a-f]", 0..6).prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_insert_respects_constraints_or_leaves_set_unchanged(
            members in member_names(),
            before in prop::collection::vec("[a-h]", 0..3),
            after in prop::collection::vec("[a-h]", 0..3),
        ) {
            let mut sets = TaskSets::new();
            for member in &members {
                sets.insert("s", TaskSetMode::Series, member, &OrderPosition::none()).unwrap();
            }
            let unchanged = sets.get("s").map(<[String]>::to_vec);
            let position = OrderPosition { before: before.clone(), after: after.clone() };

            match sets.insert("s", TaskSetMode::Series, "NEW", &position) {
                Ok(()) => {
                    let result = sets.get("s").unwrap();
                    let new_index = result.iter().position(|t| t == "NEW").unwrap();
                    for (index, task) in result.iter().enumerate() {
                        if before.contains(task) {
                            prop_assert!(index < new_index);
                        }
                        if after.contains(task) {
                            prop_assert!(index > new_index);
                        }
                    }
                }
                Err(_) => prop_assert_eq!(sets.get("s").map(<[String]>::to_vec), unchanged),
            }
        }
    }
}
