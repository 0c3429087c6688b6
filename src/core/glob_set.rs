//! Glob set registry
//!
//! Stores named, ordered lists of glob patterns. Input may be a single
//! pattern or an arbitrarily nested list; stored sets are always flat with
//! duplicates removed and first-occurrence order preserved.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A single glob pattern or an arbitrarily nested list of patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    /// One pattern
    One(String),
    /// Nested list of patterns
    Many(Vec<Patterns>),
}

impl Patterns {
    /// Empty pattern list
    pub fn empty() -> Self {
        Self::Many(Vec::new())
    }

    fn flatten_into(self, out: &mut Vec<String>) {
        match self {
            Self::One(pattern) => out.push(pattern),
            Self::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

impl Default for Patterns {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Patterns {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_string())
    }
}

impl From<String> for Patterns {
    fn from(pattern: String) -> Self {
        Self::One(pattern)
    }
}

impl From<&String> for Patterns {
    fn from(pattern: &String) -> Self {
        Self::One(pattern.clone())
    }
}

impl<T: Into<Patterns>> From<Vec<T>> for Patterns {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Patterns>, const N: usize> From<[T; N]> for Patterns {
    fn from(items: [T; N]) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl From<&[String]> for Patterns {
    fn from(items: &[String]) -> Self {
        Self::Many(items.iter().map(Into::into).collect())
    }
}

/// Flatten nested patterns and drop duplicates, keeping first occurrences
pub fn flatten_unique(patterns: impl Into<Patterns>) -> Vec<String> {
    let mut flat = Vec::new();
    patterns.into().flatten_into(&mut flat);

    let mut seen = HashSet::new();
    flat.retain(|pattern| seen.insert(pattern.clone()));
    flat
}

/// A glob set paired with its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedGlobSet {
    /// Glob set name
    pub name: String,
    /// Patterns to register or append
    pub glob_set: Patterns,
}

impl NamedGlobSet {
    /// Create a named glob set
    pub fn new(name: impl Into<String>, glob_set: impl Into<Patterns>) -> Self {
        Self {
            name: name.into(),
            glob_set: glob_set.into(),
        }
    }
}

/// Named glob sets, iterated in first-registration order
#[derive(Debug, Clone, Default)]
pub struct GlobSets {
    order: Vec<String>,
    sets: HashMap<String, Vec<String>>,
}

impl GlobSets {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `patterns` under `id`, replacing any previous value
    pub fn register(&mut self, id: &str, patterns: impl Into<Patterns>) {
        let globs = flatten_unique(patterns);

        if self.sets.insert(id.to_string(), globs).is_some() {
            tracing::debug!("Replaced glob set '{id}'");
        } else {
            self.order.push(id.to_string());
            tracing::debug!("Registered glob set '{id}'");
        }
    }

    /// Append `patterns` to the set stored under `id`, creating it if needed
    ///
    /// Equivalent to registering the concatenation of the existing set and the
    /// new patterns, so patterns already present keep their position.
    pub fn extend(&mut self, id: &str, patterns: impl Into<Patterns>) {
        let existing = self.sets.get(id).cloned().unwrap_or_default();
        self.register(id, Patterns::Many(vec![existing.into(), patterns.into()]));
    }

    /// Get a stored glob set
    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.sets.get(id).map(Vec::as_slice)
    }

    /// Check whether a glob set exists
    pub fn contains(&self, id: &str) -> bool {
        self.sets.contains_key(id)
    }

    /// Iterate glob sets in first-registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order
            .iter()
            .filter_map(|id| self.sets.get(id).map(|globs| (id.as_str(), globs.as_slice())))
    }

    /// Number of glob sets
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if there are no glob sets
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
