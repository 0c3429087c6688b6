//! Gated glob set access
//!
//! Task actions read glob sets through a [`GlobSetGetter`]. Until
//! [`GlobSetGetter::ready`] has been called every lookup reports
//! [`GlobLookup::NotAvailable`], so nothing can observe a glob set while
//! plugins are still composing it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::glob_set::GlobSets;

/// Result of a gated glob set lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobLookup {
    /// The gate has not been opened yet
    NotAvailable,
    /// The gate is open but no glob set has this id
    NotFound,
    /// Copy of the registered patterns
    Found(Vec<String>),
}

impl GlobLookup {
    /// Patterns if the lookup succeeded
    pub fn found(self) -> Option<Vec<String>> {
        match self {
            Self::Found(globs) => Some(globs),
            Self::NotAvailable | Self::NotFound => None,
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    globs: GlobSets,
    ready: bool,
}

/// Shared handle to the glob sets and the gate flag
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct GlobSetGetter {
    state: Arc<RwLock<GateState>>,
}

impl GlobSetGetter {
    /// Create a closed gate over an empty glob set registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a glob set, honouring the gate
    pub fn get_glob_set(&self, id: &str) -> GlobLookup {
        let state = self.read();
        if !state.ready {
            return GlobLookup::NotAvailable;
        }

        match state.globs.get(id) {
            Some(globs) => GlobLookup::Found(globs.to_vec()),
            None => GlobLookup::NotFound,
        }
    }

    /// Whether the gate is open
    pub fn state(&self) -> bool {
        self.read().ready
    }

    /// Open the gate. Calling this again has no effect.
    pub fn ready(&self) {
        let mut state = self.write();
        if !state.ready {
            state.ready = true;
            tracing::debug!("Glob sets are ready");
        }
    }

    /// Read the underlying registry, bypassing the gate
    pub(crate) fn with_globs<R>(&self, f: impl FnOnce(&GlobSets) -> R) -> R {
        f(&self.read().globs)
    }

    /// Mutate the underlying registry
    pub(crate) fn with_globs_mut<R>(&self, f: impl FnOnce(&mut GlobSets) -> R) -> R {
        f(&mut self.write().globs)
    }

    // Nothing under this lock can be left half-written, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, GateState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GateState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
