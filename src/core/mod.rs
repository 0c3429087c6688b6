//! Core business logic module
//!
//! # Submodules
//!
//! - [`glob_set`] - Named glob set registry
//! - [`gate`] - Gated glob set access for task actions
//! - [`task`] - Task templates, actions and definitions
//! - [`task_set`] - Ordered task set insertion
//! - [`plugin`] - Plugin contract and queue
//! - [`scheduler`] - Plugin dependency ordering
//! - [`swallower`] - The registry and its materialization
//! - [`templates`] - Built-in task templates
//! - [`manifest`] - Manifest (swallower.toml) parsing and application
//! - [`check`] - Manifest validation
//! - [`global_config`] - Global configuration management

pub mod check;
pub mod gate;
pub mod glob_set;
pub mod global_config;
pub mod manifest;
pub mod plugin;
pub mod scheduler;
pub mod swallower;
pub mod task;
pub mod task_set;
pub mod templates;
