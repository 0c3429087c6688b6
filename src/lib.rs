//! Swallower - plugin-driven build task registry
//!
//! Collects named glob sets, tasks rendered from templates and ordered task
//! sets, lets plugins extend them in dependency order, and finally hands the
//! result to a host build runtime.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Registry, scheduling and manifest logic
//! - [`runtime`] - Build runtime contract and the bundled runtimes
//! - [`infra`] - Infrastructure layer (platform directories)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
pub mod runtime;

pub use crate::core::swallower::{RunSummary, Swallower};
pub use crate::error::SwallowerError;
