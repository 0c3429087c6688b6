//! Infrastructure layer
//!
//! Platform-specific paths. Process spawning lives with the task templates
//! that need it.

pub mod dirs;
