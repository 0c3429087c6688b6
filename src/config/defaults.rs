//! Default configuration values

/// Manifest file looked up in the working directory
pub const DEFAULT_MANIFEST: &str = "swallower.toml";

/// Stuck plugins are reported but do not fail a run
pub const DEFAULT_STRICT: bool = false;

/// Deepest `extends` chain accepted when loading a manifest
pub const MAX_EXTENDS_DEPTH: usize = 8;

/// Task set run when `swallower run` is given no target
pub const DEFAULT_TARGET: &str = "default";
