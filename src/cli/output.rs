//! Output formatting
//!
//! Status prefixes, JSON printing and error display for the command line.

use anyhow::Result;
use serde::Serialize;

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Output settings derived from command-line flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Print machine-readable JSON
    pub json: bool,
    /// Verbosity level (`-v` count)
    pub verbose: u8,
}

impl OutputConfig {
    /// Create output settings
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Default log filter directive for these settings
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error and its causes on stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}
