//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory holding a manifest and an isolated global
/// config directory.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a test project with `swallower.toml` set to `manifest`
    pub fn with_manifest(manifest: &str) -> Self {
        let project = Self::new();
        project.create_file("swallower.toml", manifest);
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Run the swallower binary in the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_swallower"))
            .current_dir(self.path())
            .env("SWALLOWER_CONFIG_DIR", self.path().join(".config"))
            .env_remove("SWALLOWER_MANIFEST")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute swallower")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard output of a finished command as text
#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Standard error of a finished command as text
#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Manifest with a core plugin, a dependent plugin and an ordered task set
#[allow(dead_code)]
pub const SAMPLE_MANIFEST: &str = r#"
[glob_sets]
scripts = ["src/**/*.js", ["lib/**/*.js", "src/**/*.js"]]

[[tasks]]
name = "lint"
template = "list-globs"
options = { glob_sets = ["scripts"] }

[[tasks]]
name = "build"
template = "list-globs"
options = { glob_sets = ["styles"] }

[[task_sets]]
name = "default"
mode = "series"
tasks = ["lint", "build"]

[[plugins]]
id = "docs"
requires = ["styles"]
extend_glob_sets = { scripts = "docs/**/*.js" }

[[plugins.tasks]]
name = "docs"
template = "list-globs"
options = { glob_sets = ["scripts", "styles"] }

[[plugins.task_sets]]
name = "default"
task = "docs"
before = ["lint"]
after = ["build"]

[[plugins]]
id = "styles"
glob_sets = { styles = ["src/**/*.css"] }
"#;
