//! Platform-specific directory management
//!
//! Follows the XDG Base Directory Specification on Linux and standard
//! locations on macOS. `SWALLOWER_CONFIG_DIR` overrides the config directory.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "SWALLOWER_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "swallower";

/// Platform-specific directory provider for swallower
#[derive(Debug, Clone)]
pub struct SwallowerDirs {
    config_dir: PathBuf,
}

impl SwallowerDirs {
    /// Create a new `SwallowerDirs` instance
    ///
    /// Checks the environment first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/swallower` or `~/.config/swallower`
    /// - macOS: `~/Library/Application Support/swallower`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for SwallowerDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_not_empty() {
        let dirs = SwallowerDirs::new();
        assert!(!dirs.config_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_global_config_path_is_under_config_dir() {
        let dirs = SwallowerDirs::new();
        assert!(dirs.global_config_path().starts_with(dirs.config_dir()));
        assert!(dirs.global_config_path().ends_with("config.toml"));
    }
}
