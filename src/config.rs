//! Configuration management for machina
//!
//! Collects the global flags and the `MACHINA_*` process variables into one
//! validated structure.

use crate::{cli::GlobalArgs, error::MachinaError};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

/// Overrides the working directory the project is searched from
pub const CWD_VAR: &str = "MACHINA_CWD";
/// Overrides the name of the project manifest
pub const PROJECT_FILE_VAR: &str = "MACHINA_PROJECT_FILE";
/// Overrides the default provider of every project
pub const DEFAULT_PROVIDER_VAR: &str = "MACHINA_DEFAULT_PROVIDER";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// Directory the project root is searched from
    pub cwd: PathBuf,
    /// File name that marks a project root
    pub project_file: String,
    /// Per-project data directory, relative to the root
    pub data_dir_name: String,
    /// Provider forced for every project, ahead of the manifest's own default
    pub default_provider: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            cwd: PathBuf::from("."),
            project_file: "Machinefile".to_string(),
            data_dir_name: ".machina".to_string(),
            default_provider: None,
        }
    }
}

impl Config {
    /// Create configuration from the global flags and process environment
    pub fn from_globals(args: &GlobalArgs) -> Result<Self, MachinaError> {
        let cwd = match env::var(CWD_VAR) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => env::current_dir().map_err(|e| MachinaError::file_system("getcwd", ".", e))?,
        };

        let mut config = Self {
            debug: args.debug,
            cwd,
            ..Self::default()
        };

        if let Ok(file) = env::var(PROJECT_FILE_VAR) {
            if !file.trim().is_empty() {
                config.project_file = file.trim().to_string();
            }
        }

        config.default_provider = env::var(DEFAULT_PROVIDER_VAR)
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Configuration rooted at `cwd` with every other field defaulted
    pub fn for_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), MachinaError> {
        if !self.cwd.is_dir() {
            return Err(MachinaError::config(format!(
                "Working directory not found: {}",
                self.cwd.display()
            )));
        }

        if self.project_file.contains(['/', '\\']) {
            return Err(MachinaError::config(format!(
                "Project file must be a plain file name, got '{}'",
                self.project_file
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.project_file, "Machinefile");
        assert_eq!(config.data_dir_name, ".machina");
        assert!(config.default_provider.is_none());
    }

    #[test]
    fn test_validate_missing_cwd() {
        let config = Config::for_dir("/definitely/not/a/real/dir");
        assert!(matches!(config.validate(), Err(MachinaError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_project_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            project_file: "sub/Machinefile".to_string(),
            ..Config::for_dir(temp_dir.path())
        };
        assert!(config.validate().is_err());
    }
}
