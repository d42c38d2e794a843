//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Settings stored with the project
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$BRANCHVAULT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/branchvault/config.toml`
//! 3. `~/.branchvault/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use branchvault::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/srv/vault/web"))).unwrap();
//! println!("Compression: {:?}", config.compression());
//! println!("Promoted suffix: {}", config.promoted_suffix());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, ProjectConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::codec::CompressionKind;
use crate::core::ops::durable;
use crate::locks::UnlockBehavior;

/// Default suffix for promoted files that collide with uncontrolled ones.
pub const DEFAULT_PROMOTED_SUFFIX: &str = "-promoted";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules. Project config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Project configuration (if a project root was given)
    pub project: Option<ProjectConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_root` is provided, also loads `<root>/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(project_root: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = Self::load_global()?;
        global.validate()?;

        let project = match project_root {
            Some(root) => {
                let path = Self::project_config_path(root);
                if path.exists() {
                    let cfg: ProjectConfig = read_toml(&path)?;
                    cfg.validate()?;
                    Some(cfg)
                } else {
                    None
                }
            }
            None => None,
        };

        Ok(Config {
            global,
            project,
            global_path,
        })
    }

    /// Configuration with only the given project settings (no global file).
    pub fn for_project(project: ProjectConfig) -> Self {
        Config {
            global: GlobalConfig::default(),
            project: Some(project),
            global_path: None,
        }
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        for path in Self::global_candidates() {
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }
        Ok((GlobalConfig::default(), None))
    }

    fn global_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("BRANCHVAULT_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("branchvault/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".branchvault/config.toml"));
        }
        candidates
    }

    /// Canonical path of a project's config file.
    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join("config.toml")
    }

    /// Write project config atomically.
    pub fn write_project(
        project_root: &Path,
        config: &ProjectConfig,
    ) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::project_config_path(project_root);
        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        durable::write_atomic(&path, contents.as_bytes()).map_err(|e| {
            ConfigError::WriteError {
                path: path.clone(),
                source: e,
            }
        })?;
        Ok(path)
    }

    /// Path of the global config file that was loaded, if any.
    pub fn global_path(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Configured user name.
    pub fn user(&self) -> Option<&str> {
        self.global.user.as_deref()
    }

    /// Configured default project root.
    pub fn default_project(&self) -> Option<&Path> {
        self.global.default_project.as_deref()
    }

    /// Compression for stored revisions (default: LZ4).
    pub fn compression(&self) -> CompressionKind {
        self.project
            .as_ref()
            .and_then(|p| p.compression)
            .unwrap_or(CompressionKind::Lz4)
    }

    /// Unlock behavior (default: just unlock).
    pub fn unlock_behavior(&self) -> UnlockBehavior {
        self.project
            .as_ref()
            .and_then(|p| p.unlock_behavior)
            .unwrap_or(UnlockBehavior::JustUnlock)
    }

    /// Default `require_lock` attribute for new archives (default: false).
    pub fn require_lock(&self) -> bool {
        self.project
            .as_ref()
            .and_then(|p| p.require_lock)
            .unwrap_or(false)
    }

    /// Suffix for colliding promoted files.
    pub fn promoted_suffix(&self) -> &str {
        self.project
            .as_ref()
            .and_then(|p| p.promoted_suffix.as_deref())
            .unwrap_or(DEFAULT_PROMOTED_SUFFIX)
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
