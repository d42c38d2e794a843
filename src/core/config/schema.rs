//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$BRANCHVAULT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/branchvault/config.toml`
//! 3. `~/.branchvault/config.toml`
//!
//! # Project Config
//!
//! Located at `<project root>/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing; unknown keys are rejected
//! during parsing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::codec::CompressionKind;
use crate::core::types::UserName;
use crate::locks::UnlockBehavior;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// user = "ann"
/// default_project = "/srv/vault/web"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// User name recorded on checkins, locks and labels
    pub user: Option<String>,

    /// Project root used when none is given on the command line
    pub default_project: Option<PathBuf>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(user) = &self.user {
            UserName::new(user.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("invalid user: {e}")))?;
        }
        if let Some(project) = &self.default_project {
            if project.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_project cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Project configuration.
///
/// # Example
///
/// ```toml
/// compression = "lz4"
/// unlock_behavior = "unlock_and_restore_timestamp"
/// require_lock = true
/// promoted_suffix = "-promoted"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Compression applied to stored revisions
    pub compression: Option<CompressionKind>,

    /// Working-copy action reported when a lock is released
    pub unlock_behavior: Option<UnlockBehavior>,

    /// Default `require_lock` attribute for new archives
    pub require_lock: Option<bool>,

    /// Suffix used when a promoted file collides with an uncontrolled one
    pub promoted_suffix: Option<String>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(suffix) = &self.promoted_suffix {
            if suffix.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "promoted_suffix cannot be empty".to_string(),
                ));
            }
            if suffix.contains(['/', '\\']) {
                return Err(ConfigError::InvalidValue(format!(
                    "promoted_suffix '{suffix}' cannot contain path separators"
                )));
            }
        }
        Ok(())
    }
}
