//! Configuration management.
//!
//! The config file is shared with other crono tools, so keys this crate
//! does not know about are carried through a load/save cycle untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json, remove_file_if_exists, save_json};

/// Longest accepted request timeout.
const MAX_TIMEOUT_SECS: u64 = 600;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// GWT permutation override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gwt_permutation: Option<String>,
    /// GWT header override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gwt_header: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Keys owned by other tools.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads configuration from a specific path. A missing file yields defaults.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        match load_json::<Self>(path).await {
            Ok(config) => {
                config.validate()?;
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Saves configuration to the default path.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path()).await
    }

    /// Saves configuration to a specific path.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        self.validate()?;
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Deletes the config file at `path`. Returns false if there was none.
    pub async fn remove_at(path: &Path) -> Result<bool, StoreError> {
        let removed = remove_file_if_exists(path).await?;
        if removed {
            info!(path = %path.display(), "Removed configuration");
        }
        Ok(removed)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(secs) = self.timeout_secs {
            if secs == 0 || secs > MAX_TIMEOUT_SECS {
                return Err(StoreError::Config(format!(
                    "timeoutSecs must be between 1 and {MAX_TIMEOUT_SECS}, got {secs}"
                )));
            }
        }
        Ok(())
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Stores GWT overrides. `None` leaves a value unchanged, an empty
    /// string clears it.
    pub fn set_gwt(&mut self, permutation: Option<&str>, header: Option<&str>) {
        if let Some(p) = permutation {
            self.gwt_permutation = non_empty(p);
        }
        if let Some(h) = header {
            self.gwt_header = non_empty(h);
        }
    }

    /// Clears both GWT overrides.
    pub fn clear_gwt(&mut self) {
        self.gwt_permutation = None;
        self.gwt_header = None;
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ============================================================================
// Tests
// ============================================================================
