//! Stored credential lookup.
//!
//! Credentials are only ever read here; storing them is someone else's job.
//! Sources:
//! - [`SystemKeychain`] - macOS Keychain, Windows Credential Manager,
//!   Linux Secret Service
//! - [`EnvCredentials`] - environment variables, for headless runs
//! - [`StaticCredentials`] - in-memory values, for embedding and tests
//! - [`CredentialChain`] - first source that has a value wins

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use crate::error::KeychainError;

/// Keychain service name for crono credentials.
const SERVICE_NAME: &str = "crono";

/// Prefix for credential environment variables.
const ENV_PREFIX: &str = "CRONO_";

/// Well-known credential keys.
pub mod keys {
    /// Account username (e-mail).
    pub const USERNAME: &str = "cronometer-username";
    /// Account password.
    pub const PASSWORD: &str = "cronometer-password";
}

// ============================================================================
// Credential Source Trait
// ============================================================================

/// Read-only access to stored credentials, by key.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Looks up a credential.
    ///
    /// # Returns
    /// * `Ok(Some(secret))` - Credential found and non-empty
    /// * `Ok(None)` - Credential not found
    /// * `Err(e)` - The source itself failed
    async fn get(&self, key: &str) -> Result<Option<String>, KeychainError>;

    /// Check if a credential exists.
    async fn exists(&self, key: &str) -> bool {
        matches!(self.get(key).await, Ok(Some(_)))
    }
}

// ============================================================================
// System Keychain
// ============================================================================

/// Credentials stored in the system keychain under the `crono` service.
#[derive(Debug, Clone)]
pub struct SystemKeychain {
    service: String,
}

impl SystemKeychain {
    /// Creates a keychain source for the default service.
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Creates a keychain source for a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service, key).map_err(|e| KeychainError::Platform(e.to_string()))
    }
}

impl Default for SystemKeychain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialSource for SystemKeychain {
    async fn get(&self, key: &str) -> Result<Option<String>, KeychainError> {
        debug!(service = %self.service, key = %key, "Getting credential from keychain");

        match self.entry(key)?.get_password() {
            Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
            Ok(_) | Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, key = %key, "Credential not found");
                Ok(None)
            }
            Err(e) => {
                warn!(service = %self.service, key = %key, error = %e, "Failed to get credential");
                Err(e.into())
            }
        }
    }
}

// ============================================================================
// Environment Credentials
// ============================================================================

/// Credentials read from environment variables.
///
/// `cronometer-username` is read from `CRONO_CRONOMETER_USERNAME`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Environment variable name for a credential key.
    pub fn var_name(key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{ENV_PREFIX}{suffix}")
    }
}

#[async_trait]
impl CredentialSource for EnvCredentials {
    async fn get(&self, key: &str) -> Result<Option<String>, KeychainError> {
        Ok(std::env::var(Self::var_name(key))
            .ok()
            .filter(|v| !v.is_empty()))
    }
}

// ============================================================================
// Static Credentials
// ============================================================================

/// Fixed in-memory credentials.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source holding a username and password.
    pub fn username_password(username: &str, password: &str) -> Self {
        Self::new()
            .with(keys::USERNAME, username)
            .with(keys::PASSWORD, password)
    }

    /// Adds a credential.
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn get(&self, key: &str) -> Result<Option<String>, KeychainError> {
        Ok(self.values.get(key).filter(|v| !v.is_empty()).cloned())
    }
}

// ============================================================================
// Credential Chain
// ============================================================================

/// Tries each source in order; the first value found wins.
#[derive(Clone, Default)]
pub struct CredentialChain {
    sources: Vec<Arc<dyn CredentialSource>>,
}

impl CredentialChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source.
    #[must_use]
    pub fn with(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.sources.push(source);
        self
    }
}

#[async_trait]
impl CredentialSource for CredentialChain {
    async fn get(&self, key: &str) -> Result<Option<String>, KeychainError> {
        let mut last_error = None;
        for source in &self.sources {
            match source.get(key).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Credential source failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        last_error.map_or(Ok(None), Err)
    }
}

// ============================================================================
// Tests
// ============================================================================
