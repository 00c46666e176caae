//! Protocol constant overrides.
//!
//! The GWT permutation and header can be overridden from the environment or
//! the config file. The environment wins; empty values count as unset.

use std::fmt;

use crate::config::Config;

/// Environment variable overriding the GWT permutation.
pub const ENV_GWT_PERMUTATION: &str = "CRONO_GWT_PERMUTATION";

/// Environment variable overriding the GWT header.
pub const ENV_GWT_HEADER: &str = "CRONO_GWT_HEADER";

/// Where an effective value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Environment variable.
    Env,
    /// Config file.
    Config,
    /// Built-in default.
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env => f.write_str("env"),
            Self::Config => f.write_str("config"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// One resolved override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    /// The value, or `None` to use the built-in default.
    pub value: Option<String>,
    /// Where it came from.
    pub source: ValueSource,
}

impl Override {
    fn resolve(env: Option<String>, config: Option<&str>) -> Self {
        if let Some(value) = env.filter(|v| !v.trim().is_empty()) {
            return Self {
                value: Some(value.trim().to_string()),
                source: ValueSource::Env,
            };
        }
        match config.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => Self {
                value: Some(value.to_string()),
                source: ValueSource::Config,
            },
            None => Self {
                value: None,
                source: ValueSource::Default,
            },
        }
    }

    /// The value as `&str`, if overridden.
    pub fn as_deref(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Effective protocol overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolOverrides {
    /// GWT permutation.
    pub permutation: Override,
    /// GWT header.
    pub header: Override,
}

impl ProtocolOverrides {
    /// Resolves overrides from the process environment and `config`.
    pub fn resolve(config: &Config) -> Self {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolves overrides with a custom environment lookup.
    pub fn resolve_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            permutation: Override::resolve(
                env(ENV_GWT_PERMUTATION),
                config.gwt_permutation.as_deref(),
            ),
            header: Override::resolve(env(ENV_GWT_HEADER), config.gwt_header.as_deref()),
        }
    }

    /// Returns true if neither value is overridden.
    pub fn is_empty(&self) -> bool {
        self.permutation.value.is_none() && self.header.value.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================
