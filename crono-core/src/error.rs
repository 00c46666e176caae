//! Core error types for crono.

use thiserror::Error;

/// Core error type for crono operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A date expression did not name a real `YYYY-MM-DD` calendar date.
    #[error("{message}")]
    InvalidDate {
        /// The offending input, verbatim.
        input: String,
        /// Human-readable description naming the input.
        message: String,
    },

    /// A range expression was malformed or inverted.
    #[error("{message}")]
    InvalidRange {
        /// The offending input, verbatim.
        input: String,
        /// Human-readable description naming the input.
        message: String,
    },

    /// Unknown export type name.
    #[error("Unknown export type \"{0}\". Use: nutrition, exercises, biometrics")]
    UnknownExportKind(String),
}

impl CoreError {
    pub(crate) fn invalid_date(input: &str, message: String) -> Self {
        Self::InvalidDate {
            input: input.to_string(),
            message,
        }
    }

    pub(crate) fn invalid_range(input: &str, message: String) -> Self {
        Self::InvalidRange {
            input: input.to_string(),
            message,
        }
    }

    /// Returns true if the error was caused by caller input (never worth retrying).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate { .. } | Self::InvalidRange { .. } | Self::UnknownExportKind(_)
        )
    }
}
