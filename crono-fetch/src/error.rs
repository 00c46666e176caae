//! Fetch error types.
//!
//! [`FetchError`] is the error every session and export operation returns. Its
//! [`kind`](FetchError::kind) is stable, so callers can pick their own wording
//! without matching on message text.

use std::fmt;

use crono_core::CoreError;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for session and export operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Caller input was invalid (bad date or range).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Stored username or password is missing.
    #[error("No stored credentials found ({key} is missing)")]
    MissingCredentials {
        /// The credential key that had no value.
        key: String,
    },

    /// The service's response no longer matches the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The service rejected the login.
    #[error("Authentication failed: {0}")]
    Auth(AuthFailure),

    /// The export endpoint answered with a non-success status.
    #[error("Export failed: HTTP {status}")]
    Export {
        /// HTTP status code.
        status: u16,
    },

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(HttpError),

    /// Credential source failure.
    #[error("Keychain error: {0}")]
    Keychain(#[from] KeychainError),
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout => Self::Timeout,
            HttpError::Cancelled => Self::Cancelled,
            HttpError::Request(e) if e.is_timeout() => Self::Timeout,
            other => Self::Http(other),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        HttpError::from(err).into()
    }
}

impl FetchError {
    /// Builds a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns the stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(CoreError::InvalidDate { .. }) => ErrorKind::InvalidDate,
            Self::Core(CoreError::InvalidRange { .. }) => ErrorKind::InvalidRange,
            Self::Core(_) => ErrorKind::InvalidInput,
            Self::MissingCredentials { .. } => ErrorKind::MissingCredentials,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Auth(AuthFailure::InvalidCredentials) => ErrorKind::InvalidCredentials,
            Self::Auth(AuthFailure::RateLimited) => ErrorKind::RateLimited,
            Self::Export { .. } => ErrorKind::Export,
            Self::Timeout => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Http(_) => ErrorKind::Network,
            Self::Keychain(_) => ErrorKind::Credentials,
        }
    }

    /// Returns true for network-layer failures a caller may retry once.
    ///
    /// Nothing is retried internally.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Http(HttpError::Request(e)) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Returns true if the operation ended because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// User-facing guidance for the error, if there is any beyond the message.
    pub fn hint(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::MissingCredentials => Some("Store your username and password first."),
            ErrorKind::InvalidCredentials => Some("Check your stored username and password."),
            ErrorKind::RateLimited => {
                Some("Too many login attempts. Wait a minute and retry later.")
            }
            ErrorKind::Protocol => Some(concat!(
                "Protocol constants may be stale. ",
                "Override them with CRONO_GWT_PERMUTATION and CRONO_GWT_HEADER.",
            )),
            ErrorKind::Timeout | ErrorKind::Network => {
                Some("Network problem. Retrying once may help.")
            }
            _ => None,
        }
    }
}

// ============================================================================
// Error Kind
// ============================================================================

/// Stable classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or non-existent date.
    InvalidDate,
    /// Malformed or inverted range.
    InvalidRange,
    /// Other invalid caller input.
    InvalidInput,
    /// No stored username/password.
    MissingCredentials,
    /// Unexpected response shape.
    Protocol,
    /// Login rejected.
    InvalidCredentials,
    /// Login throttled.
    RateLimited,
    /// Export endpoint returned a failure status.
    Export,
    /// Request timed out.
    Timeout,
    /// Cancelled by the caller.
    Cancelled,
    /// Other transport failure.
    Network,
    /// Credential source failure.
    Credentials,
}

// ============================================================================
// Auth Failure
// ============================================================================

/// Why the service rejected a login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    /// Username or password is wrong.
    InvalidCredentials,
    /// Too many attempts; wait and retry later.
    RateLimited,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => f.write_str("invalid credentials"),
            Self::RateLimited => f.write_str("rate limited, wait a minute and try again"),
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Timeout.
    #[error("Request timed out")]
    Timeout,

    /// Cancelled while in flight.
    #[error("Request cancelled")]
    Cancelled,
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for credential lookups.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Access denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// Keychain unavailable.
    #[error("Keychain unavailable: {0}")]
    Unavailable(String),

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("Keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::Ambiguous(_) => {
                KeychainError::Other("Ambiguous credential entry".to_string())
            }
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
