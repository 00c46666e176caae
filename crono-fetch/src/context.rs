//! Fetch context providing access to host APIs.
//!
//! The fetch context is handed to every session and export operation and
//! bundles the credential source, HTTP client, settings, and the
//! cancellation token for the current run.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::HttpError;
use crate::host::{
    http::{HttpClient, DEFAULT_TIMEOUT_SECS},
    keychain::{CredentialSource, SystemKeychain},
};

/// Default service base URL.
pub const DEFAULT_BASE_URL: &str = "https://cronometer.com";

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Service base URL, without a trailing slash.
    pub base_url: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl FetchSettings {
    /// Creates settings with custom timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates settings pointing at another base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Joins a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Checks that a base URL is absolute http(s) and strips trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String, HttpError> {
    let parsed = Url::parse(raw).map_err(|e| HttpError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(HttpError::InvalidUrl(format!(
            "{raw}: unsupported scheme {}",
            parsed.scheme()
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context for one run of session and export operations.
///
/// Cloning is cheap; clones share the client, credential source, and
/// cancellation token.
#[derive(Clone)]
pub struct FetchContext {
    /// Stored credential lookup.
    pub credentials: Arc<dyn CredentialSource>,
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Fetch settings.
    pub settings: FetchSettings,
    cancel: CancellationToken,
}

impl FetchContext {
    /// Creates a context with default settings and the system keychain.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new() -> Result<Self, HttpError> {
        Self::builder().build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    /// Absolute URL for a service path.
    pub fn url(&self, path: &str) -> String {
        self.settings.url(path)
    }

    /// The cancellation token every request races against.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels every in-flight and future request made with this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
#[derive(Default)]
pub struct FetchContextBuilder {
    credentials: Option<Arc<dyn CredentialSource>>,
    http: Option<Arc<HttpClient>>,
    cancel: Option<CancellationToken>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the credential source.
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the HTTP client. Overrides the timeout setting.
    #[must_use]
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Sets the service base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    /// Builds the fetch context.
    ///
    /// # Errors
    ///
    /// Fails if the base URL is not an absolute http(s) URL, or the HTTP
    /// client cannot be built.
    pub fn build(mut self) -> Result<FetchContext, HttpError> {
        self.settings.base_url = normalize_base_url(&self.settings.base_url)?;

        let http = match self.http {
            Some(http) => http,
            None => Arc::new(HttpClient::with_timeout(self.settings.timeout)?),
        };

        Ok(FetchContext {
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(SystemKeychain::new())),
            http,
            settings: self.settings,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
