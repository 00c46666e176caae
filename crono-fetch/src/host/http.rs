//! HTTP client with tracing, cookie passing, and cancellation.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Explicit cookie passing from a [`CookieJar`] (no hidden jar)
//! - Manual redirect handling for the login calls ([`HttpClient::get`] and
//!   [`HttpClient::post_form`]), so every `Set-Cookie` stays visible. The
//!   RPC and export calls follow redirects.
//! - Cancellation of the in-flight request via a [`CancellationToken`]

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{redirect, Client, RequestBuilder, StatusCode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::cookies::CookieJar;
use crate::error::HttpError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for crono.
const USER_AGENT: &str = concat!("crono/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed by the following client.
const MAX_REDIRECTS: usize = 10;

/// How a request treats 3xx answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redirects {
    /// Follow redirects up to a hop limit.
    Follow,
    /// Return the 3xx response as-is.
    Manual,
}

// ============================================================================
// HTTP Response
// ============================================================================

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Cookies set by this response.
    pub cookies: CookieJar,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing, explicit cookies, and cancellation.
#[derive(Debug, Clone)]
pub struct HttpClient {
    following: Client,
    manual: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let build = |policy: redirect::Policy| {
            Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .redirect(policy)
                .build()
        };

        Ok(Self {
            following: build(redirect::Policy::limited(MAX_REDIRECTS))?,
            manual: build(redirect::Policy::none())?,
        })
    }

    fn client(&self, redirects: Redirects) -> &Client {
        match redirects {
            Redirects::Follow => &self.following,
            Redirects::Manual => &self.manual,
        }
    }

    /// Performs a GET request without following redirects.
    #[instrument(skip(self, cookies, cancel), fields(url = %url))]
    pub async fn get(
        &self,
        url: &str,
        cookies: &CookieJar,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        debug!("GET request");
        let request = with_cookies(self.client(Redirects::Manual).get(url), cookies)?;
        self.execute(request, cancel).await
    }

    /// Performs a GET request with query parameters, following redirects.
    #[instrument(skip(self, query, cookies, cancel), fields(url = %url))]
    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
        cookies: &CookieJar,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        debug!("GET request with query");
        let request = self.client(Redirects::Follow).get(url).query(query);
        let request = with_cookies(request, cookies)?;
        self.execute(request, cancel).await
    }

    /// Performs a POST request with form data without following redirects.
    #[instrument(skip(self, form, cookies, cancel), fields(url = %url))]
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
        cookies: &CookieJar,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        debug!("POST request with form data");
        let request = self.client(Redirects::Manual).post(url).form(form);
        let request = with_cookies(request, cookies)?;
        self.execute(request, cancel).await
    }

    /// Performs a POST request with a raw text body and custom headers,
    /// following redirects.
    #[instrument(skip(self, headers, body, cookies, cancel), fields(url = %url))]
    pub async fn post_text(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
        cookies: &CookieJar,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        debug!("POST request with text body");
        let request = self.client(Redirects::Follow).post(url).headers(headers).body(body);
        let request = with_cookies(request, cookies)?;
        self.execute(request, cancel).await
    }

    /// Sends the request and reads the body, unless cancelled first.
    async fn execute(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Request cancelled");
                Err(HttpError::Cancelled)
            }
            result = read_response(request) => result,
        }
    }
}

async fn read_response(request: RequestBuilder) -> Result<HttpResponse, HttpError> {
    let response = request.send().await?;
    let status = response.status();
    let cookies = CookieJar::from_headers(response.headers());
    let body = response.text().await?;
    debug!(status = %status, cookies = cookies.len(), len = body.len(), "Response received");
    Ok(HttpResponse {
        status,
        cookies,
        body,
    })
}

fn with_cookies(request: RequestBuilder, cookies: &CookieJar) -> Result<RequestBuilder, HttpError> {
    if cookies.is_empty() {
        return Ok(request);
    }
    let value = HeaderValue::from_str(&cookies.header_value())
        .map_err(|e| HttpError::InvalidHeader(format!("Invalid cookie: {e}")))?;
    Ok(request.header(COOKIE, value))
}

// ============================================================================
// Tests
// ============================================================================
