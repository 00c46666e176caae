//! Session handshake with Cronometer.
//!
//! Logging in takes three exchanges, each consuming the state left by the
//! previous one:
//!
//! 1. `GET /login/` scrapes the `anticsrf` hidden input and the `JSESSIONID`
//!    cookie ([`CsrfObtained`])
//! 2. `POST /login` submits the form; a `sesnonce` cookie signals success
//!    ([`LoggedIn`])
//! 3. `POST /cronometer/app` calls GWT `authenticate` to resolve the numeric
//!    account id ([`Session`])
//!
//! Cookies are carried as an explicit [`CookieJar`] value from step to step
//! and merged after each response.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crono_fetch::{AuthFailure, CookieJar, FetchContext, FetchError, HttpResponse};

use crate::rpc::{self, GwtVersion, RPC_PATH};

// ============================================================================
// Constants
// ============================================================================

/// Login page, carries the CSRF token.
const LOGIN_PAGE_PATH: &str = "/login/";

/// Form login endpoint.
const LOGIN_PATH: &str = "/login";

/// Primary session cookie set by the login page.
pub const SESSION_COOKIE: &str = "JSESSIONID";

/// Rotating session nonce cookie.
pub const NONCE_COOKIE: &str = "sesnonce";

/// Hidden input holding the CSRF token. Both quote styles occur.
static ANTICSRF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name=["']anticsrf["']\s+value=["']([^"']+)["']"#).expect("Invalid regex")
});

/// Extracts the CSRF token from the login page HTML.
pub fn parse_anticsrf(html: &str) -> Option<&str> {
    ANTICSRF_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ============================================================================
// Session
// ============================================================================

/// An authenticated Cronometer session.
///
/// Cookies and nonce rotate as the server answers; the account id is fixed.
/// Operations take `&mut Session`, so one session serves one export at a time.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    cookies: CookieJar,
    nonce: String,
    user_id: i64,
}

impl Session {
    /// Creates a session from already established state.
    pub fn new(cookies: CookieJar, nonce: impl Into<String>, user_id: i64) -> Self {
        Self {
            cookies,
            nonce: nonce.into(),
            user_id,
        }
    }

    /// Accumulated session cookies.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Current session nonce.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Numeric account id.
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Folds the cookies of a response into the session.
    ///
    /// A new `sesnonce` replaces the current nonce.
    pub fn absorb(&mut self, cookies: &CookieJar) {
        if cookies.is_empty() {
            return;
        }
        if let Some(nonce) = cookies.get(NONCE_COOKIE) {
            debug!("Session nonce rotated");
            self.nonce = nonce.to_string();
        }
        self.cookies = std::mem::take(&mut self.cookies).merge(cookies);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookies", &self.cookies)
            .field("nonce", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

// ============================================================================
// Handshake States
// ============================================================================

/// Step 1 done: CSRF token scraped, initial cookies captured.
#[derive(Debug, Clone)]
pub struct CsrfObtained {
    /// CSRF token for the login form.
    pub anticsrf: String,
    /// Every cookie set by the login page.
    pub cookies: CookieJar,
}

/// Step 2 done: credentials accepted.
#[derive(Debug, Clone)]
pub struct LoggedIn {
    /// Step 1 cookies merged with the login response cookies.
    pub cookies: CookieJar,
    /// `sesnonce` from the login response.
    pub nonce: String,
}

/// Handshake progress, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    /// Nothing sent yet.
    Unauthenticated,
    /// Login page scraped.
    CsrfObtained,
    /// Form login accepted.
    LoggedIn,
    /// Account id resolved.
    Authenticated,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::CsrfObtained => "csrf_obtained",
            Self::LoggedIn => "logged_in",
            Self::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Login Response Classification
// ============================================================================

/// The form login answers either with a JSON object or an opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResponse {
    /// Body decoded as a JSON object.
    Structured {
        /// Non-empty `error` message, if any.
        error: Option<String>,
    },
    /// Redirect page, HTML, or anything else.
    Opaque,
}

impl LoginResponse {
    /// Decodes a login response body. Only a JSON object is structured.
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(fields)) => Self::Structured {
                error: fields.get("error").and_then(error_message),
            },
            _ => Self::Opaque,
        }
    }

    /// Decides the login outcome from the body shape and the `sesnonce` cookie.
    ///
    /// An explicit error always wins. Otherwise the nonce is the success signal.
    pub fn outcome(&self, nonce: Option<&str>) -> Result<(), AuthFailure> {
        match (self, nonce) {
            (Self::Structured { error: Some(message) }, _) => Err(classify_login_error(message)),
            (_, Some(_)) => Ok(()),
            (_, None) => Err(AuthFailure::InvalidCredentials),
        }
    }
}

fn error_message(value: &Value) -> Option<String> {
    let message = match value {
        Value::Null | Value::Bool(false) => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!message.is_empty()).then_some(message)
}

/// Maps a login error message to a failure kind.
pub fn classify_login_error(message: &str) -> AuthFailure {
    if message.to_lowercase().contains("too many attempts") {
        AuthFailure::RateLimited
    } else {
        AuthFailure::InvalidCredentials
    }
}

// ============================================================================
// Handshake
// ============================================================================

/// Runs the three handshake steps against the service.
#[derive(Debug, Clone)]
pub struct Authenticator<'a> {
    ctx: &'a FetchContext,
    gwt: &'a GwtVersion,
}

impl<'a> Authenticator<'a> {
    /// Creates an authenticator bound to a context and protocol version.
    pub fn new(ctx: &'a FetchContext, gwt: &'a GwtVersion) -> Self {
        Self { ctx, gwt }
    }

    /// Performs the full handshake.
    ///
    /// # Errors
    ///
    /// `Protocol` when a response lacks an expected piece, `Auth` when the
    /// login is rejected, `Cancelled`/`Timeout`/`Http` from the transport.
    #[instrument(skip_all)]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, FetchError> {
        let csrf = self.fetch_csrf().await?;
        let logged_in = self.submit_login(csrf, username, password).await?;
        self.authenticate(logged_in).await
    }

    /// Step 1: scrape the login page.
    pub async fn fetch_csrf(&self) -> Result<CsrfObtained, FetchError> {
        debug!(stage = %HandshakeStage::Unauthenticated, "Fetching login page");
        let response = self
            .ctx
            .http
            .get(&self.ctx.url(LOGIN_PAGE_PATH), &CookieJar::new(), self.ctx.cancel_token())
            .await?;

        let Some(anticsrf) = parse_anticsrf(&response.body) else {
            warn!(status = %response.status, "Login page has no anticsrf input");
            return Err(FetchError::protocol("anticsrf token missing"));
        };
        if !response.cookies.contains(SESSION_COOKIE) {
            warn!(status = %response.status, "Login page set no session cookie");
            return Err(FetchError::protocol("session cookie missing"));
        }

        debug!(
            stage = %HandshakeStage::CsrfObtained,
            cookies = response.cookies.len(),
            "CSRF token obtained"
        );
        Ok(CsrfObtained {
            anticsrf: anticsrf.to_string(),
            cookies: response.cookies,
        })
    }

    /// Step 2: submit the login form.
    pub async fn submit_login(
        &self,
        csrf: CsrfObtained,
        username: &str,
        password: &str,
    ) -> Result<LoggedIn, FetchError> {
        let form = [
            ("username", username),
            ("password", password),
            ("anticsrf", csrf.anticsrf.as_str()),
        ];
        let response = self
            .ctx
            .http
            .post_form(&self.ctx.url(LOGIN_PATH), &form, &csrf.cookies, self.ctx.cancel_token())
            .await?;

        let nonce = response.cookies.get(NONCE_COOKIE);
        let shape = LoginResponse::decode(&response.body);
        if let Err(failure) = shape.outcome(nonce) {
            warn!(status = %response.status, failure = %failure, "Login rejected");
            return Err(FetchError::Auth(failure));
        }
        let nonce = nonce.unwrap_or_default().to_string();

        debug!(stage = %HandshakeStage::LoggedIn, "Login accepted");
        Ok(LoggedIn {
            cookies: csrf.cookies.merge(&response.cookies),
            nonce,
        })
    }

    /// Step 3: resolve the account id over GWT-RPC.
    pub async fn authenticate(&self, logged_in: LoggedIn) -> Result<Session, FetchError> {
        let base = &self.ctx.settings.base_url;
        let body = rpc::authenticate_body(base, self.gwt, rpc::local_tz_offset_minutes());
        let response = self.rpc(body, &logged_in.cookies).await?;

        let Some(user_id) = rpc::parse_user_id(&response.body) else {
            warn!(status = %response.status, "authenticate response has no account id");
            return Err(FetchError::protocol(
                "identifier not found: protocol constants may be stale",
            ));
        };

        let mut session = Session::new(logged_in.cookies, logged_in.nonce, user_id);
        session.absorb(&response.cookies);

        debug!(stage = %HandshakeStage::Authenticated, user_id, "Session established");
        Ok(session)
    }

    /// Sends one GWT-RPC call.
    pub(crate) async fn rpc(
        &self,
        body: String,
        cookies: &CookieJar,
    ) -> Result<HttpResponse, FetchError> {
        let headers = rpc::rpc_headers(&self.ctx.settings.base_url, self.gwt)?;
        let response = self
            .ctx
            .http
            .post_text(&self.ctx.url(RPC_PATH), headers, body, cookies, self.ctx.cancel_token())
            .await?;
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anticsrf_double_quotes() {
        let html = r#"<form><input type="hidden" name="anticsrf" value="tok-123"></form>"#;
        assert_eq!(parse_anticsrf(html), Some("tok-123"));
    }

    #[test]
    fn test_parse_anticsrf_single_quotes() {
        let html = "<input type='hidden' name='anticsrf'   value='abc'>";
        assert_eq!(parse_anticsrf(html), Some("abc"));
    }

    #[test]
    fn test_parse_anticsrf_missing() {
        assert_eq!(parse_anticsrf("<html><body>Maintenance</body></html>"), None);
        assert_eq!(parse_anticsrf(r#"<input name="anticsrf" value="">"#), None);
    }

    #[test]
    fn test_login_response_structured_error() {
        let shape = LoginResponse::decode(r#"{"error":"Too Many Attempts. Try later."}"#);
        assert_eq!(
            shape,
            LoginResponse::Structured {
                error: Some("Too Many Attempts. Try later.".to_string())
            }
        );
        // error wins even when a nonce was set
        assert_eq!(shape.outcome(Some("n1")), Err(AuthFailure::RateLimited));
    }

    #[test]
    fn test_login_response_bad_password() {
        let shape = LoginResponse::decode(r#"{"error":"Invalid email or password"}"#);
        assert_eq!(shape.outcome(None), Err(AuthFailure::InvalidCredentials));
    }

    #[test]
    fn test_login_response_opaque_uses_nonce() {
        let shape = LoginResponse::decode("<html>Redirecting...</html>");
        assert_eq!(shape, LoginResponse::Opaque);
        assert_eq!(shape.outcome(Some("n1")), Ok(()));
        assert_eq!(shape.outcome(None), Err(AuthFailure::InvalidCredentials));
    }

    #[test]
    fn test_login_response_structured_without_error() {
        let shape = LoginResponse::decode(r#"{"redirect":"/"}"#);
        assert_eq!(shape, LoginResponse::Structured { error: None });
        assert_eq!(shape.outcome(Some("n1")), Ok(()));
        assert_eq!(shape.outcome(None), Err(AuthFailure::InvalidCredentials));

        let empty = LoginResponse::decode(r#"{"error":""}"#);
        assert_eq!(empty, LoginResponse::Structured { error: None });
    }

    #[test]
    fn test_login_response_only_objects_are_structured() {
        for body in [r#"["ok"]"#, r#""error""#, "42", "null"] {
            let shape = LoginResponse::decode(body);
            assert_eq!(shape, LoginResponse::Opaque, "body {body}");
            assert_eq!(shape.outcome(Some("n1")), Ok(()));
        }
    }

    #[test]
    fn test_login_response_non_string_error() {
        let shape = LoginResponse::decode(r#"{"error":{"code":429}}"#);
        assert!(matches!(shape, LoginResponse::Structured { error: Some(_) }));
        assert_eq!(shape.outcome(Some("n1")), Err(AuthFailure::InvalidCredentials));

        let cleared = LoginResponse::decode(r#"{"error":null}"#);
        assert_eq!(cleared, LoginResponse::Structured { error: None });
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify_login_error("TOO MANY ATTEMPTS"), AuthFailure::RateLimited);
        assert_eq!(classify_login_error("too many attempts"), AuthFailure::RateLimited);
        assert_eq!(classify_login_error("Account locked"), AuthFailure::InvalidCredentials);
    }

    #[test]
    fn test_session_absorb_rotates_nonce_and_merges() {
        let mut session = Session::new(
            CookieJar::from_set_cookie(["JSESSIONID=s1", "sesnonce=n1"]),
            "n1",
            42,
        );

        session.absorb(&CookieJar::from_set_cookie(["sesnonce=n2", "extra=x"]));
        assert_eq!(session.nonce(), "n2");
        assert_eq!(session.cookies().get("JSESSIONID"), Some("s1"));
        assert_eq!(session.cookies().get("sesnonce"), Some("n2"));
        assert_eq!(session.cookies().get("extra"), Some("x"));
        assert_eq!(session.user_id(), 42);

        session.absorb(&CookieJar::from_set_cookie(["other=y"]));
        assert_eq!(session.nonce(), "n2");
    }

    #[test]
    fn test_session_debug_redacts_nonce() {
        let session = Session::new(CookieJar::new(), "supersecretnonce", 7);
        let debug = format!("{session:?}");
        assert!(!debug.contains("supersecretnonce"));
        assert!(debug.contains("user_id: 7"));
    }
}
