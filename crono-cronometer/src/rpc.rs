//! GWT-RPC payloads spoken by the Cronometer web app.
//!
//! Two calls are used: `authenticate`, which resolves the numeric account id
//! for a logged-in session, and `generateAuthorizationToken`, which mints a
//! single-use export token. Both are pipe-delimited text payloads whose
//! string table references the app's build identifiers (see [`GwtVersion`]).
//!
//! Responses start with `//OK[` on success. Only the pieces we need are
//! pulled out with tolerant pattern matches.

use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crono_fetch::HttpError;

// ============================================================================
// Constants
// ============================================================================

/// Built-in GWT permutation (strong name of the compiled client).
pub const DEFAULT_GWT_PERMUTATION: &str = "7B121DC5483BF272B1BC1916DA9FA963";

/// Built-in GWT serialization policy header.
pub const DEFAULT_GWT_HEADER: &str = "2D6A926E3729946302DC68073CB0D550";

/// RPC service interface.
const SERVICE: &str = "com.cronometer.shared.rpc.CronometerService";

/// Path of the RPC endpoint, relative to the base URL.
pub const RPC_PATH: &str = "/cronometer/app";

/// Validity of a generated authorization token, in seconds.
const TOKEN_TTL_SECS: u32 = 3600;

const GWT_CONTENT_TYPE: &str = "text/x-gwt-rpc; charset=UTF-8";
const MODULE_BASE_HEADER: &str = "x-gwt-module-base";
const PERMUTATION_HEADER: &str = "x-gwt-permutation";

/// `//OK[<id>,...` from `authenticate`.
static USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//OK\[(-?\d+)").expect("Invalid regex"));

/// First quoted lowercase hex string of 32+ chars.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([a-f0-9]{32,})""#).expect("Invalid regex"));

// ============================================================================
// GWT Version
// ============================================================================

/// Build identifiers of the Cronometer web client.
///
/// The service rotates these when it ships a new client build, after which
/// RPC calls stop matching. They are configuration: the defaults can be
/// overridden without a new release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GwtVersion {
    /// Sent as `X-GWT-Permutation`.
    pub permutation: String,
    /// Second entry of every RPC string table.
    pub header: String,
}

impl Default for GwtVersion {
    fn default() -> Self {
        Self {
            permutation: DEFAULT_GWT_PERMUTATION.to_string(),
            header: DEFAULT_GWT_HEADER.to_string(),
        }
    }
}

impl GwtVersion {
    /// Creates a version from explicit values.
    pub fn new(permutation: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            permutation: permutation.into(),
            header: header.into(),
        }
    }

    /// Applies overrides on top of this version. Empty strings are ignored.
    #[must_use]
    pub fn with_overrides(mut self, permutation: Option<&str>, header: Option<&str>) -> Self {
        if let Some(p) = permutation.map(str::trim).filter(|p| !p.is_empty()) {
            self.permutation = p.to_string();
        }
        if let Some(h) = header.map(str::trim).filter(|h| !h.is_empty()) {
            self.header = h.to_string();
        }
        self
    }

    /// Returns true if both values are the built-in defaults.
    pub fn is_default(&self) -> bool {
        self.permutation == DEFAULT_GWT_PERMUTATION && self.header == DEFAULT_GWT_HEADER
    }
}

// ============================================================================
// Request Bodies
// ============================================================================

/// Module base URL announced to the RPC servlet.
pub fn module_base(base_url: &str) -> String {
    format!("{base_url}/cronometer/")
}

/// Body of the `authenticate` call.
///
/// `tz_offset_minutes` is UTC minus local time, positive west of Greenwich.
pub fn authenticate_body(base_url: &str, gwt: &GwtVersion, tz_offset_minutes: i32) -> String {
    format!(
        "7|0|5|{}|{}|{SERVICE}|authenticate|java.lang.Integer/3438268394|\
         1|2|3|4|1|5|5|{tz_offset_minutes}|",
        module_base(base_url),
        gwt.header,
    )
}

/// Body of the `generateAuthorizationToken` call.
pub fn token_body(base_url: &str, gwt: &GwtVersion, nonce: &str, user_id: i64) -> String {
    format!(
        "7|0|8|{}|{}|{SERVICE}|generateAuthorizationToken|java.lang.String/2004016611|I|\
         com.cronometer.shared.user.AuthScope/2065601159|{nonce}|\
         1|2|3|4|4|5|6|6|7|8|{user_id}|{TOKEN_TTL_SECS}|7|2|",
        module_base(base_url),
        gwt.header,
    )
}

/// Headers required on every RPC call.
///
/// # Errors
///
/// Fails if a configured identifier is not a valid header value.
pub fn rpc_headers(base_url: &str, gwt: &GwtVersion) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(GWT_CONTENT_TYPE));
    headers.insert(
        HeaderName::from_static(MODULE_BASE_HEADER),
        header_value(&module_base(base_url))?,
    );
    headers.insert(
        HeaderName::from_static(PERMUTATION_HEADER),
        header_value(&gwt.permutation)?,
    );
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader(format!("{value:?}: {e}")))
}

/// Local timezone offset in minutes, UTC minus local.
pub fn local_tz_offset_minutes() -> i32 {
    -Local::now().offset().local_minus_utc() / 60
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Extracts the account id from an `authenticate` response.
pub fn parse_user_id(body: &str) -> Option<i64> {
    USER_ID_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts the token from a `generateAuthorizationToken` response.
pub fn parse_token(body: &str) -> Option<&str> {
    TOKEN_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ============================================================================
// Tests
// ============================================================================
