//! Cookie state threaded through a multi-step login.
//!
//! A [`CookieJar`] is a plain name→value map. Each exchange produces a jar
//! from its `Set-Cookie` headers, which is then merged over the previous one:
//! names from both survive, and the newer value wins for shared names.

use std::collections::BTreeMap;
use std::fmt;

use cookie::Cookie;
use reqwest::header::{HeaderMap, SET_COOKIE};
use tracing::trace;

/// Accumulated cookies, keyed by name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the name/value pair of every `Set-Cookie` line.
    ///
    /// Attributes (`Path`, `HttpOnly`, ...) are dropped. Lines that do not
    /// parse, or carry an empty value, are skipped.
    pub fn from_set_cookie<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut jar = Self::new();
        for line in lines {
            match Cookie::parse(line) {
                Ok(c) if !c.value().is_empty() => {
                    jar.insert(c.name(), c.value());
                }
                Ok(c) => trace!(name = c.name(), "Skipping cookie with empty value"),
                Err(e) => trace!(error = %e, "Skipping unparseable Set-Cookie line"),
            }
        }
        jar
    }

    /// Collects cookies from the `Set-Cookie` headers of a response.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_set_cookie(
            headers
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        )
    }

    /// Sets a cookie, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Returns the value of a cookie.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Returns true if the cookie is present.
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Merges a newer jar over this one.
    ///
    /// Cookies only present here are kept; shared names take the newer value.
    #[must_use]
    pub fn merge(mut self, newer: &CookieJar) -> CookieJar {
        for (name, value) in &newer.cookies {
            self.cookies.insert(name.clone(), value.clone());
        }
        self
    }

    /// Renders the jar as a `Cookie` request header value.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Cookie names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    /// Number of cookies.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true if the jar holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values are session secrets.
        f.debug_set().entries(self.names()).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
