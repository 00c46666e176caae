// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Crono Fetch
//!
//! Network plumbing and host APIs shared by crono's service clients.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::keychain`] - Stored credential lookup
//! - [`host::http`] - HTTP client with explicit cookies and cancellation
//!
//! ## Session State
//!
//! - [`cookies::CookieJar`] - Cookies threaded through a multi-step login
//! - [`context::FetchContext`] - Bundles the host APIs, settings, and the
//!   cancellation token for one run
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use crono_fetch::{FetchContext, StaticCredentials};
//!
//! let ctx = FetchContext::builder()
//!     .credentials(Arc::new(StaticCredentials::username_password("me", "pw")))
//!     .build()?;
//!
//! let page = ctx.http.get(&ctx.url("/login/"), &Default::default(), ctx.cancel_token()).await?;
//! ```

pub mod context;
pub mod cookies;
pub mod error;
pub mod host;

// Re-export key types at crate root

// Errors
pub use error::{AuthFailure, ErrorKind, FetchError, HttpError, KeychainError};

// Host APIs
pub use host::{
    http::{HttpClient, HttpResponse},
    keychain::{
        keys, CredentialChain, CredentialSource, EnvCredentials, StaticCredentials, SystemKeychain,
    },
};

// Session state
pub use context::{FetchContext, FetchContextBuilder, FetchSettings, DEFAULT_BASE_URL};
pub use cookies::CookieJar;
