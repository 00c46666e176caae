// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Crono Cronometer
//!
//! Talks to Cronometer the way its web app does, over plain HTTP.
//!
//! ## Session
//!
//! [`auth`] performs the three-step handshake (login page scrape, form
//! login, GWT `authenticate`) and yields a [`Session`]: cookies, the
//! rotating `sesnonce`, and the numeric account id.
//!
//! ## Export
//!
//! [`CronometerClient`] mints a single-use [`AuthorizationToken`] per export
//! and downloads the CSV. [`parser`] turns that CSV into typed records.
//!
//! ## Protocol Constants
//!
//! The GWT permutation and header identify the web client build and go
//! stale when Cronometer deploys. [`GwtVersion`] carries them, with
//! built-in defaults that callers can override.
//!
//! ## Example
//!
//! ```ignore
//! use crono_core::{parse_range, ExportKind};
//! use crono_cronometer::CronometerClient;
//! use crono_fetch::FetchContext;
//!
//! let client = CronometerClient::new(FetchContext::new()?);
//! let range = parse_range("7d")?;
//! let records = client.export_records(ExportKind::Biometrics, &range).await?;
//! ```

pub mod auth;
pub mod export;
pub mod parser;
pub mod rpc;


// Re-export key types at crate root
pub use auth::{Authenticator, HandshakeStage, LoginResponse, Session};
pub use export::{AuthorizationToken, CronometerClient};
pub use parser::{
    parse_biometrics, parse_delimited_rows, parse_exercises, parse_nutrition, parse_records,
};
pub use rpc::{GwtVersion, DEFAULT_GWT_HEADER, DEFAULT_GWT_PERMUTATION};
