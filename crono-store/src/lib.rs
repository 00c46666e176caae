// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Crono Store
//!
//! Persisted configuration for crono.
//!
//! This crate provides:
//!
//! - **Config**: the JSON config file (`~/.config/crono/config.json`)
//! - **ProtocolOverrides**: GWT constants resolved from env, then config
//! - **Persistence**: JSON file helpers with owner-only permissions
//!
//! ## Usage
//!
//! ```ignore
//! use crono_store::{Config, ProtocolOverrides};
//!
//! let config = Config::load().await?;
//! let overrides = ProtocolOverrides::resolve(&config);
//! if let Some(permutation) = overrides.permutation.as_deref() {
//!     println!("permutation overridden: {permutation}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod overrides;
pub mod persistence;

pub use config::Config;
pub use error::StoreError;
pub use overrides::{Override, ProtocolOverrides, ValueSource, ENV_GWT_HEADER, ENV_GWT_PERMUTATION};
pub use persistence::{
    default_config_dir, default_config_path, ensure_dir, load_json, load_json_or_default, save_json,
};
