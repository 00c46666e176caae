//! Host APIs for crono session and export operations.
//!
//! - [`keychain`] - Stored credential lookup (system keychain, env, memory)
//! - [`http`] - HTTP client with explicit cookies and cancellation

pub mod http;
pub mod keychain;

// Re-export key types
pub use http::{HttpClient, HttpResponse};
pub use keychain::{
    CredentialChain, CredentialSource, EnvCredentials, StaticCredentials, SystemKeychain,
};
