// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! crono CLI - Cronometer data export from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Today's nutrition summary as JSON
//! crono export nutrition
//!
//! # Yesterday's exercises, pretty-printed
//! crono export exercises -d -1d --pretty
//!
//! # Last week of biometrics as raw CSV
//! crono export biometrics -r 7d --csv
//!
//! # Override the GWT constants after a Cronometer deploy
//! crono config set-gwt --permutation <hash> --header <hash>
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crono_fetch::{ErrorKind, FetchError};
use crono_store::StoreError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{config, export};

// ============================================================================
// CLI Definition
// ============================================================================

/// crono CLI - Cronometer data export.
#[derive(Parser)]
#[command(name = "crono")]
#[command(about = "Export your Cronometer data")]
#[command(long_about = r#"
crono logs into Cronometer the way its web app does and downloads your data.

Export kinds:
  • nutrition   Daily nutrition summary
  • exercises   Logged exercises
  • biometrics  Logged biometrics

Credentials are read from the CRONO_CRONOMETER_USERNAME and
CRONO_CRONOMETER_PASSWORD environment variables, then from the system
keychain (service "crono", keys "cronometer-username" and
"cronometer-password").

Examples:
  crono export nutrition              # Today, as JSON
  crono export exercises -d -1d       # Yesterday
  crono export biometrics -r 30d      # Last 30 days
  crono export nutrition --csv        # Raw CSV
  crono config show                   # Effective protocol constants
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (no logging or error details).
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Use this config file instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Path of the config file in effect.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crono_store::Config::default_path)
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download an export (nutrition, exercises or biometrics).
    #[command(visible_alias = "e")]
    Export(export::ExportArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Invalid date, range or other input.
    InvalidInput = 2,
    /// Credentials missing or rejected.
    Auth = 3,
    /// Service response no longer matches the protocol.
    Protocol = 4,
    /// Timeout or transport failure.
    Network = 5,
    /// Interrupted with Ctrl-C.
    Cancelled = 130,
}

impl ExitCode {
    /// Picks the exit code for an error returned by a command.
    pub fn for_error(err: &anyhow::Error) -> Self {
        if let Some(fetch) = err.downcast_ref::<FetchError>() {
            return Self::for_kind(fetch.kind());
        }
        if let Some(StoreError::Config(_)) = err.downcast_ref::<StoreError>() {
            return Self::InvalidInput;
        }
        Self::Error
    }

    fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidDate | ErrorKind::InvalidRange | ErrorKind::InvalidInput => {
                Self::InvalidInput
            }
            ErrorKind::MissingCredentials
            | ErrorKind::InvalidCredentials
            | ErrorKind::RateLimited
            | ErrorKind::Credentials => Self::Auth,
            ErrorKind::Protocol => Self::Protocol,
            ErrorKind::Export | ErrorKind::Timeout | ErrorKind::Network => Self::Network,
            ErrorKind::Cancelled => Self::Cancelled,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("crono=debug,info")
    } else {
        EnvFilter::new("crono=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Export(args) => export::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        let code = ExitCode::for_error(&e);
        if !cli.quiet {
            report_error(&e, code);
        }
        std::process::exit(code as i32);
    }

    Ok(())
}

fn report_error(err: &anyhow::Error, code: ExitCode) {
    if code == ExitCode::Cancelled {
        eprintln!("Cancelled");
        return;
    }
    eprintln!("Error: {err}");
    if let Some(hint) = err.downcast_ref::<FetchError>().and_then(FetchError::hint) {
        eprintln!("Hint: {hint}");
    }
}

// ============================================================================
// Tests
// ============================================================================
