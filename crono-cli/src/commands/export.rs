//! Export command - download one export kind for a date or range.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use crono_core::{
    parse_day, parse_range_with, resolve_date_with, Clock, CoreError, DateRange, ExportKind,
    SystemClock,
};
use crono_cronometer::{CronometerClient, GwtVersion};
use crono_fetch::{
    CredentialChain, EnvCredentials, FetchContext, FetchError, FetchSettings, SystemKeychain,
};
use crono_store::{Config, ProtocolOverrides};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::output::JsonFormatter;
use crate::Cli;

/// Arguments for the export command.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// What to export: nutrition, exercises or biometrics.
    pub kind: ExportKind,

    /// Single day: YYYY-MM-DD, "yesterday" or "-<N>d".
    #[arg(long, short, allow_hyphen_values = true, conflicts_with = "range")]
    pub date: Option<String>,

    /// Range: "<N>d" (last N days) or "YYYY-MM-DD:YYYY-MM-DD".
    #[arg(long, short)]
    pub range: Option<String>,

    /// Print the raw CSV instead of JSON records.
    #[arg(long)]
    pub csv: bool,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout: Option<u64>,
}

/// Runs the export command.
pub async fn run(args: &ExportArgs, cli: &Cli) -> Result<()> {
    let range = resolve_range(args.date.as_deref(), args.range.as_deref(), &SystemClock)
        .map_err(FetchError::from)?;

    let config = Config::load_from(&cli.config_path()).await?;
    let overrides = ProtocolOverrides::resolve(&config);
    let gwt = GwtVersion::default()
        .with_overrides(overrides.permutation.as_deref(), overrides.header.as_deref());
    if !gwt.is_default() {
        debug!(
            permutation = %overrides.permutation.source,
            header = %overrides.header.source,
            "Using overridden GWT constants"
        );
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let ctx = FetchContext::builder()
        .credentials(Arc::new(
            CredentialChain::new()
                .with(Arc::new(EnvCredentials))
                .with(Arc::new(SystemKeychain::new())),
        ))
        .settings(FetchSettings::default().with_timeout(effective_timeout(args.timeout, &config)))
        .cancel_token(cancel)
        .build()
        .map_err(FetchError::from)?;
    let client = CronometerClient::with_gwt(ctx, gwt);

    info!(kind = %args.kind, start = %range.start_str(), end = %range.end_str(), "Exporting");

    if args.csv {
        let raw = client.export_data(args.kind, &range).await?;
        print!("{raw}");
        if !raw.is_empty() && !raw.ends_with('\n') {
            println!();
        }
    } else {
        let records = client.export_records(args.kind, &range).await?;
        let formatter = JsonFormatter::new(cli.pretty);
        println!("{}", formatter.format(&records)?);
    }

    Ok(())
}

/// Turns the `--date`/`--range` options into a range. Neither means today.
pub fn resolve_range(
    date: Option<&str>,
    range: Option<&str>,
    clock: &impl Clock,
) -> Result<DateRange, CoreError> {
    match (date, range) {
        (_, Some(expr)) => parse_range_with(expr, clock),
        (Some(expr), None) => Ok(DateRange::single(parse_day(&resolve_date_with(expr, clock)?)?)),
        (None, None) => Ok(DateRange::single(clock.today())),
    }
}

/// Command line beats the config file, which beats the built-in default.
fn effective_timeout(cli_secs: Option<u64>, config: &Config) -> Duration {
    cli_secs
        .map(Duration::from_secs)
        .or_else(|| config.timeout())
        .unwrap_or(FetchSettings::default().timeout)
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("Interrupted, cancelling export");
                    cancel.cancel();
                }
            }
            () = cancel.cancelled() => {}
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
