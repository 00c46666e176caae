//! Config command - manage configuration.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use crono_cronometer::{DEFAULT_GWT_HEADER, DEFAULT_GWT_PERMUTATION};
use crono_fetch::FetchSettings;
use crono_store::{Config, Override, ProtocolOverrides, ValueSource};
use serde::Serialize;
use tracing::info;

use crate::output::JsonFormatter;
use crate::Cli;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective settings and where each came from.
    Show {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the configuration file path.
    Path,

    /// Store GWT protocol constants. An empty value clears one.
    #[command(group = clap::ArgGroup::new("gwt").required(true).multiple(true))]
    SetGwt {
        /// GWT permutation hash.
        #[arg(long, group = "gwt")]
        permutation: Option<String>,

        /// GWT header hash.
        #[arg(long, group = "gwt")]
        header: Option<String>,
    },

    /// Clear stored GWT constants.
    Reset {
        /// Delete the whole config file, including keys other tools own.
        #[arg(long)]
        all: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    let path = cli.config_path();
    match &args.action {
        ConfigAction::Show { json } => show_config(&path, *json, cli).await,
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::SetGwt { permutation, header } => {
            set_gwt(&path, permutation.as_deref(), header.as_deref()).await
        }
        ConfigAction::Reset { all } => reset_config(&path, *all).await,
    }
}

/// One effective setting.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Setting {
    value: String,
    source: String,
}

impl Setting {
    fn from_override(value: &Override, default: &str) -> Self {
        Self {
            value: value.as_deref().unwrap_or(default).to_string(),
            source: value.source.to_string(),
        }
    }
}

/// Effective settings, as printed by `config show`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EffectiveConfig {
    path: String,
    gwt_permutation: Setting,
    gwt_header: Setting,
    timeout_secs: Setting,
}

impl EffectiveConfig {
    fn resolve(path: &Path, config: &Config, overrides: &ProtocolOverrides) -> Self {
        let timeout_secs = match config.timeout_secs {
            Some(secs) => Setting {
                value: secs.to_string(),
                source: ValueSource::Config.to_string(),
            },
            None => Setting {
                value: FetchSettings::default().timeout.as_secs().to_string(),
                source: ValueSource::Default.to_string(),
            },
        };
        Self {
            path: path.display().to_string(),
            gwt_permutation: Setting::from_override(
                &overrides.permutation,
                DEFAULT_GWT_PERMUTATION,
            ),
            gwt_header: Setting::from_override(&overrides.header, DEFAULT_GWT_HEADER),
            timeout_secs,
        }
    }
}

async fn show_config(path: &Path, json: bool, cli: &Cli) -> Result<()> {
    let config = Config::load_from(path).await?;
    let effective = EffectiveConfig::resolve(path, &config, &ProtocolOverrides::resolve(&config));

    if json {
        let formatter = JsonFormatter::new(cli.pretty);
        println!("{}", formatter.format(&effective)?);
    } else {
        println!("Config file:     {}", effective.path);
        for (name, setting) in [
            ("GWT permutation", &effective.gwt_permutation),
            ("GWT header", &effective.gwt_header),
            ("Timeout (secs)", &effective.timeout_secs),
        ] {
            println!("{:<16} {} ({})", format!("{name}:"), setting.value, setting.source);
        }
    }

    Ok(())
}

async fn set_gwt(path: &Path, permutation: Option<&str>, header: Option<&str>) -> Result<()> {
    let mut config = Config::load_from(path).await?;
    config.set_gwt(permutation, header);
    config.save_to(path).await?;

    info!(path = %path.display(), "GWT constants updated");
    println!("GWT constants saved to {}", path.display());

    Ok(())
}

async fn reset_config(path: &Path, all: bool) -> Result<()> {
    if all {
        if Config::remove_at(path).await? {
            println!("Configuration reset to defaults");
        } else {
            println!("No configuration file to reset");
        }
        return Ok(());
    }

    let mut config = Config::load_from(path).await?;
    if config.gwt_permutation.is_none() && config.gwt_header.is_none() {
        println!("No stored GWT constants");
        return Ok(());
    }
    config.clear_gwt();
    config.save_to(path).await?;

    info!(path = %path.display(), "GWT constants cleared");
    println!("GWT constants reset to built-in defaults");

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_effective_defaults() {
        let config = Config::default();
        let overrides = ProtocolOverrides::resolve_with(&config, |_| None);
        let effective = EffectiveConfig::resolve(Path::new("/c.json"), &config, &overrides);

        assert_eq!(effective.gwt_permutation.value, DEFAULT_GWT_PERMUTATION);
        assert_eq!(effective.gwt_permutation.source, "default");
        assert_eq!(effective.gwt_header.value, DEFAULT_GWT_HEADER);
        assert_eq!(effective.timeout_secs.value, "30");
    }

    #[test]
    fn test_effective_sources() {
        let config = Config {
            gwt_header: Some("CFGHDR".to_string()),
            timeout_secs: Some(12),
            ..Config::default()
        };
        let overrides = ProtocolOverrides::resolve_with(&config, |name| {
            (name == crono_store::ENV_GWT_PERMUTATION).then(|| "ENVPERM".to_string())
        });
        let effective = EffectiveConfig::resolve(Path::new("/c.json"), &config, &overrides);

        let json = serde_json::to_value(&effective).unwrap();
        assert_eq!(json["gwtPermutation"]["value"], "ENVPERM");
        assert_eq!(json["gwtPermutation"]["source"], "env");
        assert_eq!(json["gwtHeader"]["value"], "CFGHDR");
        assert_eq!(json["gwtHeader"]["source"], "config");
        assert_eq!(json["timeoutSecs"]["value"], "12");
    }

    #[tokio::test]
    async fn test_set_gwt_then_reset() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        set_gwt(&path, Some("PERM"), None).await.unwrap();
        set_gwt(&path, None, Some("HDR")).await.unwrap();
        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.gwt_permutation.as_deref(), Some("PERM"));
        assert_eq!(config.gwt_header.as_deref(), Some("HDR"));

        reset_config(&path, false).await.unwrap();
        assert!(path.exists());
        assert_eq!(Config::load_from(&path).await.unwrap(), Config::default());

        reset_config(&path, true).await.unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_set_gwt_requires_a_value() {
        assert!(Cli::try_parse_from(["crono", "config", "set-gwt"]).is_err());
        assert!(Cli::try_parse_from(["crono", "config", "set-gwt", "--header", "H"]).is_ok());
    }
}
