//! minor-sync
//!
//! Keeps vulcand `-minor` backends in sync with the minor servers of their
//! source backends.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────┐  ls / watch   ┌──────────────┐  get / upsert / delete  ┌──────────┐
//!   │   etcd   │──────────────▶│ Synchronizer │────────────────────────▶│ vulcand  │
//!   │ (source) │               │  keys filter │                         │   API    │
//!   └──────────┘               └──────────────┘                         └──────────┘
//! ```
//!
//! etcd is only read; every write goes through the vulcand API so that
//! vulcand validates it before it is stored.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use minor_sync::config::{load_config, merge, ConfigOverrides, SyncConfig};
use minor_sync::lifecycle::{self, shutdown_signal};
use minor_sync::observability::logging;

#[derive(Parser)]
#[command(name = "minor-sync", version)]
#[command(about = "Mirrors vulcand minor servers into their -minor backends", long_about = None)]
struct Cli {
    /// Etcd URI that vulcand uses. Only used for read-only activity
    #[arg(long, env = "MINOR_SERVER_UPDATE_ETCD_URI")]
    etcd_uri: Option<String>,

    /// Vulcand URI where vulcand's API is available. Used for all write activity
    #[arg(long, env = "MINOR_SERVER_UPDATE_VULCAND_URI")]
    vulcand_uri: Option<String>,

    /// Optional TOML configuration file; flags and environment take precedence
    #[arg(short, long, env = "MINOR_SERVER_UPDATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence
    #[arg(long, env = "MINOR_SERVER_UPDATE_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(code) => return code,
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        etcd_uri = %config.etcd.uri,
        vulcand_uri = %config.vulcand.uri,
        "minor-sync starting"
    );

    let mut synchronizer = match lifecycle::start(&config) {
        Ok(synchronizer) => synchronizer,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        result = synchronizer.run() => match result {
            Ok(never) => match never {},
            Err(e) => {
                tracing::error!(error = %e, "Synchronizer stopped");
                ExitCode::FAILURE
            }
        },
        signal = shutdown_signal() => {
            tracing::info!(signal, "Shutdown signal received, exiting");
            ExitCode::SUCCESS
        }
    }
}

/// Merge defaults, the optional config file, and flags/environment, then validate.
///
/// Logging is not initialized yet, so problems go straight to stderr.
fn resolve_config(cli: &Cli) -> Result<SyncConfig, ExitCode> {
    let base = match &cli.config {
        Some(path) => load_config(path).map_err(|e| {
            eprintln!("Failed to load {}: {}", path.display(), e);
            ExitCode::FAILURE
        })?,
        None => SyncConfig::default(),
    };

    let overrides = ConfigOverrides {
        etcd_uri: cli.etcd_uri.clone(),
        vulcand_uri: cli.vulcand_uri.clone(),
        log_level: cli.log_level.clone(),
    };

    merge(base, &overrides).map_err(|report| {
        if report.show_usage {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Failed to print usage: {e}");
            }
            eprintln!();
        }
        for message in &report.messages {
            eprintln!("  {message}");
        }
        ExitCode::FAILURE
    })
}
