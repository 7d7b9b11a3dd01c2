//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics endpoint when enabled
//! - Build the etcd and vulcand clients from a validated configuration
//! - Assemble the synchronizer
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Clients connect lazily; unreachable endpoints surface on the first sweep

use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::config::SyncConfig;
use crate::etcd::{EtcdClient, StoreError};
use crate::observability::metrics;
use crate::sync::Synchronizer;
use crate::vulcand::{GatewayError, VulcandClient};

/// The synchronizer wired to real endpoints.
pub type MinorSync = Synchronizer<EtcdClient, VulcandClient>;

/// Errors that prevent the synchronizer from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("etcd client: {0}")]
    Etcd(#[from] StoreError),

    #[error("vulcand client: {0}")]
    Vulcand(#[from] GatewayError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] BuildError),
}

/// Build everything the synchronizer needs. Must run inside a Tokio runtime.
pub fn start(config: &SyncConfig) -> Result<MinorSync, StartupError> {
    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let etcd = EtcdClient::new(&config.etcd)?;
    let vulcand = VulcandClient::new(&config.vulcand)?;

    tracing::info!(
        etcd_uri = %config.etcd.uri,
        vulcand_uri = %config.vulcand.uri,
        "Clients initialized"
    );
    Ok(Synchronizer::new(etcd, vulcand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncPhase;

    fn config() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.etcd.uri = "http://127.0.0.1:2379".to_string();
        config.vulcand.uri = "http://127.0.0.1:8182".to_string();
        config
    }

    #[tokio::test]
    async fn test_start() {
        let sync = start(&config()).unwrap();
        assert_eq!(sync.phase(), SyncPhase::Converging);
    }

    #[tokio::test]
    async fn test_start_rejects_bad_uri() {
        let mut config = config();
        config.etcd.uri = "::".to_string();
        assert!(matches!(start(&config), Err(StartupError::Etcd(_))));
    }
}
