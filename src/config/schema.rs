//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

/// Root configuration for the synchronizer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// etcd holding the vulcand configuration (read-only).
    pub etcd: EtcdConfig,

    /// vulcand API used for every write.
    pub vulcand: VulcandConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// etcd connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EtcdConfig {
    /// Base URI (e.g., "http://127.0.0.1:2379").
    pub uri: String,

    /// Timeout for listing requests in seconds. Watches are not bounded.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// vulcand API connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VulcandConfig {
    /// Base URI (e.g., "http://127.0.0.1:8182").
    pub uri: String,

    /// Timeout for every API request in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for VulcandConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert!(config.etcd.uri.is_empty());
        assert_eq!(config.etcd.request_timeout_secs, 10);
        assert_eq!(config.vulcand.connect_timeout_secs, 5);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml() {
        let config: SyncConfig = toml::from_str(
            r#"
            [etcd]
            uri = "http://etcd:2379"

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.etcd.uri, "http://etcd:2379");
        assert_eq!(config.etcd.connect_timeout_secs, 5);
        assert!(config.vulcand.uri.is_empty());
        assert_eq!(config.observability.log_level, "debug");
    }
}
