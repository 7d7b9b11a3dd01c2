//! Command-line and environment overrides.
//!
//! # Responsibilities
//! - Layer flag/environment values over a file or default configuration
//! - Validate the merged result
//! - Turn validation failures into the lines printed before exiting

use crate::config::schema::SyncConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ETCD_URI_ENV: &str = "MINOR_SERVER_UPDATE_ETCD_URI";
pub const VULCAND_URI_ENV: &str = "MINOR_SERVER_UPDATE_VULCAND_URI";

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub etcd_uri: Option<String>,
    pub vulcand_uri: Option<String>,
    pub log_level: Option<String>,
}

/// Why a merged configuration cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigReport {
    /// A required input was never supplied; usage help should be shown.
    pub show_usage: bool,
    /// One line per problem, in validation order.
    pub messages: Vec<String>,
}

impl ConfigReport {
    fn from_errors(errors: &[ValidationError]) -> Self {
        Self {
            show_usage: errors.iter().any(ValidationError::is_missing),
            messages: errors.iter().map(message).collect(),
        }
    }
}

fn message(error: &ValidationError) -> String {
    match error {
        ValidationError::MissingUri { field: "etcd.uri" } => {
            format!("Missing required flag --etcd-uri or {ETCD_URI_ENV}")
        }
        ValidationError::MissingUri {
            field: "vulcand.uri",
        } => format!("Missing required flag --vulcand-uri or {VULCAND_URI_ENV}"),
        other => other.to_string(),
    }
}

/// Apply `overrides` on top of `config` and validate the result.
pub fn merge(
    mut config: SyncConfig,
    overrides: &ConfigOverrides,
) -> Result<SyncConfig, ConfigReport> {
    if let Some(uri) = &overrides.etcd_uri {
        config.etcd.uri = uri.clone();
    }
    if let Some(uri) = &overrides.vulcand_uri {
        config.vulcand.uri = uri.clone();
    }
    if let Some(level) = &overrides.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config)
        .map(|()| config)
        .map_err(|errors| ConfigReport::from_errors(&errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(etcd_uri: Option<&str>, vulcand_uri: Option<&str>) -> ConfigOverrides {
        ConfigOverrides {
            etcd_uri: etcd_uri.map(str::to_string),
            vulcand_uri: vulcand_uri.map(str::to_string),
            log_level: None,
        }
    }

    #[test]
    fn test_overrides_win() {
        let mut base = SyncConfig::default();
        base.etcd.uri = "http://file-etcd:2379".to_string();
        base.vulcand.uri = "http://file-vulcand:8182".to_string();

        let mut flags = overrides(Some("http://etcd:2379"), None);
        flags.log_level = Some("debug".to_string());

        let config = merge(base, &flags).unwrap();
        assert_eq!(config.etcd.uri, "http://etcd:2379");
        assert_eq!(config.vulcand.uri, "http://file-vulcand:8182");
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_missing_vulcand_uri() {
        let report = merge(
            SyncConfig::default(),
            &overrides(Some("http://etcd:2379"), None),
        )
        .unwrap_err();

        assert!(report.show_usage);
        assert_eq!(
            report.messages,
            vec!["Missing required flag --vulcand-uri or MINOR_SERVER_UPDATE_VULCAND_URI"]
        );
    }

    #[test]
    fn test_missing_both_uris() {
        let report = merge(SyncConfig::default(), &ConfigOverrides::default()).unwrap_err();

        assert!(report.show_usage);
        assert_eq!(
            report.messages,
            vec![
                "Missing required flag --etcd-uri or MINOR_SERVER_UPDATE_ETCD_URI",
                "Missing required flag --vulcand-uri or MINOR_SERVER_UPDATE_VULCAND_URI",
            ]
        );
    }

    #[test]
    fn test_invalid_values_skip_usage() {
        let mut flags = overrides(Some("http://etcd:2379"), Some("ftp://vulcand"));
        flags.log_level = Some("loud".to_string());

        let report = merge(SyncConfig::default(), &flags).unwrap_err();
        assert!(!report.show_usage);
        assert_eq!(report.messages.len(), 2);
        assert_eq!(report.messages[1], "unknown log level 'loud'");
    }
}
