//! Classification of vulcand keys stored in etcd.
//!
//! # Key Shapes
//! ```text
//! /vulcand/backends/{backend}/servers/{server}                 server key
//! /vulcand/backends/{backend}/servers/{server}-minor-{n}       minor-server key
//! /vulcand/backends/{backend}-minor/servers/{server}-minor-{n} minor-backend key
//! ```
//!
//! Segments are non-empty and never contain `/`. All patterns are anchored.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Namespace every vulcand key lives under.
pub const ROOT: &str = "vulcand";

/// Prefix that is listed and watched by the synchronizer.
pub const BACKENDS_PREFIX: &str = "/vulcand/backends";

const MINOR_SUFFIX: &str = "-minor";

static SERVER_KEY: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"^/{}/backends/([^/]+)/servers/([^/]+)$",
        regex::escape(ROOT)
    ))
});

static MINOR_BACKEND_KEY: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"^/{}/backends/[^/]+-minor/servers/[^/]+-minor-\d+$",
        regex::escape(ROOT)
    ))
});

static MINOR_SERVER_KEY: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"^/{}/backends/[^/]+/servers/[^/]+-minor-\d+$",
        regex::escape(ROOT)
    ))
});

// Patterns are built from constants; a failure here is a programming error.
fn compile(pattern: String) -> Regex {
    Regex::new(&pattern).expect("static key pattern must compile")
}

/// Errors raised when a key is decomposed without matching the server shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The key is not of the form `/vulcand/backends/{b}/servers/{s}`.
    #[error("not a server key: {0}")]
    NotAServerKey(String),
}

/// Returns true if `key` has the generic server-key shape.
pub fn is_server_key(key: &str) -> bool {
    SERVER_KEY.is_match(key)
}

/// Returns true if `key` is a minor server registered under a `-minor` backend.
pub fn is_minor_backend_key(key: &str) -> bool {
    MINOR_BACKEND_KEY.is_match(key)
}

/// Returns true if the server segment of `key` carries a `-minor-{n}` suffix.
pub fn is_minor_server_key(key: &str) -> bool {
    MINOR_SERVER_KEY.is_match(key)
}

/// Returns true if `key` is a minor server that should be mirrored.
///
/// Keys that already belong to a minor backend are rejected so that
/// mirrors are never mirrored again.
pub fn is_valid_minor_server_key(key: &str) -> bool {
    if !is_server_key(key) {
        tracing::trace!(key, "Key doesn't look like a server key");
        return false;
    }

    if !is_minor_server_key(key) {
        tracing::trace!(key, "Key doesn't look like a minor server");
        return false;
    }

    if is_minor_backend_key(key) {
        tracing::trace!(key, "Key belongs to a minor backend");
        return false;
    }

    tracing::trace!(key, "Key is a valid minor server key");
    true
}

/// Extract the backend segment of a server key.
pub fn parse_backend_id(key: &str) -> Result<String, KeyError> {
    ServerKey::parse(key).map(|k| k.backend_id)
}

/// Extract the server segment of a server key.
pub fn parse_server_id(key: &str) -> Result<String, KeyError> {
    ServerKey::parse(key).map(|k| k.server_id)
}

/// Name of the mirror backend for `backend_id`.
pub fn minor_backend_id(backend_id: &str) -> String {
    format!("{backend_id}{MINOR_SUFFIX}")
}

/// Name of the source backend a mirror backend was derived from.
///
/// `octoblu-sms-minor` becomes `octoblu-sms`. IDs without the suffix are
/// returned unchanged.
pub fn base_backend_id(backend_id: &str) -> &str {
    backend_id.strip_suffix(MINOR_SUFFIX).unwrap_or(backend_id)
}

/// A decomposed server key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerKey {
    pub backend_id: String,
    pub server_id: String,
}

impl ServerKey {
    pub fn new(backend_id: impl Into<String>, server_id: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            server_id: server_id.into(),
        }
    }

    /// Decompose `key`, failing if it is not a server key.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let captures = SERVER_KEY
            .captures(key)
            .ok_or_else(|| KeyError::NotAServerKey(key.to_string()))?;

        Ok(Self::new(&captures[1], &captures[2]))
    }

    /// The etcd path this key was parsed from.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/servers/{}",
            BACKENDS_PREFIX, self.backend_id, self.server_id
        )
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.backend_id, self.server_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_minor_server_key() {
        let key = "/vulcand/backends/octoblu-sms/servers/octoblu-sms-minor-1";
        assert!(is_server_key(key));
        assert!(is_minor_server_key(key));
        assert!(!is_minor_backend_key(key));
        assert!(is_valid_minor_server_key(key));
        assert_eq!(parse_backend_id(key).unwrap(), "octoblu-sms");
        assert_eq!(parse_server_id(key).unwrap(), "octoblu-sms-minor-1");
    }

    #[test]
    fn test_minor_backend_key_is_not_valid() {
        let key = "/vulcand/backends/svc-minor/servers/svc-minor-12";
        assert!(is_server_key(key));
        assert!(is_minor_backend_key(key));
        assert!(!is_valid_minor_server_key(key));
        assert_eq!(parse_backend_id(key).unwrap(), "svc-minor");
    }

    #[test]
    fn test_plain_server_key() {
        let key = "/vulcand/backends/svc/servers/svc-1";
        assert!(is_server_key(key));
        assert!(!is_minor_server_key(key));
        assert!(!is_valid_minor_server_key(key));
    }

    #[test]
    fn test_non_server_keys() {
        let keys = [
            "/vulcand/backends/svc/backend",
            "/vulcand/backends/svc/servers",
            "/vulcand/backends/svc/servers/",
            "/vulcand/backends//servers/svc-minor-1",
            "/vulcand/frontends/svc/servers/svc-minor-1",
            "/other/backends/svc/servers/svc-minor-1",
            "/vulcand/backends/svc/servers/svc-minor-1/extra",
            "",
        ];
        for key in keys {
            assert!(!is_valid_minor_server_key(key), "{key}");
            assert_eq!(
                parse_backend_id(key),
                Err(KeyError::NotAServerKey(key.to_string()))
            );
            assert!(parse_server_id(key).is_err());
        }
    }

    #[test]
    fn test_minor_suffix_requires_digits() {
        assert!(!is_minor_server_key("/vulcand/backends/svc/servers/svc-minor-"));
        assert!(!is_minor_server_key("/vulcand/backends/svc/servers/svc-minor-a"));
        assert!(!is_minor_server_key("/vulcand/backends/svc/servers/svc-minor-1a"));
        assert!(is_minor_server_key("/vulcand/backends/svc/servers/svc-minor-007"));
    }

    #[test]
    fn test_backend_id_helpers() {
        assert_eq!(minor_backend_id("svc"), "svc-minor");
        assert_eq!(base_backend_id("svc-minor"), "svc");
        assert_eq!(base_backend_id("svc"), "svc");
        assert_eq!(base_backend_id("svc-minor-minor"), "svc-minor");
    }

    #[test]
    fn test_server_key_path() {
        let key = ServerKey::new("svc", "svc-minor-1");
        assert_eq!(key.path(), "/vulcand/backends/svc/servers/svc-minor-1");
        assert_eq!(ServerKey::parse(&key.path()).unwrap(), key);
        assert_eq!(key.to_string(), "svc/svc-minor-1");
    }
}
