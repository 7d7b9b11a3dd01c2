//! vulcand API types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend type used for every backend this crate creates.
pub const HTTP_BACKEND_TYPE: &str = "http";

/// A backend (named group of servers) as exposed by the vulcand API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "Type")]
    pub kind: String,

    #[serde(rename = "Settings", default)]
    pub settings: serde_json::Value,
}

impl Backend {
    /// An HTTP backend with empty (server-default) settings.
    pub fn http(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: HTTP_BACKEND_TYPE.to_string(),
            settings: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// A server registered under a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "URL")]
    pub url: String,
}

impl Server {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Errors that can occur while talking to the control plane.
///
/// A missing backend or server is not an error; lookups return `None`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The configured URI could not be used as an API base.
    #[error("invalid vulcand URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Transport failure (connect, timeout, body read).
    #[error("vulcand request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// vulcand rejected the request.
    #[error("vulcand returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode vulcand response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for control plane operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
