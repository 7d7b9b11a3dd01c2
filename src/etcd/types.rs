//! etcd v2 wire types and error definitions.

use serde::Deserialize;
use thiserror::Error;

/// etcd error code for a missing key.
pub const KEY_NOT_FOUND: u64 = 100;

/// etcd error code for a `waitIndex` that fell out of the event history.
pub const EVENT_INDEX_CLEARED: u64 = 401;

/// Errors that can occur while talking to etcd.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The configured URI could not be parsed.
    #[error("invalid etcd URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Transport failure (connect, timeout, body read).
    #[error("etcd request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// etcd answered with a structured error.
    #[error("etcd error {code}: {message} ({cause})")]
    Etcd {
        code: u64,
        message: String,
        cause: String,
        index: u64,
    },

    /// etcd answered with a status and a body that is not an etcd error.
    #[error("etcd returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode etcd response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The watch ended without reporting an error.
    #[error("etcd watch closed")]
    WatchClosed,
}

/// Result type for etcd operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Keys under a prefix, and the store index the listing was taken at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub keys: Vec<String>,
    /// `X-Etcd-Index` of the response, if etcd sent one.
    pub index: Option<u64>,
}

impl Listing {
    /// Index a watch must start at to see every change after this listing.
    pub fn next_index(&self) -> Option<u64> {
        self.index.map(|index| index + 1)
    }
}

/// A single mutation observed under a watched prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// etcd action (`set`, `create`, `update`, `delete`, `expire`, ...).
    pub action: String,
    /// Full key that changed.
    pub key: String,
    /// New value, absent for deletions and directories.
    pub value: Option<String>,
}

/// Body of every successful etcd v2 keys response.
#[derive(Debug, Clone, Deserialize)]
pub struct KeysResponse {
    pub action: String,
    pub node: Node,
}

/// A node of the etcd v2 key tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub dir: bool,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub modified_index: u64,
}

impl Node {
    /// Collect this node's key and every descendant key, depth first.
    pub fn flatten_keys(&self, keys: &mut Vec<String>) {
        keys.push(self.key.clone());
        for child in &self.nodes {
            child.flatten_keys(keys);
        }
    }
}

/// Body of an etcd v2 error response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: u64,
    pub message: String,
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub index: u64,
}

impl From<ErrorBody> for StoreError {
    fn from(body: ErrorBody) -> Self {
        StoreError::Etcd {
            code: body.error_code,
            message: body.message,
            cause: body.cause,
            index: body.index,
        }
    }
}
