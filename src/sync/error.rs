//! Synchronizer error definitions.

use thiserror::Error;

use crate::etcd::StoreError;
use crate::keys::ServerKey;
use crate::vulcand::GatewayError;

/// Errors that stop a sweep or the watch loop.
///
/// Each variant names the operation that failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing or watching the store failed.
    #[error("{operation} failed: {source}")]
    Store {
        operation: &'static str,
        source: StoreError,
    },

    /// A control plane call failed for one server.
    #[error("{operation} failed for {server}: {source}")]
    Gateway {
        operation: &'static str,
        server: ServerKey,
        source: GatewayError,
    },
}

impl SyncError {
    pub fn store(operation: &'static str, source: StoreError) -> Self {
        SyncError::Store { operation, source }
    }

    pub fn gateway(operation: &'static str, server: &ServerKey, source: GatewayError) -> Self {
        SyncError::Gateway {
            operation,
            server: server.clone(),
            source,
        }
    }
}

/// Result type for synchronizer operations.
pub type SyncResult<T> = Result<T, SyncError>;
