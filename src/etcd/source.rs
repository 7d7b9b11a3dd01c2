//! The change source seam used by the synchronizer.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::etcd::types::{ChangeEvent, Listing, StoreResult};

/// Lazy, non-restartable sequence of change events.
///
/// The stream only ends by yielding an error. Dropping it cancels the watch.
pub type WatchStream = BoxStream<'static, StoreResult<ChangeEvent>>;

/// Read access to the key-value store holding the vulcand configuration.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// List every key under `prefix`, recursively.
    async fn ls_recursive(&self, prefix: &str) -> StoreResult<Listing>;

    /// Subscribe to every mutation under `prefix`.
    ///
    /// With `wait_index`, the first event delivered is the first change at
    /// or after that index. Without it, only changes after the call are seen.
    async fn watch_recursive(
        &self,
        prefix: &str,
        wait_index: Option<u64>,
    ) -> StoreResult<WatchStream>;
}

#[async_trait]
impl<T: ChangeSource + ?Sized> ChangeSource for Arc<T> {
    async fn ls_recursive(&self, prefix: &str) -> StoreResult<Listing> {
        (**self).ls_recursive(prefix).await
    }

    async fn watch_recursive(
        &self,
        prefix: &str,
        wait_index: Option<u64>,
    ) -> StoreResult<WatchStream> {
        (**self).watch_recursive(prefix, wait_index).await
    }
}
