//! Shared utilities for synchronizer integration tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use minor_sync::etcd::{ChangeEvent, ChangeSource, Listing, StoreError, StoreResult, WatchStream};
use minor_sync::vulcand::MemoryControlPlane;

type Mutation = Box<dyn FnOnce(&MemoryControlPlane) + Send>;

struct Step {
    mutation: Option<Mutation>,
    event: StoreResult<ChangeEvent>,
}

/// A change source that mirrors a `MemoryControlPlane`.
///
/// Listings are derived from the servers currently registered and carry a
/// store index that grows with every listing. The watch
/// replays scripted steps; each step may mutate the control plane right
/// before its event is delivered, like a real write followed by its etcd
/// notification.
pub struct ScriptedSource {
    control_plane: Arc<MemoryControlPlane>,
    steps: Mutex<Vec<Step>>,
    fail_listing: AtomicBool,
    index: AtomicU64,
    watched_from: Mutex<Vec<Option<u64>>>,
}

impl ScriptedSource {
    pub fn new(control_plane: Arc<MemoryControlPlane>) -> Self {
        Self {
            control_plane,
            steps: Mutex::new(Vec::new()),
            fail_listing: AtomicBool::new(false),
            index: AtomicU64::new(0),
            watched_from: Mutex::new(Vec::new()),
        }
    }

    /// Apply `mutation`, then deliver a `set` event for `key`.
    pub fn on_change<F>(&self, key: &str, mutation: F)
    where
        F: FnOnce(&MemoryControlPlane) + Send + 'static,
    {
        self.push(Some(Box::new(mutation)), Ok(set_event(key)));
    }

    /// Deliver a `set` event for `key` without changing anything.
    pub fn touch(&self, key: &str) {
        self.push(None, Ok(set_event(key)));
    }

    /// Terminate the watch with `error`.
    pub fn fail_watch(&self, error: StoreError) {
        self.push(None, Err(error));
    }

    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    /// Start the store index at `index`; the next listing reports `index + 1`.
    pub fn set_index(&self, index: u64) {
        self.index.store(index, Ordering::SeqCst);
    }

    /// `wait_index` of every watch opened so far.
    pub fn watched_from(&self) -> Vec<Option<u64>> {
        self.watched_from.lock().unwrap().clone()
    }

    fn push(&self, mutation: Option<Mutation>, event: StoreResult<ChangeEvent>) {
        self.steps.lock().unwrap().push(Step { mutation, event });
    }
}

#[async_trait]
impl ChangeSource for ScriptedSource {
    async fn ls_recursive(&self, _prefix: &str) -> StoreResult<Listing> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "etcd unavailable".to_string(),
            });
        }

        let mut keys = vec![
            "/vulcand/backends".to_string(),
            "/vulcand/backends/svc/backend".to_string(),
        ];
        keys.extend(self.control_plane.keys());
        Ok(Listing {
            keys,
            index: Some(self.index.fetch_add(1, Ordering::SeqCst) + 1),
        })
    }

    async fn watch_recursive(
        &self,
        _prefix: &str,
        wait_index: Option<u64>,
    ) -> StoreResult<WatchStream> {
        self.watched_from.lock().unwrap().push(wait_index);
        let steps = std::mem::take(&mut *self.steps.lock().unwrap());
        let control_plane = self.control_plane.clone();

        Ok(stream::iter(steps)
            .map(move |step| {
                if let Some(mutation) = step.mutation {
                    mutation(&control_plane);
                }
                step.event
            })
            .boxed())
    }
}

pub fn set_event(key: &str) -> ChangeEvent {
    ChangeEvent {
        action: "set".to_string(),
        key: key.to_string(),
        value: Some("{}".to_string()),
    }
}

pub fn server_key(backend_id: &str, server_id: &str) -> String {
    format!("/vulcand/backends/{backend_id}/servers/{server_id}")
}
