//! Mirrors minor servers into their `-minor` backends.
//!
//! # Phases
//! ```text
//! Converging: cleanup_orphaned_mirrors → mirror_all_valid_minor_servers
//!     (any error aborts run)
//! Watching:   watch /vulcand/backends from the mirror sweep's index + 1
//!     → mirror_one per minor-server event
//!     (mirror errors are logged, stream errors are fatal)
//! ```

use std::convert::Infallible;

use futures_util::StreamExt;

use crate::etcd::{ChangeEvent, ChangeSource, Listing, StoreError};
use crate::keys::{
    base_backend_id, is_minor_backend_key, is_valid_minor_server_key, minor_backend_id,
    ServerKey, BACKENDS_PREFIX,
};
use crate::observability::metrics;
use crate::sync::error::{SyncError, SyncResult};
use crate::vulcand::{ControlPlane, Gateway};

/// Macro-state of the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Running the two initial sweeps.
    Converging,
    /// Applying watch events one at a time.
    Watching,
}

/// Keeps every `<backend>-minor` backend in sync with the minor servers
/// of `<backend>`.
pub struct Synchronizer<S, C> {
    source: S,
    gateway: Gateway<C>,
    phase: SyncPhase,
}

impl<S: ChangeSource, C: ControlPlane> Synchronizer<S, C> {
    pub fn new(source: S, control_plane: C) -> Self {
        Self {
            source,
            gateway: Gateway::new(control_plane),
            phase: SyncPhase::Converging,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn gateway(&self) -> &Gateway<C> {
        &self.gateway
    }

    fn enter(&mut self, phase: SyncPhase) {
        tracing::info!(from = ?self.phase, to = ?phase, "Synchronizer phase change");
        self.phase = phase;
        metrics::record_phase(phase);
    }

    /// Converge once, then follow the watch stream until it fails.
    ///
    /// Only ever returns an error.
    pub async fn run(&mut self) -> SyncResult<Infallible> {
        self.enter(SyncPhase::Converging);
        self.cleanup_orphaned_mirrors().await?;
        let wait_index = self.mirror_all_valid_minor_servers().await?;

        self.enter(SyncPhase::Watching);
        let mut events = self
            .source
            .watch_recursive(BACKENDS_PREFIX, wait_index)
            .await
            .map_err(|source| SyncError::store("watch_recursive", source))?;

        while let Some(event) = events.next().await {
            let event = event.map_err(|source| SyncError::store("watch_recursive", source))?;
            self.handle_event(&event).await;
        }

        Err(SyncError::store("watch_recursive", StoreError::WatchClosed))
    }

    /// Delete mirror servers whose source server no longer resolves.
    pub async fn cleanup_orphaned_mirrors(&self) -> SyncResult<()> {
        let mirrors: Vec<ServerKey> = self
            .list_keys()
            .await?
            .keys
            .iter()
            .filter(|key| is_minor_backend_key(key))
            .filter_map(|key| ServerKey::parse(key).ok())
            .collect();

        tracing::info!(count = mirrors.len(), "Checking mirror servers for orphans");
        for mirror in &mirrors {
            self.remove_mirror_if_orphaned(mirror).await?;
        }
        Ok(())
    }

    /// Delete `mirror` unless the same server still resolves in the source backend.
    pub async fn remove_mirror_if_orphaned(&self, mirror: &ServerKey) -> SyncResult<()> {
        let source_backend = base_backend_id(&mirror.backend_id);

        let source_url = self
            .gateway
            .server_url(source_backend, &mirror.server_id)
            .await
            .map_err(|source| SyncError::gateway("server_url", mirror, source))?;
        if source_url.is_some() {
            return Ok(());
        }

        tracing::info!(
            backend_id = %mirror.backend_id,
            server_id = %mirror.server_id,
            source_backend,
            "Removing orphaned mirror server"
        );
        self.gateway
            .delete_server(&mirror.backend_id, &mirror.server_id)
            .await
            .map_err(|source| SyncError::gateway("delete_server", mirror, source))
    }

    /// Mirror every valid minor server currently in the store.
    ///
    /// Returns the index a watch must start at to see every later change.
    pub async fn mirror_all_valid_minor_servers(&self) -> SyncResult<Option<u64>> {
        let listing = self.list_keys().await?;
        let servers: Vec<ServerKey> = listing
            .keys
            .iter()
            .filter(|key| is_valid_minor_server_key(key))
            .filter_map(|key| ServerKey::parse(key).ok())
            .collect();

        tracing::info!(count = servers.len(), "Mirroring minor servers");
        for server in &servers {
            self.mirror_one(&server.backend_id, &server.server_id).await?;
        }
        Ok(listing.next_index())
    }

    /// Bring the mirror of one server in line with its source.
    ///
    /// An absent source removes the mirror; a present one ensures the
    /// mirror backend exists and the mirror server carries the same URL.
    pub async fn mirror_one(&self, backend_id: &str, server_id: &str) -> SyncResult<()> {
        let source = ServerKey::new(backend_id, server_id);
        let mirror = ServerKey::new(minor_backend_id(backend_id), server_id);

        let url = self
            .gateway
            .server_url(backend_id, server_id)
            .await
            .map_err(|e| SyncError::gateway("server_url", &source, e))?;

        let Some(url) = url else {
            tracing::debug!(server = %source, "Source server is gone, removing mirror");
            return self
                .gateway
                .delete_server(&mirror.backend_id, server_id)
                .await
                .map_err(|e| SyncError::gateway("delete_server", &mirror, e));
        };

        self.gateway
            .upsert_backend(&mirror.backend_id)
            .await
            .map_err(|e| SyncError::gateway("upsert_backend", &mirror, e))?;
        self.gateway
            .upsert_server(&mirror.backend_id, server_id, &url)
            .await
            .map_err(|e| SyncError::gateway("upsert_server", &mirror, e))
    }

    /// Apply a single watch event. Failures are logged, never returned.
    pub async fn handle_event(&self, event: &ChangeEvent) {
        if !is_valid_minor_server_key(&event.key) {
            tracing::debug!(
                key = %event.key,
                action = %event.action,
                "Skipping non minor server key"
            );
            metrics::record_watch_event(false);
            return;
        }
        metrics::record_watch_event(true);

        let server = match ServerKey::parse(&event.key) {
            Ok(server) => server,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unparseable key");
                return;
            }
        };

        tracing::debug!(key = %event.key, action = %event.action, "Minor server changed");
        if let Err(e) = self.mirror_one(&server.backend_id, &server.server_id).await {
            metrics::record_mirror_failure();
            tracing::error!(error = %e, server = %server, "Failed to mirror server, continuing");
        }
    }

    async fn list_keys(&self) -> SyncResult<Listing> {
        self.source
            .ls_recursive(BACKENDS_PREFIX)
            .await
            .map_err(|source| SyncError::store("ls_recursive", source))
    }
}
