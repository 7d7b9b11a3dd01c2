//! In-process control plane for tests.
//!
//! Holds backends and servers in memory and records every write, so
//! callers can assert exactly which mutations a reconciliation produced.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::keys::ServerKey;
use crate::vulcand::control_plane::ControlPlane;
use crate::vulcand::types::{Backend, GatewayError, GatewayResult, Server};

/// A mutation applied through the `ControlPlane` interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    UpsertBackend {
        backend_id: String,
    },
    UpsertServer {
        backend_id: String,
        server_id: String,
        url: String,
    },
    DeleteServer {
        backend_id: String,
        server_id: String,
    },
}

#[derive(Debug, Default)]
struct State {
    backends: HashMap<String, Backend>,
    servers: HashMap<(String, String), Server>,
    writes: Vec<Write>,
    fail_writes: bool,
}

/// Control plane backed by in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryControlPlane {
    state: Mutex<State>,
}

impl MemoryControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a server (and its backend) without recording a write.
    pub fn insert_server(&self, backend_id: &str, server_id: &str, url: &str) {
        let mut state = self.state();
        state
            .backends
            .entry(backend_id.to_string())
            .or_insert_with(|| Backend::http(backend_id));
        state.servers.insert(
            (backend_id.to_string(), server_id.to_string()),
            Server::new(server_id, url),
        );
    }

    /// Remove a server without recording a write.
    pub fn remove_server(&self, backend_id: &str, server_id: &str) {
        self.state()
            .servers
            .remove(&(backend_id.to_string(), server_id.to_string()));
    }

    /// Make every subsequent write fail with a 500.
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    pub fn server(&self, backend_id: &str, server_id: &str) -> Option<Server> {
        self.state()
            .servers
            .get(&(backend_id.to_string(), server_id.to_string()))
            .cloned()
    }

    pub fn has_backend(&self, backend_id: &str) -> bool {
        self.state().backends.contains_key(backend_id)
    }

    /// etcd paths of every registered server, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state()
            .servers
            .keys()
            .map(|(backend_id, server_id)| ServerKey::new(backend_id, server_id).path())
            .collect();
        keys.sort();
        keys
    }

    /// Writes recorded so far, oldest first.
    pub fn writes(&self) -> Vec<Write> {
        self.state().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state().writes.clear();
    }

    fn record(&self, write: Write) -> GatewayResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(GatewayError::Status {
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        state.writes.push(write);
        Ok(state)
    }
}

#[async_trait]
impl ControlPlane for MemoryControlPlane {
    async fn get_backend(&self, backend_id: &str) -> GatewayResult<Option<Backend>> {
        Ok(self.state().backends.get(backend_id).cloned())
    }

    async fn upsert_backend(&self, backend: &Backend) -> GatewayResult<()> {
        let mut state = self.record(Write::UpsertBackend {
            backend_id: backend.id.clone(),
        })?;
        state.backends.insert(backend.id.clone(), backend.clone());
        Ok(())
    }

    async fn get_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<Option<Server>> {
        Ok(self.server(backend_id, server_id))
    }

    async fn upsert_server(
        &self,
        backend_id: &str,
        server: &Server,
        _ttl: Option<Duration>,
    ) -> GatewayResult<()> {
        let mut state = self.record(Write::UpsertServer {
            backend_id: backend_id.to_string(),
            server_id: server.id.clone(),
            url: server.url.clone(),
        })?;
        state
            .servers
            .insert((backend_id.to_string(), server.id.clone()), server.clone());
        Ok(())
    }

    async fn delete_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<bool> {
        let mut state = self.record(Write::DeleteServer {
            backend_id: backend_id.to_string(),
            server_id: server_id.to_string(),
        })?;
        Ok(state
            .servers
            .remove(&(backend_id.to_string(), server_id.to_string()))
            .is_some())
    }
}
