//! The control plane seam used by the gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::vulcand::types::{Backend, GatewayResult, Server};

/// Raw backend/server access to the load balancer's control API.
///
/// Lookups return `Ok(None)` when the resource does not exist.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn get_backend(&self, backend_id: &str) -> GatewayResult<Option<Backend>>;

    async fn upsert_backend(&self, backend: &Backend) -> GatewayResult<()>;

    async fn get_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<Option<Server>>;

    /// Create or overwrite `server`. `None` means no expiry.
    async fn upsert_server(
        &self,
        backend_id: &str,
        server: &Server,
        ttl: Option<Duration>,
    ) -> GatewayResult<()>;

    /// Delete a server. Returns false if it was already gone.
    async fn delete_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<bool>;
}

#[async_trait]
impl<T: ControlPlane + ?Sized> ControlPlane for Arc<T> {
    async fn get_backend(&self, backend_id: &str) -> GatewayResult<Option<Backend>> {
        (**self).get_backend(backend_id).await
    }

    async fn upsert_backend(&self, backend: &Backend) -> GatewayResult<()> {
        (**self).upsert_backend(backend).await
    }

    async fn get_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<Option<Server>> {
        (**self).get_server(backend_id, server_id).await
    }

    async fn upsert_server(
        &self,
        backend_id: &str,
        server: &Server,
        ttl: Option<Duration>,
    ) -> GatewayResult<()> {
        (**self).upsert_server(backend_id, server, ttl).await
    }

    async fn delete_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<bool> {
        (**self).delete_server(backend_id, server_id).await
    }
}
