//! Idempotent control plane operations.
//!
//! # Responsibilities
//! - Read a server's URL, treating "not found" as absent
//! - Create a backend or server only when it is missing or stale
//! - Delete a server only when it exists
//!
//! Every mutation the synchronizer performs goes through this type.

use crate::observability::metrics;
use crate::vulcand::control_plane::ControlPlane;
use crate::vulcand::types::{Backend, GatewayResult, Server};

/// The synchronizer's write surface into the load balancer.
#[derive(Debug)]
pub struct Gateway<C> {
    control_plane: C,
}

impl<C: ControlPlane> Gateway<C> {
    pub fn new(control_plane: C) -> Self {
        Self { control_plane }
    }

    /// Get the underlying control plane.
    pub fn control_plane(&self) -> &C {
        &self.control_plane
    }

    /// URL registered for `server_id` under `backend_id`, if any.
    ///
    /// A server with an empty URL is treated as absent.
    pub async fn server_url(
        &self,
        backend_id: &str,
        server_id: &str,
    ) -> GatewayResult<Option<String>> {
        let server = self.control_plane.get_server(backend_id, server_id).await?;
        Ok(server.map(|s| s.url).filter(|url| !url.is_empty()))
    }

    /// Delete a server if it exists.
    pub async fn delete_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<()> {
        tracing::debug!(backend_id, server_id, "delete_server");

        if self
            .control_plane
            .get_server(backend_id, server_id)
            .await?
            .is_none()
        {
            tracing::debug!(backend_id, server_id, "Server doesn't exist, doing nothing");
            return Ok(());
        }

        let deleted = self.control_plane.delete_server(backend_id, server_id).await?;
        if deleted {
            metrics::record_write("delete_server");
            tracing::info!(backend_id, server_id, "Deleted server");
        } else {
            tracing::debug!(backend_id, server_id, "Server disappeared before delete");
        }
        Ok(())
    }

    /// Create an HTTP backend unless one with this ID already exists.
    pub async fn upsert_backend(&self, backend_id: &str) -> GatewayResult<()> {
        tracing::debug!(backend_id, "upsert_backend");

        if self.control_plane.get_backend(backend_id).await?.is_some() {
            tracing::debug!(backend_id, "Backend is already there, doing nothing");
            return Ok(());
        }

        self.control_plane
            .upsert_backend(&Backend::http(backend_id))
            .await?;
        metrics::record_write("upsert_backend");
        tracing::info!(backend_id, "Created backend");
        Ok(())
    }

    /// Register `server_id` with `url` unless it is already registered with it.
    ///
    /// The backend must already exist.
    pub async fn upsert_server(
        &self,
        backend_id: &str,
        server_id: &str,
        url: &str,
    ) -> GatewayResult<()> {
        tracing::debug!(backend_id, server_id, url, "upsert_server");

        match self.control_plane.get_server(backend_id, server_id).await? {
            Some(existing) if existing.url == url => {
                tracing::debug!(backend_id, server_id, "Server is up to date, doing nothing");
                return Ok(());
            }
            Some(existing) => {
                tracing::debug!(
                    backend_id,
                    server_id,
                    old_url = %existing.url,
                    "Server URL is out of date"
                );
            }
            None => {
                tracing::debug!(backend_id, server_id, "Server is missing");
            }
        }

        self.control_plane
            .upsert_server(backend_id, &Server::new(server_id, url), None)
            .await?;
        metrics::record_write("upsert_server");
        tracing::info!(backend_id, server_id, url, "Upserted server");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulcand::memory::{MemoryControlPlane, Write};
    use async_trait::async_trait;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::time::Duration;

    /// A server that is listed but already gone by the time it is deleted.
    struct VanishingServer;

    #[async_trait]
    impl ControlPlane for VanishingServer {
        async fn get_backend(&self, _backend_id: &str) -> GatewayResult<Option<Backend>> {
            Ok(None)
        }

        async fn upsert_backend(&self, _backend: &Backend) -> GatewayResult<()> {
            Ok(())
        }

        async fn get_server(
            &self,
            _backend_id: &str,
            server_id: &str,
        ) -> GatewayResult<Option<Server>> {
            Ok(Some(Server::new(server_id, "http://a")))
        }

        async fn upsert_server(
            &self,
            _backend_id: &str,
            _server: &Server,
            _ttl: Option<Duration>,
        ) -> GatewayResult<()> {
            Ok(())
        }

        async fn delete_server(&self, _backend_id: &str, _server_id: &str) -> GatewayResult<bool> {
            Ok(false)
        }
    }

    /// Run `delete_server` against `control_plane` and render the recorded metrics.
    fn delete_and_render<C: ControlPlane>(control_plane: C) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let gateway = Gateway::new(control_plane);

        ::metrics::with_local_recorder(&recorder, || {
            runtime
                .block_on(gateway.delete_server("svc-minor", "svc-minor-1"))
                .unwrap()
        });
        handle.render()
    }

    fn gateway() -> Gateway<MemoryControlPlane> {
        Gateway::new(MemoryControlPlane::new())
    }

    #[tokio::test]
    async fn test_server_url() {
        let gateway = gateway();
        gateway.control_plane().insert_server("svc", "svc-minor-1", "http://a");
        gateway.control_plane().insert_server("svc", "svc-minor-2", "");

        assert_eq!(
            gateway.server_url("svc", "svc-minor-1").await.unwrap().as_deref(),
            Some("http://a")
        );
        assert_eq!(gateway.server_url("svc", "svc-minor-2").await.unwrap(), None);
        assert_eq!(gateway.server_url("svc", "svc-minor-3").await.unwrap(), None);
        assert_eq!(gateway.server_url("other", "svc-minor-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_server_is_noop() {
        let gateway = gateway();
        gateway.delete_server("svc-minor", "svc-minor-1").await.unwrap();
        assert!(gateway.control_plane().writes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_existing_server() {
        let gateway = gateway();
        gateway.control_plane().insert_server("svc-minor", "svc-minor-1", "http://a");

        gateway.delete_server("svc-minor", "svc-minor-1").await.unwrap();
        assert_eq!(
            gateway.control_plane().writes(),
            vec![Write::DeleteServer {
                backend_id: "svc-minor".into(),
                server_id: "svc-minor-1".into(),
            }]
        );
        assert!(gateway.control_plane().server("svc-minor", "svc-minor-1").is_none());
    }

    #[tokio::test]
    async fn test_upsert_backend_once() {
        let gateway = gateway();
        gateway.upsert_backend("svc-minor").await.unwrap();
        gateway.upsert_backend("svc-minor").await.unwrap();

        assert!(gateway.control_plane().has_backend("svc-minor"));
        assert_eq!(
            gateway.control_plane().writes(),
            vec![Write::UpsertBackend {
                backend_id: "svc-minor".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_upsert_server_only_when_stale() {
        let gateway = gateway();
        gateway.upsert_server("svc-minor", "svc-minor-1", "http://a").await.unwrap();
        gateway.upsert_server("svc-minor", "svc-minor-1", "http://a").await.unwrap();
        gateway.upsert_server("svc-minor", "svc-minor-1", "http://b").await.unwrap();

        let writes = gateway.control_plane().writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(
            writes[1],
            Write::UpsertServer {
                backend_id: "svc-minor".into(),
                server_id: "svc-minor-1".into(),
                url: "http://b".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let gateway = gateway();
        gateway.control_plane().fail_writes(true);
        assert!(gateway.upsert_backend("svc-minor").await.is_err());
        assert!(gateway
            .upsert_server("svc-minor", "svc-minor-1", "http://a")
            .await
            .is_err());
    }

    #[test]
    fn test_delete_counts_only_removed_servers() {
        let control_plane = MemoryControlPlane::new();
        control_plane.insert_server("svc-minor", "svc-minor-1", "http://a");
        let rendered = delete_and_render(control_plane);
        assert!(rendered.contains(r#"op="delete_server""#), "{rendered}");

        let rendered = delete_and_render(VanishingServer);
        assert!(!rendered.contains(r#"op="delete_server""#), "{rendered}");
    }
}
