//! vulcand v2 HTTP API client.
//!
//! # Responsibilities
//! - Backend lookup and upsert
//! - Server lookup, upsert and delete
//! - Map 404 to "absent" and everything else non-2xx to `GatewayError`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

use crate::config::VulcandConfig;
use crate::vulcand::control_plane::ControlPlane;
use crate::vulcand::types::{Backend, GatewayError, GatewayResult, Server};

#[derive(Serialize)]
struct BackendPack<'a> {
    #[serde(rename = "Backend")]
    backend: &'a Backend,
}

#[derive(Serialize)]
struct ServerPack<'a> {
    #[serde(rename = "Server")]
    server: &'a Server,
    #[serde(rename = "TTL")]
    ttl: String,
}

/// HTTP client for the vulcand API.
#[derive(Clone)]
pub struct VulcandClient {
    http: reqwest::Client,
    base_url: Url,
}

impl VulcandClient {
    /// Create a new client. No connection is made until the first request.
    pub fn new(config: &VulcandConfig) -> GatewayResult<Self> {
        let invalid = |reason: String| GatewayError::InvalidUri {
            uri: config.uri.clone(),
            reason,
        };

        let base_url = Url::parse(&config.uri).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("cannot be used as a base URL".to_string()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked at construction.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v2").extend(segments);
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> GatewayResult<Option<T>> {
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = check_status(response).await?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl std::fmt::Debug for VulcandClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulcandClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[async_trait]
impl ControlPlane for VulcandClient {
    async fn get_backend(&self, backend_id: &str) -> GatewayResult<Option<Backend>> {
        self.get_json(self.endpoint(&["backends", backend_id])).await
    }

    async fn upsert_backend(&self, backend: &Backend) -> GatewayResult<()> {
        let response = self
            .http
            .post(self.endpoint(&["backends"]))
            .json(&BackendPack { backend })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn get_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<Option<Server>> {
        self.get_json(self.endpoint(&["backends", backend_id, "servers", server_id]))
            .await
    }

    async fn upsert_server(
        &self,
        backend_id: &str,
        server: &Server,
        ttl: Option<Duration>,
    ) -> GatewayResult<()> {
        let pack = ServerPack {
            server,
            ttl: format!("{}s", ttl.unwrap_or_default().as_secs()),
        };
        let response = self
            .http
            .post(self.endpoint(&["backends", backend_id, "servers"]))
            .json(&pack)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_server(&self, backend_id: &str, server_id: &str) -> GatewayResult<bool> {
        let response = self
            .http
            .delete(self.endpoint(&["backends", backend_id, "servers", server_id]))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(response).await?;
        Ok(true)
    }
}

async fn check_status(response: reqwest::Response) -> GatewayResult<String> {
    let status = response.status();
    let text = response.text().await?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(GatewayError::Status {
            status: status.as_u16(),
            body: text,
        })
    }
}
