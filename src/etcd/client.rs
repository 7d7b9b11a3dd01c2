//! etcd v2 keys API client.
//!
//! # Responsibilities
//! - Recursive listing of a key prefix, with the store index it was taken at
//! - Recursive long-poll watch from a given index, exposed as a lazy stream
//! - Map etcd error bodies into `StoreError`

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use url::Url;

use crate::config::EtcdConfig;
use crate::etcd::source::{ChangeSource, WatchStream};
use crate::etcd::types::{
    ChangeEvent, ErrorBody, KeysResponse, Listing, StoreError, StoreResult, EVENT_INDEX_CLEARED,
    KEY_NOT_FOUND,
};

const ETCD_INDEX_HEADER: &str = "X-Etcd-Index";

/// HTTP client for the etcd v2 keys API.
#[derive(Clone)]
pub struct EtcdClient {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl EtcdClient {
    /// Create a new client. No connection is made until the first request.
    pub fn new(config: &EtcdConfig) -> StoreResult<Self> {
        let base_url = Url::parse(&config.uri).map_err(|e| StoreError::InvalidUri {
            uri: config.uri.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn keys_url(&self, prefix: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if prefix.starts_with('/') {
            format!("{base}/v2/keys{prefix}")
        } else {
            format!("{base}/v2/keys/{prefix}")
        }
    }

    /// Block until the next change under `prefix`.
    ///
    /// Long-polls carry no request timeout; only connecting is bounded.
    async fn wait(&self, prefix: &str, wait_index: Option<u64>) -> StoreResult<KeysResponse> {
        let mut request = self
            .http
            .get(self.keys_url(prefix))
            .query(&[("wait", "true"), ("recursive", "true")]);
        if let Some(index) = wait_index {
            request = request.query(&[("waitIndex", index)]);
        }

        decode(request.send().await?).await
    }
}

impl std::fmt::Debug for EtcdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdClient")
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[async_trait]
impl ChangeSource for EtcdClient {
    async fn ls_recursive(&self, prefix: &str) -> StoreResult<Listing> {
        let response = self
            .http
            .get(self.keys_url(prefix))
            .query(&[("recursive", "true")])
            .timeout(self.request_timeout)
            .send()
            .await?;
        let index = etcd_index(&response);

        match decode(response).await {
            Ok(body) => {
                let mut keys = Vec::new();
                body.node.flatten_keys(&mut keys);
                tracing::debug!(prefix, count = keys.len(), ?index, "Listed etcd keys");
                Ok(Listing { keys, index })
            }
            Err(StoreError::Etcd {
                code: KEY_NOT_FOUND,
                index: error_index,
                ..
            }) => {
                tracing::debug!(prefix, "Prefix does not exist yet, nothing to list");
                Ok(Listing {
                    keys: Vec::new(),
                    index: index.or(Some(error_index)),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn watch_recursive(
        &self,
        prefix: &str,
        wait_index: Option<u64>,
    ) -> StoreResult<WatchStream> {
        tracing::info!(prefix, ?wait_index, "Watching etcd prefix");
        Ok(watch_stream(self.clone(), prefix.to_string(), wait_index))
    }
}

struct WatchCursor {
    client: EtcdClient,
    prefix: String,
    wait_index: Option<u64>,
}

fn watch_stream(client: EtcdClient, prefix: String, wait_index: Option<u64>) -> WatchStream {
    let cursor = WatchCursor {
        client,
        prefix,
        wait_index,
    };

    stream::try_unfold(cursor, |mut cursor| async move {
        match cursor.client.wait(&cursor.prefix, cursor.wait_index).await {
            Ok(response) => {
                cursor.wait_index = Some(response.node.modified_index + 1);
                let event = ChangeEvent {
                    action: response.action,
                    key: response.node.key,
                    value: response.node.value,
                };
                Ok(Some((event, cursor)))
            }
            Err(e) => {
                if let StoreError::Etcd {
                    code: EVENT_INDEX_CLEARED,
                    index,
                    ..
                } = &e
                {
                    tracing::warn!(
                        requested = ?cursor.wait_index,
                        current = index,
                        "etcd event history cleared, changes were missed"
                    );
                }
                Err(e)
            }
        }
    })
    .boxed()
}

fn etcd_index(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(ETCD_INDEX_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

async fn decode(response: reqwest::Response) -> StoreResult<KeysResponse> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&text)?);
    }

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => Err(body.into()),
        Err(_) => Err(StoreError::Status {
            status: status.as_u16(),
            body: text,
        }),
    }
}
