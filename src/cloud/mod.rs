//! Cloud mirror adapter.
//!
//! Best-effort client for a remote document store. Local writes never wait on
//! the mirror; pulls are throttled and overwrite the local copy wholesale when
//! they succeed. A one-way circuit breaker downgrades the process to
//! local-only mode after the first critical backend failure.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;

/// Collection and document names on the remote store.
pub mod collections {
    pub const ORDERS: &str = "orders";
    pub const USERS: &str = "users";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const SETTINGS: &str = "settings";

    pub const DOC_BANNER: &str = "banner";
    pub const DOC_APPS: &str = "apps";
    pub const DOC_CONTACT: &str = "contact";
    pub const DOC_SITE: &str = "site";
    pub const DOC_AGENCY: &str = "agency";
}

/// HTTP client for the document store, carrying the health flag and the
/// pull-throttle timestamp that the original kept as module globals.
pub struct CloudMirror {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    healthy: AtomicBool,
    last_sync_millis: AtomicI64,
    sync_interval: Duration,
    push_batch_limit: usize,
    wipe_batch_limit: usize,
}

impl CloudMirror {
    /// Build the mirror from configuration. Returns `None` (permanent
    /// local-only mode) when the feature flag is off or initialization fails.
    pub fn from_config(config: &Config) -> Option<Arc<Self>> {
        if !config.cloud_enabled {
            tracing::info!("Cloud mirror disabled, running local-only");
            return None;
        }

        let base_url = match reqwest::Url::parse(&config.cloud_base_url) {
            Ok(url) => url.as_str().trim_end_matches('/').to_string(),
            Err(e) => {
                tracing::error!("Cloud mirror init failed ({}), running local-only", e);
                return None;
            }
        };

        tracing::info!("Cloud mirror connected to {}", base_url);

        Some(Arc::new(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.cloud_api_key.clone(),
            healthy: AtomicBool::new(true),
            last_sync_millis: AtomicI64::new(0),
            sync_interval: Duration::from_secs(config.sync_interval_secs),
            push_batch_limit: config.push_batch_limit,
            wipe_batch_limit: config.wipe_batch_limit,
        }))
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn push_batch_limit(&self) -> usize {
        self.push_batch_limit
    }

    pub fn wipe_batch_limit(&self) -> usize {
        self.wipe_batch_limit
    }

    /// Gate for the background pull: at most one caller per interval wins.
    pub fn should_sync(&self) -> bool {
        if !self.is_healthy() {
            return false;
        }
        let now = chrono::Utc::now().timestamp_millis();
        let last = self.last_sync_millis.load(Ordering::Relaxed);
        if now - last < self.sync_interval.as_millis() as i64 {
            return false;
        }
        self.last_sync_millis
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }

    /// Classify a failed response. Not-found and permission-denied conditions
    /// against the backend permanently trip the breaker; everything else is
    /// transient.
    fn note_failure(&self, status: Option<StatusCode>, context: &str, detail: &str) {
        let critical = matches!(
            status,
            Some(StatusCode::NOT_FOUND) | Some(StatusCode::FORBIDDEN)
        );
        if critical {
            if self.healthy.swap(false, Ordering::Relaxed) {
                tracing::error!(
                    "Stopping cloud sync after critical error ({}): {}. Switching to local mode.",
                    context,
                    detail
                );
            }
        } else {
            tracing::warn!("Cloud error ({}): {}", context, detail);
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        builder
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> Option<reqwest::Response> {
        match builder.send().await {
            Ok(response) if response.status().is_success() => Some(response),
            Ok(response) => {
                let status = response.status();
                self.note_failure(Some(status), context, &format!("HTTP {}", status));
                None
            }
            Err(e) => {
                self.note_failure(None, context, &e.to_string());
                None
            }
        }
    }

    /// Fetch a whole collection, optionally ordered and limited.
    /// Returns `None` on any failure.
    pub async fn pull_collection(
        &self,
        name: &str,
        order_field: Option<&str>,
        limit: Option<usize>,
    ) -> Option<Vec<Value>> {
        if !self.is_healthy() {
            return None;
        }
        let mut builder = self.request(reqwest::Method::GET, &format!("/collections/{}", name));
        if let Some(field) = order_field {
            builder = builder.query(&[("orderBy", field), ("order", "desc")]);
        }
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit.to_string())]);
        }
        let response = self.execute(builder, &format!("{} pull", name)).await?;
        match response.json::<Vec<Value>>().await {
            Ok(records) => Some(records),
            Err(e) => {
                self.note_failure(None, &format!("{} pull", name), &e.to_string());
                None
            }
        }
    }

    /// Fetch a single document. A stored JSON `null` means the document was
    /// never written and yields `None` without touching the breaker.
    pub async fn pull_document(&self, collection: &str, id: &str) -> Option<Value> {
        if !self.is_healthy() {
            return None;
        }
        let builder = self.request(
            reqwest::Method::GET,
            &format!("/collections/{}/{}", collection, id),
        );
        let response = self
            .execute(builder, &format!("{}/{} pull", collection, id))
            .await?;
        match response.json::<Value>().await {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                self.note_failure(None, &format!("{}/{} pull", collection, id), &e.to_string());
                None
            }
        }
    }

    /// Upsert one document by id.
    pub async fn push_document<T: Serialize>(&self, collection: &str, id: &str, data: &T) {
        if !self.is_healthy() {
            return;
        }
        let builder = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/{}", collection, id),
            )
            .json(data);
        self.execute(builder, &format!("{}/{} push", collection, id))
            .await;
    }

    /// Apply a partial-field update to one document.
    pub async fn patch_document(&self, collection: &str, id: &str, patch: &Value) {
        if !self.is_healthy() {
            return;
        }
        let builder = self
            .request(
                reqwest::Method::PATCH,
                &format!("/collections/{}/{}", collection, id),
            )
            .json(patch);
        self.execute(builder, &format!("{}/{} patch", collection, id))
            .await;
    }

    /// Upsert many documents, chunked to the per-batch write limit.
    pub async fn push_batch(&self, collection: &str, records: &[(String, Value)]) {
        for chunk in records.chunks(self.push_batch_limit.max(1)) {
            if !self.is_healthy() {
                return;
            }
            let writes: Vec<Value> = chunk
                .iter()
                .map(|(id, data)| serde_json::json!({ "id": id, "data": data }))
                .collect();
            let builder = self
                .request(
                    reqwest::Method::POST,
                    &format!("/collections/{}/batch", collection),
                )
                .json(&serde_json::json!({ "writes": writes }));
            self.execute(builder, &format!("{} batch push", collection))
                .await;
        }
    }

    /// Delete one document by id.
    pub async fn delete_document(&self, collection: &str, id: &str) {
        if !self.is_healthy() {
            return;
        }
        let builder = self.request(
            reqwest::Method::DELETE,
            &format!("/collections/{}/{}", collection, id),
        );
        self.execute(builder, &format!("{}/{} delete", collection, id))
            .await;
    }

    /// Delete up to `wipe_batch_limit` documents from a collection. Returns
    /// `(deleted, partial)`; `partial` is true when the cap was hit and the
    /// collection may still hold records.
    pub async fn delete_collection_capped(&self, collection: &str) -> Option<(usize, bool)> {
        if !self.is_healthy() {
            return None;
        }
        let builder = self
            .request(
                reqwest::Method::DELETE,
                &format!("/collections/{}", collection),
            )
            .query(&[("limit", self.wipe_batch_limit.to_string())]);
        let response = self
            .execute(builder, &format!("{} wipe", collection))
            .await?;
        match response.json::<Value>().await {
            Ok(body) => {
                let deleted = body.get("deleted").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
                Some((deleted, deleted >= self.wipe_batch_limit))
            }
            Err(e) => {
                self.note_failure(None, &format!("{} wipe", collection), &e.to_string());
                None
            }
        }
    }
}
