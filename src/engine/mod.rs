//! Account-state and persistence engine.
//!
//! Every operation follows the same local-first contract: the local store is
//! mutated synchronously (from the caller's point of view the operation is
//! then done), and the cloud mirror is updated fire-and-forget. Read accessors
//! kick off a throttled background pull before returning the local snapshot.

mod accounts;
mod notifications;
mod orders;
mod settings;

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::cloud::{collections, CloudMirror};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AppConfig, BannerConfig, ContactConfig, Order, SiteConfig, User};
use crate::store::{keys, LocalStore};

/// Sentinel id of the synthesized owner session, never present in the user list.
pub const OWNER_SENTINEL_ID: &str = "SUPER_ADMIN";
/// Display serial of the synthesized owner.
pub const OWNER_SERIAL: &str = "00001";
/// Serial number assigned to the very first registered account.
pub const FIRST_SERIAL: i64 = 10001;

/// Visitor counter seed written on first startup.
const VISITOR_SEED: i64 = 1250;
/// Visitor counter fallback when the key is absent or unparsable.
pub(crate) const VISITOR_FALLBACK: i64 = 1200;
/// How many orders a background pull fetches.
const ORDERS_PULL_LIMIT: usize = 100;

/// The engine owns the local store, the optional cloud mirror, and the
/// reserved owner credentials.
pub struct Engine {
    store: LocalStore,
    cloud: Option<Arc<CloudMirror>>,
    owner_email: String,
    owner_password: String,
    default_freeze_hours: i64,
}

impl Engine {
    pub fn new(store: LocalStore, cloud: Option<Arc<CloudMirror>>, config: &Config) -> Self {
        Self {
            store,
            cloud,
            owner_email: config.owner_email.clone(),
            owner_password: config.owner_password.clone(),
            default_freeze_hours: config.default_freeze_hours,
        }
    }

    /// One-time seeding: the visitor counter starts at a fixed value and is
    /// otherwise externally managed.
    pub async fn initialize(&self) -> Result<(), AppError> {
        if !self.store.contains(keys::VISITORS).await? {
            self.store.set(keys::VISITORS, &VISITOR_SEED).await?;
        }
        Ok(())
    }

    pub(crate) fn store(&self) -> &LocalStore {
        &self.store
    }

    pub(crate) fn owner_email(&self) -> &str {
        &self.owner_email
    }

    pub(crate) fn owner_password(&self) -> &str {
        &self.owner_password
    }

    pub(crate) fn default_freeze_hours(&self) -> i64 {
        self.default_freeze_hours
    }

    pub(crate) fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    pub(crate) fn is_owner_email(&self, email: &str) -> bool {
        email == self.owner_email
    }

    /// Run a mirror operation in the background if the cloud is usable.
    pub(crate) fn mirror<F, Fut>(&self, f: F)
    where
        F: FnOnce(Arc<CloudMirror>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Some(cloud) = &self.cloud {
            if cloud.is_healthy() {
                tokio::spawn(f(cloud.clone()));
            }
        }
    }

    pub(crate) fn cloud(&self) -> Option<&Arc<CloudMirror>> {
        self.cloud.as_ref()
    }

    /// Trigger the throttled background pull of the authoritative collections.
    /// Never blocks the calling read.
    pub(crate) fn maybe_sync(&self) {
        let Some(cloud) = &self.cloud else {
            return;
        };
        if !cloud.should_sync() {
            return;
        }
        let cloud = cloud.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            tracing::debug!("Background cloud pull starting");
            sync_orders(&cloud, &store).await;
            sync_users(&cloud, &store).await;
            sync_settings(&cloud, &store).await;
        });
    }
}

fn parse_records<T: serde::de::DeserializeOwned>(records: Vec<Value>, context: &str) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed cloud record ({}): {}", context, e);
                None
            }
        })
        .collect()
}

async fn sync_orders(cloud: &CloudMirror, store: &LocalStore) {
    let Some(records) = cloud
        .pull_collection(collections::ORDERS, Some("timestamp"), Some(ORDERS_PULL_LIMIT))
        .await
    else {
        return;
    };
    let orders: Vec<Order> = parse_records(records, "orders");
    // An empty pull leaves the local copy untouched
    if !orders.is_empty() {
        if let Err(e) = store.set(keys::ORDERS, &orders).await {
            tracing::warn!("Orders pull could not be stored: {}", e);
        }
    }
}

async fn sync_users(cloud: &CloudMirror, store: &LocalStore) {
    let Some(records) = cloud.pull_collection(collections::USERS, None, None).await else {
        return;
    };
    let users: Vec<User> = parse_records(records, "users");
    if !users.is_empty() {
        if let Err(e) = store.set(keys::USERS, &users).await {
            tracing::warn!("Users pull could not be stored: {}", e);
        }
    }
}

async fn sync_settings(cloud: &CloudMirror, store: &LocalStore) {
    if let Some(value) = cloud
        .pull_document(collections::SETTINGS, collections::DOC_BANNER)
        .await
    {
        if let Ok(banner) = serde_json::from_value::<BannerConfig>(value) {
            let _ = store.set(keys::BANNER_CONFIG, &banner).await;
        }
    }

    // The apps document wraps the list as {"list": [...]}
    if let Some(value) = cloud
        .pull_document(collections::SETTINGS, collections::DOC_APPS)
        .await
    {
        if let Some(list) = value.get("list") {
            if let Ok(apps) = serde_json::from_value::<Vec<AppConfig>>(list.clone()) {
                let _ = store.set(keys::APPS_CONFIG, &apps).await;
            }
        }
    }

    if let Some(value) = cloud
        .pull_document(collections::SETTINGS, collections::DOC_CONTACT)
        .await
    {
        if let Ok(contact) = serde_json::from_value::<ContactConfig>(value) {
            let _ = store.set(keys::CONTACT_CONFIG, &contact).await;
        }
    }

    if let Some(value) = cloud
        .pull_document(collections::SETTINGS, collections::DOC_SITE)
        .await
    {
        if let Ok(site) = serde_json::from_value::<SiteConfig>(value) {
            let _ = store.set(keys::SITE_CONFIG, &site).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::store::init_store;
    use tempfile::TempDir;

    pub(crate) fn test_config() -> Config {
        Config {
            db_path: "unused".into(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            owner_email: "owner@test.local".to_string(),
            owner_password: "owner-secret".to_string(),
            cloud_enabled: false,
            cloud_base_url: "http://127.0.0.1:9090".to_string(),
            cloud_api_key: None,
            sync_interval_secs: 5,
            push_batch_limit: 490,
            wipe_batch_limit: 500,
            default_freeze_hours: 24,
        }
    }

    /// Engine over a throwaway sqlite file, cloud mirror disabled.
    pub(crate) async fn engine() -> (Engine, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let pool = init_store(&dir.path().join("test.sqlite"))
            .await
            .expect("init store");
        let engine = Engine::new(LocalStore::new(pool), None, &test_config());
        engine.initialize().await.expect("initialize");
        (engine, dir)
    }
}
