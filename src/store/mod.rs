//! Local key-value store.
//!
//! The local store is the sole source of truth for synchronous reads. Every
//! entity collection is serialized as JSON under a fixed key; the cloud mirror
//! is only an advisory replica layered on top.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::errors::AppError;

/// Fixed keys for every persisted entry.
pub mod keys {
    pub const ORDERS: &str = "topup_orders";
    pub const VISITORS: &str = "topup_visitors";
    pub const AGENCY_CONFIG: &str = "topup_agency_config";
    pub const USERS: &str = "topup_users";
    pub const CURRENT_SESSION: &str = "topup_current_session_user";
    pub const BANNER_CONFIG: &str = "topup_banner_config";
    pub const APPS_CONFIG: &str = "topup_apps_config";
    pub const CONTACT_CONFIG: &str = "topup_contact_config";
    pub const SITE_CONFIG: &str = "topup_site_config";
    pub const NOTIFICATIONS: &str = "topup_notifications";
}

/// Initialize the backing SQLite database and run migrations.
pub async fn init_store(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

/// Typed JSON read/write wrapper over the `kv` table.
///
/// Missing keys and unparsable values degrade to the caller-supplied default;
/// only storage-level I/O errors propagate.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    /// Read and parse the value under `key`, falling back to `default` when
    /// the key is absent or the stored JSON does not parse.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, AppError> {
        match self.get_raw(key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(value),
                Err(e) => {
                    tracing::warn!("Unparsable value under {}: {}", key, e);
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// Shorthand for `get_or(key, T::default())`.
    pub async fn get_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, AppError> {
        self.get_or(key, T::default()).await
    }

    /// True if the key has ever been written.
    pub async fn contains(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Serialize and write `value` under `key`, replacing any previous value.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Serialize {}: {}", key, e)))?;
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&raw)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove the entry under `key` if present.
    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (LocalStore, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let pool = init_store(&dir.path().join("test.sqlite"))
            .await
            .expect("init store");
        (LocalStore::new(pool), dir)
    }

    #[tokio::test]
    async fn test_missing_key_returns_default() {
        let (store, _dir) = store().await;
        let value: Vec<String> = store.get_or(keys::USERS, Vec::new()).await.unwrap();
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let (store, _dir) = store().await;
        store
            .set(keys::VISITORS, &1250_i64)
            .await
            .expect("set visitors");
        let visitors: i64 = store.get_or(keys::VISITORS, 0).await.unwrap();
        assert_eq!(visitors, 1250);
    }

    #[tokio::test]
    async fn test_unparsable_value_degrades_to_default() {
        let (store, _dir) = store().await;
        // A string is valid JSON for String but not for i64
        store.set(keys::VISITORS, &"not-a-number").await.unwrap();
        let visitors: i64 = store.get_or(keys::VISITORS, 1200).await.unwrap();
        assert_eq!(visitors, 1200);
    }

    #[tokio::test]
    async fn test_remove_clears_key() {
        let (store, _dir) = store().await;
        store.set(keys::SITE_CONFIG, &"x").await.unwrap();
        assert!(store.contains(keys::SITE_CONFIG).await.unwrap());
        store.remove(keys::SITE_CONFIG).await.unwrap();
        assert!(!store.contains(keys::SITE_CONFIG).await.unwrap());
    }
}
