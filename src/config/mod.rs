//! Configuration module for the top-up backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite file backing the local key-value store
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Reserved owner (super-admin) email
    pub owner_email: String,
    /// Reserved owner password
    pub owner_password: String,
    /// Whether the cloud mirror is enabled at all
    pub cloud_enabled: bool,
    /// Base URL of the cloud document store
    pub cloud_base_url: String,
    /// API key sent with every cloud request
    pub cloud_api_key: Option<String>,
    /// Minimum seconds between background cloud pulls
    pub sync_interval_secs: u64,
    /// Maximum records per batched cloud write
    pub push_batch_limit: usize,
    /// Maximum records deleted per global-wipe cloud call
    pub wipe_batch_limit: usize,
    /// Default duration of a temporary freeze, in hours
    pub default_freeze_hours: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("TOPUP_DB_PATH")
            .unwrap_or_else(|_| "./data/store.sqlite".to_string())
            .into();

        let bind_addr = env::var("TOPUP_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid TOPUP_BIND_ADDR format");

        let log_level = env::var("TOPUP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let owner_email =
            env::var("TOPUP_OWNER_EMAIL").unwrap_or_else(|_| "admin@haneen.com".to_string());
        let owner_password =
            env::var("TOPUP_OWNER_PASSWORD").unwrap_or_else(|_| "zxcvbnmn123".to_string());

        let cloud_enabled = env::var("TOPUP_CLOUD_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let cloud_base_url =
            env::var("TOPUP_CLOUD_URL").unwrap_or_else(|_| "http://127.0.0.1:9090".to_string());

        let cloud_api_key = env::var("TOPUP_CLOUD_API_KEY").ok();

        let sync_interval_secs = env::var("TOPUP_SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let push_batch_limit = env::var("TOPUP_PUSH_BATCH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(490);

        let wipe_batch_limit = env::var("TOPUP_WIPE_BATCH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        let default_freeze_hours = env::var("TOPUP_DEFAULT_FREEZE_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);

        Self {
            db_path,
            bind_addr,
            log_level,
            owner_email,
            owner_password,
            cloud_enabled,
            cloud_base_url,
            cloud_api_key,
            sync_interval_secs,
            push_batch_limit,
            wipe_batch_limit,
            default_freeze_hours,
        }
    }
}
