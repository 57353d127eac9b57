//! Configuration entities: singleton-per-key documents with hardcoded
//! fallback defaults. No versioning; last write wins.

use serde::{Deserialize, Serialize};

/// Site identity shown in the storefront header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub name: String,
    pub slogan: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "TopUp Store".to_string(),
            slogan: "Instant game top-up services".to_string(),
        }
    }
}

/// Hero banner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerConfig {
    pub is_visible: bool,
    pub title: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub style: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            is_visible: true,
            title: "Welcome to the store".to_string(),
            subtitle: "Top up your favorite games in seconds".to_string(),
            image_url: None,
            style: "gradient".to_string(),
        }
    }
}

/// A supported game/app with its coin exchange rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub id: String,
    pub name: String,
    pub exchange_rate: f64,
    pub is_active: bool,
}

/// Contact channels shown to customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactConfig {
    pub whatsapp: String,
    pub telegram: String,
    pub email: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            whatsapp: String::new(),
            telegram: String::new(),
            email: "support@example.com".to_string(),
        }
    }
}

/// Agency integration parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyConfig {
    pub agency_url: String,
    pub api_key: String,
    pub is_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<i64>,
}

/// Default supported apps list, used when no apps config was ever saved.
pub fn default_app_configs() -> Vec<AppConfig> {
    vec![
        AppConfig {
            id: "pubg-uc".to_string(),
            name: "PUBG Mobile UC".to_string(),
            exchange_rate: 1.0,
            is_active: true,
        },
        AppConfig {
            id: "freefire-diamonds".to_string(),
            name: "Free Fire Diamonds".to_string(),
            exchange_rate: 0.9,
            is_active: true,
        },
    ]
}

/// Request body for registering a new supported app.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAppRequest {
    pub name: String,
    pub exchange_rate: f64,
}
