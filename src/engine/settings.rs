//! Configuration store: get/set pairs per entity with hardcoded fallbacks.

use super::Engine;
use crate::cloud::collections;
use crate::errors::AppError;
use crate::models::{
    AgencyConfig, AppConfig, BannerConfig, ContactConfig, SiteConfig, default_app_configs,
};
use crate::store::keys;

/// Legacy site names filtered out on every read; a stored config carrying one
/// of these is replaced by the default.
const DISALLOWED_SITE_NAMES: &[&str] = &["Haneen Store", "منصة حنين للشحن"];

impl Engine {
    // ==================== SITE ====================

    /// Site config with the one-way legacy-name sanitizer applied.
    pub async fn site_config(&self) -> Result<SiteConfig, AppError> {
        let config: SiteConfig = self.store().get_or_default(keys::SITE_CONFIG).await?;
        if DISALLOWED_SITE_NAMES.contains(&config.name.as_str()) {
            return Ok(SiteConfig::default());
        }
        Ok(config)
    }

    pub async fn save_site_config(&self, config: &SiteConfig) -> Result<(), AppError> {
        self.store().set(keys::SITE_CONFIG, config).await?;
        let mirrored = config.clone();
        self.mirror(move |cloud| async move {
            cloud
                .push_document(collections::SETTINGS, collections::DOC_SITE, &mirrored)
                .await;
        });
        Ok(())
    }

    // ==================== BANNER ====================

    pub async fn banner_config(&self) -> Result<BannerConfig, AppError> {
        self.store().get_or_default(keys::BANNER_CONFIG).await
    }

    pub async fn save_banner_config(&self, config: &BannerConfig) -> Result<(), AppError> {
        self.store().set(keys::BANNER_CONFIG, config).await?;
        let mirrored = config.clone();
        self.mirror(move |cloud| async move {
            cloud
                .push_document(collections::SETTINGS, collections::DOC_BANNER, &mirrored)
                .await;
        });
        Ok(())
    }

    // ==================== CONTACT ====================

    pub async fn contact_config(&self) -> Result<ContactConfig, AppError> {
        self.store().get_or_default(keys::CONTACT_CONFIG).await
    }

    pub async fn save_contact_config(&self, config: &ContactConfig) -> Result<(), AppError> {
        self.store().set(keys::CONTACT_CONFIG, config).await?;
        let mirrored = config.clone();
        self.mirror(move |cloud| async move {
            cloud
                .push_document(collections::SETTINGS, collections::DOC_CONTACT, &mirrored)
                .await;
        });
        Ok(())
    }

    // ==================== AGENCY ====================

    pub async fn agency_config(&self) -> Result<AgencyConfig, AppError> {
        self.store().get_or_default(keys::AGENCY_CONFIG).await
    }

    pub async fn save_agency_config(&self, config: &AgencyConfig) -> Result<(), AppError> {
        self.store().set(keys::AGENCY_CONFIG, config).await?;
        let mirrored = config.clone();
        self.mirror(move |cloud| async move {
            cloud
                .push_document(collections::SETTINGS, collections::DOC_AGENCY, &mirrored)
                .await;
        });
        Ok(())
    }

    // ==================== APPS ====================

    pub async fn app_configs(&self) -> Result<Vec<AppConfig>, AppError> {
        self.store()
            .get_or(keys::APPS_CONFIG, default_app_configs())
            .await
    }

    pub async fn save_app_configs(&self, apps: &[AppConfig]) -> Result<(), AppError> {
        self.store().set(keys::APPS_CONFIG, &apps).await?;
        // Mirrored wrapped as {"list": [...]}
        let wrapped = serde_json::json!({ "list": apps });
        self.mirror(move |cloud| async move {
            cloud
                .push_document(collections::SETTINGS, collections::DOC_APPS, &wrapped)
                .await;
        });
        Ok(())
    }

    /// Append a new active app with a generated id.
    pub async fn add_app(&self, name: &str, exchange_rate: f64) -> Result<AppConfig, AppError> {
        let mut apps = self.app_configs().await?;
        let app = AppConfig {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            exchange_rate,
            is_active: true,
        };
        apps.push(app.clone());
        self.save_app_configs(&apps).await?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::engine;
    use super::*;
    use crate::store::keys;

    #[tokio::test]
    async fn test_site_config_defaults_when_absent() {
        let (engine, _dir) = engine().await;
        let config = engine.site_config().await.unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[tokio::test]
    async fn test_site_config_round_trip() {
        let (engine, _dir) = engine().await;
        let config = SiteConfig {
            name: "Star Top-Up".to_string(),
            slogan: "Fast and safe".to_string(),
        };
        engine.save_site_config(&config).await.unwrap();
        assert_eq!(engine.site_config().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_site_sanitizer_filters_legacy_names() {
        let (engine, _dir) = engine().await;
        let legacy = SiteConfig {
            name: "Haneen Store".to_string(),
            slogan: "old".to_string(),
        };
        engine.save_site_config(&legacy).await.unwrap();
        // The stored value is overridden on read
        assert_eq!(engine.site_config().await.unwrap(), SiteConfig::default());
    }

    #[tokio::test]
    async fn test_unparsable_config_degrades_to_default() {
        let (engine, _dir) = engine().await;
        engine
            .store()
            .set(keys::BANNER_CONFIG, &42)
            .await
            .unwrap();
        let banner = engine.banner_config().await.unwrap();
        assert_eq!(banner.style, BannerConfig::default().style);
    }

    #[tokio::test]
    async fn test_add_app_appends_active_entry() {
        let (engine, _dir) = engine().await;
        let before = engine.app_configs().await.unwrap().len();

        let app = engine.add_app("Mobile Legends", 1.2).await.unwrap();
        assert!(app.is_active);
        assert_eq!(app.exchange_rate, 1.2);

        let apps = engine.app_configs().await.unwrap();
        assert_eq!(apps.len(), before + 1);
        assert!(apps.iter().any(|a| a.id == app.id));
    }

    #[tokio::test]
    async fn test_agency_config_defaults_empty() {
        let (engine, _dir) = engine().await;
        let agency = engine.agency_config().await.unwrap();
        assert!(agency.agency_url.is_empty());
        assert!(!agency.is_connected);
        assert!(agency.last_sync.is_none());
    }
}
