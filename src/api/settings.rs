//! Configuration endpoints: site, banner, contact, agency, apps.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::models::{
    AddAppRequest, AgencyConfig, AppConfig, BannerConfig, ContactConfig, SiteConfig,
};
use crate::AppState;

/// GET /api/settings/site
pub async fn get_site(State(state): State<AppState>) -> ApiResult<SiteConfig> {
    success(state.engine.site_config().await?)
}

/// PUT /api/settings/site
pub async fn put_site(
    State(state): State<AppState>,
    Json(config): Json<SiteConfig>,
) -> ApiResult<SiteConfig> {
    state.engine.save_site_config(&config).await?;
    success(config)
}

/// GET /api/settings/banner
pub async fn get_banner(State(state): State<AppState>) -> ApiResult<BannerConfig> {
    success(state.engine.banner_config().await?)
}

/// PUT /api/settings/banner
pub async fn put_banner(
    State(state): State<AppState>,
    Json(config): Json<BannerConfig>,
) -> ApiResult<BannerConfig> {
    state.engine.save_banner_config(&config).await?;
    success(config)
}

/// GET /api/settings/contact
pub async fn get_contact(State(state): State<AppState>) -> ApiResult<ContactConfig> {
    success(state.engine.contact_config().await?)
}

/// PUT /api/settings/contact
pub async fn put_contact(
    State(state): State<AppState>,
    Json(config): Json<ContactConfig>,
) -> ApiResult<ContactConfig> {
    state.engine.save_contact_config(&config).await?;
    success(config)
}

/// GET /api/settings/agency
pub async fn get_agency(State(state): State<AppState>) -> ApiResult<AgencyConfig> {
    success(state.engine.agency_config().await?)
}

/// PUT /api/settings/agency
pub async fn put_agency(
    State(state): State<AppState>,
    Json(config): Json<AgencyConfig>,
) -> ApiResult<AgencyConfig> {
    state.engine.save_agency_config(&config).await?;
    success(config)
}

/// GET /api/settings/apps
pub async fn get_apps(State(state): State<AppState>) -> ApiResult<Vec<AppConfig>> {
    success(state.engine.app_configs().await?)
}

/// PUT /api/settings/apps - Replace the full list.
pub async fn put_apps(
    State(state): State<AppState>,
    Json(apps): Json<Vec<AppConfig>>,
) -> ApiResult<Vec<AppConfig>> {
    state.engine.save_app_configs(&apps).await?;
    success(apps)
}

/// POST /api/settings/apps - Append one new active app.
pub async fn add_app(
    State(state): State<AppState>,
    Json(request): Json<AddAppRequest>,
) -> ApiResult<AppConfig> {
    let app = state
        .engine
        .add_app(&request.name, request.exchange_rate)
        .await?;
    success(app)
}
