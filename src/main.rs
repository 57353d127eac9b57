//! Top-up Storefront Backend
//!
//! Local-first account, wallet, and order-ledger engine with an optional
//! best-effort cloud mirror.

mod api;
mod cloud;
mod config;
mod engine;
mod errors;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cloud::CloudMirror;
use config::Config;
use engine::Engine;
use store::LocalStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Top-up Storefront Backend");
    tracing::info!("Store path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize the local store
    let pool = store::init_store(&config.db_path).await?;
    let local = LocalStore::new(pool);

    // Initialize the cloud mirror (None = local-only mode)
    let mirror = CloudMirror::from_config(&config);

    let engine = Arc::new(Engine::new(local, mirror, &config));
    engine.initialize().await?;

    // Create application state
    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Auth & session
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/auth/logout", post(api::logout))
        .route("/auth/session", get(api::session))
        .route("/auth/profile", put(api::update_profile))
        // Users
        .route("/users", get(api::list_users))
        .route("/users/serial/{serial}", get(api::get_user_by_serial))
        // Wallet
        .route("/wallet/credit", post(api::credit))
        .route("/wallet/debit", post(api::debit))
        .route("/wallet/zero", post(api::zero))
        .route("/wallet/wipe", post(api::wipe))
        // Team management & moderation
        .route("/admin/sub-admins", post(api::create_sub_admin))
        .route("/admin/permissions", put(api::update_permissions))
        .route("/admin/ban", post(api::set_ban_status))
        .route("/admin/deactivate", post(api::toggle_deactivation))
        .route("/admin/reset-password", post(api::reset_password))
        .route("/admin/remove-privileges", post(api::remove_privileges))
        .route("/admin/users/{serial}", delete(api::delete_user))
        .route("/admin/wipe-coins", post(api::wipe_all_coins))
        // Orders
        .route("/orders", get(api::list_orders))
        .route("/orders", post(api::create_order))
        .route("/orders/{id}", put(api::update_order))
        .route("/orders", delete(api::wipe_orders))
        .route("/stats", get(api::stats))
        // Notifications
        .route("/notifications", get(api::list_notifications))
        .route("/notifications/broadcast", post(api::broadcast))
        .route("/notifications/{id}/read", put(api::mark_read))
        .route("/notifications", delete(api::wipe_notifications))
        // Settings
        .route("/settings/site", get(api::get_site).put(api::put_site))
        .route("/settings/banner", get(api::get_banner).put(api::put_banner))
        .route(
            "/settings/contact",
            get(api::get_contact).put(api::put_contact),
        )
        .route("/settings/agency", get(api::get_agency).put(api::put_agency))
        .route(
            "/settings/apps",
            get(api::get_apps).put(api::put_apps).post(api::add_app),
        );

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
