//! ReelGuide Backend
//!
//! REST backend for a video directory: ranked listings, admin moderation and
//! visitor feedback, with SQLite persistence and background link validation.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod inbox;
mod models;
mod preferences;
mod ranking;
mod triggers;
mod youtube;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use preferences::PreferencesStore;
use triggers::TriggerRunner;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub triggers: TriggerRunner,
    pub preferences: Arc<PreferencesStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ReelGuide Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Preferences path: {:?}", config.preferences_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.admin_psk.is_none() {
        tracing::warn!("No admin PSK configured (REELGUIDE_ADMIN_PSK). Admin endpoints are unreachable!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Start the link validators
    let triggers = TriggerRunner::spawn(repo.clone(), config.trigger_max_instances);
    tracing::info!(
        "Video validators running with up to {} instances",
        config.trigger_max_instances
    );

    let preferences = Arc::new(PreferencesStore::load(&config.preferences_path).await);

    // Create application state
    let state = AppState {
        repo,
        triggers,
        preferences,
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

    // Clone PSK for the viewer layer
    let psk = state.config.admin_psk.clone();

    // API routes; admin-only handlers take an `AdminOnly` extractor
    let api_routes = Router::new()
        // Videos
        .route("/videos", get(api::list_videos))
        .route("/videos", post(api::create_video))
        .route("/videos/sub-tags", get(api::list_sub_tags))
        .route("/videos/{id}", get(api::get_video))
        .route("/videos/{id}", put(api::update_video))
        .route("/videos/{id}/visibility", put(api::set_video_visibility))
        // Tags
        .route("/tags", get(api::list_tags))
        // Feedback
        .route("/feedbacks", get(api::list_feedbacks))
        .route("/feedbacks", post(api::create_feedback))
        .route("/feedbacks/{id}/read", put(api::mark_feedback_read))
        .route("/feedbacks/{id}/archive", put(api::archive_feedback))
        .route("/feedbacks/{id}/unarchive", put(api::unarchive_feedback))
        // Preferences
        .route("/preferences", get(api::get_preferences))
        .route("/preferences", put(api::update_preferences))
        // Resolve who is calling
        .layer(middleware::from_fn(move |req, next| {
            auth::viewer_layer(psk.clone(), req, next)
        }));

    // Health check (no viewer resolution)
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

#[cfg(test)]
mod tests;
