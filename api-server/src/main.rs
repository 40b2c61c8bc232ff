//! Instacheck HTTP Server
//!
//! Serves genuine/fake predictions for Instagram accounts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    INSTACHECK SERVER                     │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────────┐  │
//! │  │  API      │   │  Account     │   │  Batch Upload   │  │
//! │  │  Gateway  │──▶│  Lookup      │   │  (CSV in/out)   │  │
//! │  │  (Axum)   │   │  (reqwest)   │   │                 │  │
//! │  └─────┬─────┘   └──────┬───────┘   └────────┬────────┘  │
//! │        └────────────────┼────────────────────┘           │
//! │                         ▼                                │
//! │              ┌────────────────────┐                      │
//! │              │  ModelContext      │  (loaded once,       │
//! │              │  schema/normalizer │   shared read-only)  │
//! │              │  /classifier       │                      │
//! │              └────────────────────┘                      │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod handlers;
mod error;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use instacheck_core::{constants, AccountInfoClient, ModelContext};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "instacheck_server=debug,instacheck_core=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("{} server starting ({})...", constants::APP_NAME, config.environment);
    tracing::info!("Artifacts: {}", config.deployment.artifact_dir.display());

    // Load the model before accepting any request
    let deployment = config.deployment.clone();
    let ctx = tokio::task::spawn_blocking(move || ModelContext::load(&deployment))
        .await
        .context("model loading task panicked")?
        .context("Failed to load model artifacts")?;

    let accounts = AccountInfoClient::new(config.account_api.clone())
        .context("Failed to create account-info client")?;
    if !accounts.is_configured() {
        if config.is_production() {
            anyhow::bail!("ACCOUNT_API_KEY must be set in production");
        }
        tracing::warn!("ACCOUNT_API_KEY is not set; account lookups will fail");
    }

    // Build application state
    let state = AppState {
        ctx: Arc::new(ctx),
        accounts: Arc::new(accounts),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<ModelContext>,
    pub accounts: Arc<AccountInfoClient>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;

    let api_routes = Router::new()
        .route("/api/v1/model", get(handlers::model::info))
        .route("/api/v1/predict/account", post(handlers::predict::account))
        .route("/api/v1/predict/manual", post(handlers::predict::manual))
        .route("/api/v1/predict/batch", post(handlers::predict::batch));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
