//! Aquaplan Server
//!
//! HTTP server for the Aquaplan planning backend.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aq_api::AppState;
use aq_core::config::AppConfig;
use aq_db::{Database, DatabaseConfig, PgModelStore};
use aq_store::{MemoryModelStore, MemoryResourceStore, ModelStore, SeedData};

mod health;

use health::{HealthChecker, HealthConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load configuration: {}, using defaults", e);
        AppConfig::default()
    });

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting Aquaplan"
    );

    let resources = Arc::new(MemoryResourceStore::new());
    if let Some(path) = &config.resource_store.seed_path {
        SeedData::from_file(path).await?.load_into(&resources).await?;
    }

    let database = match DatabaseConfig::from_app(&config.database) {
        Some(db_config) => connect_database(&db_config).await,
        None => {
            info!("No database configured, model bindings are kept in memory");
            None
        }
    };

    let models: Arc<dyn ModelStore> = match &database {
        Some(db) => Arc::new(PgModelStore::new(db.pool().clone())),
        None => Arc::new(MemoryModelStore::new()),
    };

    let mut health_checker =
        HealthChecker::new(HealthConfig::default()).with_resources(resources.clone());
    if let Some(db) = database {
        health_checker = health_checker.with_database(db);
    }

    let state = AppState::new(resources, models, &config);
    let app = build_router(state, Arc::new(health_checker), &config);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Connect and prepare the model tables; the server runs without a database on failure
async fn connect_database(db_config: &DatabaseConfig) -> Option<Database> {
    let db = match Database::connect(db_config).await {
        Ok(db) => db,
        Err(e) => {
            warn!("Failed to connect to database: {}. Model bindings are kept in memory.", e);
            return None;
        }
    };
    match db.ensure_schema().await {
        Ok(()) => {
            info!("Connected to database");
            Some(db)
        }
        Err(e) => {
            warn!("Failed to prepare database schema: {}. Model bindings are kept in memory.", e);
            None
        }
    }
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,aq_server=debug,aq_api=debug,aq_services=debug,tower_http=debug".into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Build the application router
fn build_router(state: AppState, health: Arc<HealthChecker>, config: &AppConfig) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::health))
        .route("/health/full", get(health::health))
        .with_state(health);

    Router::new()
        .merge(health_routes)
        .merge(aq_api::router().with_state(state))
        .layer(DefaultBodyLimit::max(config.server.max_body_size_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_seconds,
                )))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
