//! Nagar Portal - community events, local products and chat.
//!
//! This binary serves the portal on port 3000 by default.
//!
//! # Architecture
//!
//! - Axum web framework, server-rendered Askama templates
//! - `PostgreSQL` documents and sessions, images on local disk
//!   (`PORTAL_BACKEND=postgres`, the default)
//! - Everything in process memory (`PORTAL_BACKEND=memory`), for demos
//! - Live chat over server-sent events, fed by `LISTEN/NOTIFY`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use thiserror::Error;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;

use nagar_portal::config::{BackendKind, ConfigError, PortalConfig};
use nagar_portal::db::{self, PgDocumentStore};
use nagar_portal::routes;
use nagar_portal::state::AppState;
use nagar_portal::storage::LocalObjectStorage;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &PortalConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

/// Initialize tracing with `EnvFilter` and Sentry integration.
///
/// Logs are JSON when `PORTAL_LOG_FORMAT=json`, human-readable otherwise.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nagar_portal=info,tower_http=debug".into());

    let json = std::env::var("PORTAL_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // Load configuration from environment (needed for Sentry init)
    let config = PortalConfig::from_env()?;

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p nagar-cli -- migrate
    let app = match config.backend {
        BackendKind::Postgres => {
            let database_url = config
                .database_url
                .as_ref()
                .ok_or_else(|| ConfigError::MissingEnvVar("PORTAL_DATABASE_URL".to_string()))?;
            let pool = db::create_pool(database_url).await?;
            tracing::info!("Database pool created");

            let state = AppState::new(
                config.clone(),
                Arc::new(PgDocumentStore::new(pool.clone())),
                Arc::new(LocalObjectStorage::new(config.media_dir.clone())),
            );
            routes::app(state, PostgresStore::new(pool))
        }
        BackendKind::Memory => {
            tracing::warn!("Using the in-memory backend; data is lost on restart");
            routes::app(AppState::in_memory(config.clone()), MemoryStore::default())
        }
    }
    // Sentry layers (outermost for full request coverage)
    .layer(sentry_tower::NewSentryLayer::new_from_top())
    .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("portal listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
