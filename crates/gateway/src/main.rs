//! Museo API Gateway
//!
//! The HTTP entry point to the catalog.
//! Handles:
//! - Role resolution from bearer tokens
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod routes;

use axum::extract::FromRef;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use museo_common::{
    auth::JwtManager,
    config::{AppConfig, StorageBackend},
    db::{MemoryStore, PgStore},
    errors::AppError,
    metrics, CatalogService, CatalogStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::middleware::rate_limit::{create_rate_limiter, GlobalRateLimiter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<CatalogService>,
    pub jwt: Arc<JwtManager>,
    pub limiter: Option<Arc<GlobalRateLimiter>>,
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn CatalogStore>) -> Result<Self, AppError> {
        let secret = config.auth.jwt_secret.as_deref().ok_or_else(|| AppError::Configuration {
            message: "auth.jwt_secret is required".to_string(),
        })?;
        let jwt = Arc::new(JwtManager::new(secret, config.auth.jwt_expiration_secs));

        let limiter = config.rate_limit.enabled.then(|| {
            create_rate_limiter(config.rate_limit.requests_per_second, config.rate_limit.burst)
        });

        let catalog = Arc::new(CatalogService::new(store, config.catalog.clone()));

        Ok(Self {
            config: Arc::new(config),
            catalog,
            jwt,
            limiter,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        service = %config.observability.service_name,
        "Starting Museo API Gateway v{}",
        museo_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .install()?;
        metrics::register_metrics();
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    // Initialize storage
    let store: Arc<dyn CatalogStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Postgres => Arc::new(PgStore::connect(&config.storage).await?),
    };
    info!(backend = store.backend(), "Catalog store ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let shutdown_timeout = config.shutdown_timeout();

    // Create app state
    let state = AppState::new(config, store)?;

    // Build the router
    let app = routes::create_router(state);

    // Start the server
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
///
/// Once a signal arrives, in-flight requests get `grace` to finish before the
/// process exits anyway.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        tracing::warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out");
        std::process::exit(1);
    });
}
