//! # lia-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for LIA Admin.
//! Binds to configurable port (default 8080).

use std::sync::Arc;

use lia_api::config::{AppConfig, LogFormat};
use lia_api::db::{self, ConnectionHealth};
use lia_api::middleware::metrics;
use lia_api::state::AppState;
use lia_api::store::{IdentityStore, InMemoryIdentityStore};
use lia_core::TokenCodec;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.log_format)
            .unwrap_or_default(),
    );
    let config = config.map_err(|e| {
        tracing::error!("Configuration error: {e}");
        e
    })?;
    tracing::debug!(?config, "configuration loaded");

    let codec = TokenCodec::new(config.jwt_secret.expose(), config.token_ttl)?;

    // Identity store: PostgreSQL when DATABASE_URL is set, in-memory otherwise.
    let (store, health): (Arc<dyn IdentityStore>, Arc<ConnectionHealth>) =
        match &config.database_url {
            Some(url) => {
                let health = Arc::new(ConnectionHealth::database());
                let pool = db::connect_with_retry(url, config.db_retry, &health)
                    .await
                    .map_err(|e| {
                        tracing::error!("Database initialization failed: {e}");
                        e
                    })?;
                let store = db::HealthTrackedStore::new(
                    db::users::PgIdentityStore::new(pool),
                    health.clone(),
                );
                (Arc::new(store), health)
            }
            None => {
                tracing::warn!(
                    "DATABASE_URL not set; using in-memory identity store. \
                     No user will authenticate until one is registered."
                );
                (
                    Arc::new(InMemoryIdentityStore::new()),
                    Arc::new(ConnectionHealth::in_memory()),
                )
            }
        };

    let mut state = AppState::new(codec, store, health);
    match metrics::install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!("Prometheus recorder not installed: {e}"),
    }

    let app = lia_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("LIA API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
