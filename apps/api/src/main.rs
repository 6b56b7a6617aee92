//! Campusly API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod rate_limit_cleanup;
mod state;

use campusly_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, StorageBackend, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{build_app_state, connect_and_migrate};
use crate::rate_limit_cleanup::spawn_rate_limit_cleanup_worker;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = match &config.storage {
        StorageBackend::Postgres {
            database_url,
            max_connections,
        } => Some(connect_and_migrate(database_url.as_str(), *max_connections).await?),
        StorageBackend::Memory => None,
    };

    if config.migrate_only {
        info!("database migrations applied");
        return Ok(());
    }

    if pool.is_none() {
        info!("using in-memory storage; state is lost on restart");
    }

    let app_state = build_app_state(pool.as_ref(), &config).await?;
    spawn_rate_limit_cleanup_worker(app_state.clone(), config.rate_limit_retention);

    let app = build_router(app_state, config.frontend_url.as_str())?;
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "campusly-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
