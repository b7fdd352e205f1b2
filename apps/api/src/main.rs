//! ProofAI entitlement API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use proofai_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, EntitlementStoreKind, init_tracing};
use crate::api_services::{build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = match config.database_url.as_deref() {
        Some(database_url)
            if config.migrate_only || config.entitlement_store == EntitlementStoreKind::Postgres =>
        {
            Some(connect_and_migrate(database_url, config.store_timeout).await?)
        }
        _ => None,
    };

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = build_app_state(pool, &config)?;
    let app = api_router::build_router(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(
        %address,
        store = ?config.entitlement_store,
        provider = ?config.entitlement_provider,
        "proofai api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("API server error: {error}")))
}
