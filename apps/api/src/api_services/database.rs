use std::time::Duration;

use proofai_core::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

/// Connects to Postgres and applies embedded migrations.
///
/// `store_timeout` bounds pool acquisition and is set as `statement_timeout` on
/// every connection.
pub async fn connect_and_migrate(
    database_url: &str,
    store_timeout: Duration,
) -> Result<PgPool, AppError> {
    let statement_timeout = format!("SET statement_timeout = {}", store_timeout.as_millis());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(store_timeout)
        .after_connect(move |connection, _metadata| {
            let statement_timeout = statement_timeout.clone();
            Box::pin(async move {
                connection.execute(statement_timeout.as_str()).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}
