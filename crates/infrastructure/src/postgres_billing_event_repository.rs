use async_trait::async_trait;
use sqlx::PgPool;

use proofai_application::ProcessedBillingEventRepository;
use proofai_core::AppResult;
use proofai_domain::BillingEventKind;

use crate::store_error::store_error;

/// PostgreSQL-backed ledger of handled billing event ids.
#[derive(Clone)]
pub struct PostgresBillingEventRepository {
    pool: PgPool,
}

impl PostgresBillingEventRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessedBillingEventRepository for PostgresBillingEventRepository {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM processed_billing_events
                WHERE event_id = $1
            )
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to look up billing event '{event_id}'"),
                error,
            )
        })
    }

    async fn mark_processed(
        &self,
        event_id: &str,
        kind: BillingEventKind,
        outcome: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_billing_events (event_id, kind, outcome)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(kind.as_str())
        .bind(outcome)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to record billing event '{event_id}'"),
                error,
            )
        })?;

        Ok(())
    }
}
