use async_trait::async_trait;
use sqlx::PgPool;

use proofai_application::UsageLedgerRepository;
use proofai_core::{AppError, AppResult, UserId};
use proofai_domain::{BillingPeriod, UsageRecord};

use crate::store_error::{column_count, store_error};

/// PostgreSQL-backed append-only usage ledger.
#[derive(Clone)]
pub struct PostgresUsageLedgerRepository {
    pool: PgPool,
}

impl PostgresUsageLedgerRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageLedgerRepository for PostgresUsageLedgerRepository {
    async fn append_usage(&self, record: UsageRecord) -> AppResult<()> {
        let minutes = column_count("minutes", record.minutes.get())?;

        sqlx::query(
            r#"
            INSERT INTO usage_records (id, user_id, minutes, recording_ref, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.record_id)
        .bind(record.user_id.as_uuid())
        .bind(minutes)
        .bind(record.recording_ref)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to append usage for '{}'", record.user_id),
                error,
            )
        })?;

        Ok(())
    }

    async fn total_usage_minutes(&self, user_id: UserId, period: BillingPeriod) -> AppResult<u64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(minutes), 0)::BIGINT
            FROM usage_records
            WHERE user_id = $1
              AND recorded_at >= $2
              AND recorded_at <= $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(period.start())
        .bind(period.end())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| store_error(&format!("failed to total usage for '{user_id}'"), error))?;

        u64::try_from(total)
            .map_err(|_| AppError::Internal(format!("usage total for '{user_id}' is negative")))
    }
}
