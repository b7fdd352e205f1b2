use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use proofai_application::{CreditGrantInsert, CreditGrantRepository};
use proofai_core::{AppError, AppResult, UserId};
use proofai_domain::{CreditGrant, GrantedBy};

use crate::store_error::{column_count, store_error, stored_count};

/// PostgreSQL-backed credit grant repository.
#[derive(Clone)]
pub struct PostgresCreditGrantRepository {
    pool: PgPool,
}

impl PostgresCreditGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CreditGrantRow {
    id: Uuid,
    user_id: Uuid,
    quantity: i32,
    credits_remaining: i32,
    expires_at: Option<DateTime<Utc>>,
    granted_by: String,
    reason: String,
    source_event_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CreditGrantRow> for CreditGrant {
    type Error = AppError;

    fn try_from(row: CreditGrantRow) -> Result<Self, Self::Error> {
        let granted_by = GrantedBy::from_str(row.granted_by.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "credit grant '{}' has an invalid issuer: {error}",
                row.id
            ))
        })?;

        Ok(Self {
            grant_id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            quantity: stored_count("quantity", row.quantity)?,
            credits_remaining: stored_count("credits_remaining", row.credits_remaining)?,
            expires_at: row.expires_at,
            granted_by,
            reason: row.reason,
            source_event_id: row.source_event_id,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CreditGrantRepository for PostgresCreditGrantRepository {
    async fn list_credit_grants(&self, user_id: UserId) -> AppResult<Vec<CreditGrant>> {
        let rows = sqlx::query_as::<_, CreditGrantRow>(
            r#"
            SELECT
                id,
                user_id,
                quantity,
                credits_remaining,
                expires_at,
                granted_by,
                reason,
                source_event_id,
                created_at
            FROM credit_grants
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error(&format!("failed to list credit grants for '{user_id}'"), error))?;

        rows.into_iter().map(CreditGrant::try_from).collect()
    }

    async fn insert_credit_grant(&self, grant: CreditGrant) -> AppResult<CreditGrantInsert> {
        let quantity = column_count("quantity", grant.quantity)?;
        let credits_remaining = column_count("credits_remaining", grant.credits_remaining)?;

        let result = sqlx::query(
            r#"
            INSERT INTO credit_grants (
                id,
                user_id,
                quantity,
                credits_remaining,
                expires_at,
                granted_by,
                reason,
                source_event_id,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_event_id) DO NOTHING
            "#,
        )
        .bind(grant.grant_id)
        .bind(grant.user_id.as_uuid())
        .bind(quantity)
        .bind(credits_remaining)
        .bind(grant.expires_at)
        .bind(grant.granted_by.to_string())
        .bind(grant.reason)
        .bind(grant.source_event_id)
        .bind(grant.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to insert credit grant for '{}'", grant.user_id),
                error,
            )
        })?;

        if result.rows_affected() == 0 {
            return Ok(CreditGrantInsert::AlreadyApplied);
        }

        Ok(CreditGrantInsert::Inserted)
    }

    async fn consume_credit(&self, grant_id: Uuid) -> AppResult<Option<CreditGrant>> {
        let row = sqlx::query_as::<_, CreditGrantRow>(
            r#"
            UPDATE credit_grants
            SET credits_remaining = credits_remaining - 1
            WHERE id = $1
              AND credits_remaining > 0
            RETURNING
                id,
                user_id,
                quantity,
                credits_remaining,
                expires_at,
                granted_by,
                reason,
                source_event_id,
                created_at
            "#,
        )
        .bind(grant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(&format!("failed to consume credit from '{grant_id}'"), error))?;

        row.map(CreditGrant::try_from).transpose()
    }
}
