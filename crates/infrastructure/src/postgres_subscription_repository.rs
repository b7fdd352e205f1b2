use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use proofai_application::SubscriptionRepository;
use proofai_core::{AppError, AppResult, UserId};
use proofai_domain::{MinuteLimit, PlanName, SubscriptionGrant, SubscriptionStatus};

use crate::store_error::{column_count, store_error, stored_count};

/// PostgreSQL-backed repository for the single current subscription per user.
#[derive(Clone)]
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRow {
    user_id: Uuid,
    plan: String,
    minute_limit: Option<i32>,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    status: String,
    billing_customer_ref: Option<String>,
    billing_subscription_ref: Option<String>,
    last_event_id: Option<String>,
}

impl TryFrom<SubscriptionRow> for SubscriptionGrant {
    type Error = AppError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "subscription of '{}' has an invalid stored status: {error}",
                row.user_id
            ))
        })?;
        let minute_limit = match row.minute_limit {
            Some(minutes) => MinuteLimit::Limited(stored_count("minute_limit", minutes)?),
            None => MinuteLimit::Unbounded,
        };

        Ok(Self {
            user_id: UserId::from_uuid(row.user_id),
            plan: PlanName::from_storage(row.plan.as_str()),
            minute_limit,
            period_start: row.period_start,
            period_end: row.period_end,
            status,
            billing_customer_ref: row.billing_customer_ref,
            billing_subscription_ref: row.billing_subscription_ref,
            last_event_id: row.last_event_id,
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_subscription(&self, user_id: UserId) -> AppResult<Option<SubscriptionGrant>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT
                user_id,
                plan,
                minute_limit,
                period_start,
                period_end,
                status,
                billing_customer_ref,
                billing_subscription_ref,
                last_event_id
            FROM subscription_grants
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(&format!("failed to load subscription for '{user_id}'"), error))?;

        row.map(SubscriptionGrant::try_from).transpose()
    }

    async fn upsert_subscription(&self, grant: SubscriptionGrant) -> AppResult<()> {
        let minute_limit = match grant.minute_limit {
            MinuteLimit::Limited(minutes) => Some(column_count("minute_limit", minutes)?),
            MinuteLimit::Unbounded => None,
        };

        sqlx::query(
            r#"
            INSERT INTO subscription_grants (
                user_id,
                plan,
                minute_limit,
                period_start,
                period_end,
                status,
                billing_customer_ref,
                billing_subscription_ref,
                last_event_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE
            SET plan = EXCLUDED.plan,
                minute_limit = EXCLUDED.minute_limit,
                period_start = EXCLUDED.period_start,
                period_end = EXCLUDED.period_end,
                status = EXCLUDED.status,
                billing_customer_ref = EXCLUDED.billing_customer_ref,
                billing_subscription_ref = EXCLUDED.billing_subscription_ref,
                last_event_id = EXCLUDED.last_event_id,
                updated_at = now()
            "#,
        )
        .bind(grant.user_id.as_uuid())
        .bind(grant.plan.as_str())
        .bind(minute_limit)
        .bind(grant.period_start)
        .bind(grant.period_end)
        .bind(grant.status.as_str())
        .bind(grant.billing_customer_ref)
        .bind(grant.billing_subscription_ref)
        .bind(grant.last_event_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to save subscription for '{}'", grant.user_id),
                error,
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
