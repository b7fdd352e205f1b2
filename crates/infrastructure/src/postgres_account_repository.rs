use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use proofai_application::AccountRepository;
use proofai_core::{AccountRole, AppError, AppResult, UserId};
use proofai_domain::{PlanName, UserAccount};

use crate::store_error::store_error;

/// PostgreSQL-backed profile repository over `user_accounts`.
#[derive(Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    user_id: Uuid,
    role: String,
    plan: String,
    plan_override: bool,
    has_court_certification: bool,
    billing_customer_ref: Option<String>,
}

impl TryFrom<AccountRow> for UserAccount {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = AccountRole::from_str(row.role.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "account '{}' has an invalid stored role: {error}",
                row.user_id
            ))
        })?;

        Ok(Self {
            user_id: UserId::from_uuid(row.user_id),
            role,
            plan: PlanName::from_storage(row.plan.as_str()),
            plan_override: row.plan_override,
            has_court_certification: row.has_court_certification,
            billing_customer_ref: row.billing_customer_ref,
        })
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_account(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT user_id, role, plan, plan_override, has_court_certification, billing_customer_ref
            FROM user_accounts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(&format!("failed to load account '{user_id}'"), error))?;

        row.map(UserAccount::try_from).transpose()
    }

    async fn find_user_by_customer_ref(&self, customer_ref: &str) -> AppResult<Option<UserId>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM user_accounts
            WHERE billing_customer_ref = $1
            "#,
        )
        .bind(customer_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to resolve billing customer '{customer_ref}'"),
                error,
            )
        })?;

        Ok(user_id.map(UserId::from_uuid))
    }

    async fn set_plan_override(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_accounts (user_id, plan_override)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET plan_override = EXCLUDED.plan_override,
                updated_at = now()
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(enabled)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to update plan override for '{user_id}'"),
                error,
            )
        })?;

        Ok(())
    }

    async fn set_court_certification(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_accounts (user_id, has_court_certification)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET has_court_certification = EXCLUDED.has_court_certification,
                updated_at = now()
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(enabled)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to update court certification flag for '{user_id}'"),
                error,
            )
        })?;

        Ok(())
    }

    async fn save_billing_plan(
        &self,
        user_id: UserId,
        plan: PlanName,
        customer_ref: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_accounts (user_id, plan, billing_customer_ref)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET plan = EXCLUDED.plan,
                billing_customer_ref = COALESCE(EXCLUDED.billing_customer_ref, user_accounts.billing_customer_ref),
                updated_at = now()
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(plan.as_str())
        .bind(customer_ref)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(&format!("failed to save billing plan for '{user_id}'"), error)
        })?;

        Ok(())
    }
}
