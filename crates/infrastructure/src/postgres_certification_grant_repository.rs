use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use proofai_application::CertificationGrantRepository;
use proofai_core::{AppError, AppResult, UserId};
use proofai_domain::{CertificationGrant, GrantedBy};

use crate::store_error::store_error;

/// PostgreSQL-backed court-certification grant repository.
#[derive(Clone)]
pub struct PostgresCertificationGrantRepository {
    pool: PgPool,
}

impl PostgresCertificationGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CertificationGrantRow {
    id: Uuid,
    user_id: Uuid,
    granted_by: String,
    reason: String,
    valid: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<CertificationGrantRow> for CertificationGrant {
    type Error = AppError;

    fn try_from(row: CertificationGrantRow) -> Result<Self, Self::Error> {
        let granted_by = GrantedBy::from_str(row.granted_by.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "certification grant '{}' has an invalid issuer: {error}",
                row.id
            ))
        })?;

        Ok(Self {
            grant_id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            granted_by,
            reason: row.reason,
            valid: row.valid,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CertificationGrantRepository for PostgresCertificationGrantRepository {
    async fn list_certification_grants(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<CertificationGrant>> {
        let rows = sqlx::query_as::<_, CertificationGrantRow>(
            r#"
            SELECT id, user_id, granted_by, reason, valid, created_at
            FROM certification_grants
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to list certification grants for '{user_id}'"),
                error,
            )
        })?;

        rows.into_iter().map(CertificationGrant::try_from).collect()
    }

    async fn has_valid_certification(&self, user_id: UserId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM certification_grants
                WHERE user_id = $1
                  AND valid
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to check certification grants for '{user_id}'"),
                error,
            )
        })
    }

    async fn insert_certification_grant(&self, grant: CertificationGrant) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO certification_grants (id, user_id, granted_by, reason, valid, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(grant.grant_id)
        .bind(grant.user_id.as_uuid())
        .bind(grant.granted_by.to_string())
        .bind(grant.reason)
        .bind(grant.valid)
        .bind(grant.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to insert certification grant for '{}'", grant.user_id),
                error,
            )
        })?;

        Ok(())
    }

    async fn invalidate_certification_grant(
        &self,
        grant_id: Uuid,
    ) -> AppResult<CertificationGrant> {
        let row = sqlx::query_as::<_, CertificationGrantRow>(
            r#"
            UPDATE certification_grants
            SET valid = FALSE,
                invalidated_at = COALESCE(invalidated_at, now())
            WHERE id = $1
            RETURNING id, user_id, granted_by, reason, valid, created_at
            "#,
        )
        .bind(grant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("failed to invalidate certification grant '{grant_id}'"),
                error,
            )
        })?;

        row.ok_or_else(|| {
            AppError::NotFound(format!("certification grant '{grant_id}' was not found"))
        })
        .and_then(CertificationGrant::try_from)
    }
}

#[cfg(test)]
mod tests;
