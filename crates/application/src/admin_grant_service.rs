use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use proofai_core::{AccountRole, AppError, AppResult, NonEmptyString, UserId, UserIdentity};
use proofai_domain::{AuditAction, CertificationGrant, CreditGrant, EntitlementSnapshot, GrantedBy};

use crate::{
    AccountRepository, AuditEvent, AuditRepository, CertificationGrantRepository, Clock,
    CreditGrantInsert, CreditGrantRepository, EntitlementService,
};

/// Input payload for manual credit grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantCreditsInput {
    /// Credited account.
    pub user_id: UserId,
    /// Number of credits; must be positive.
    pub amount: u32,
    /// Optional expiry; must lie in the future.
    pub expires_at: Option<DateTime<Utc>>,
    /// Justification recorded with the grant.
    pub reason: String,
}

/// Input payload for manual certification grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantCertificationInput {
    /// Certified account.
    pub user_id: UserId,
    /// Justification recorded with the grant.
    pub reason: String,
}

/// Administrative grant management. Every mutation is audited.
#[derive(Clone)]
pub struct AdminGrantService {
    accounts: Arc<dyn AccountRepository>,
    credits: Arc<dyn CreditGrantRepository>,
    certifications: Arc<dyn CertificationGrantRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    entitlements: EntitlementService,
    clock: Arc<dyn Clock>,
}

impl AdminGrantService {
    /// Creates a new admin grant service.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        credits: Arc<dyn CreditGrantRepository>,
        certifications: Arc<dyn CertificationGrantRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        entitlements: EntitlementService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            credits,
            certifications,
            audit_repository,
            entitlements,
            clock,
        }
    }

    /// Grants recording credits to a user.
    pub async fn grant_credits(
        &self,
        actor: &UserIdentity,
        input: GrantCreditsInput,
    ) -> AppResult<CreditGrant> {
        require_admin(actor)?;

        if input.amount == 0 {
            return Err(AppError::Validation(
                "credit amount must be greater than zero".to_owned(),
            ));
        }

        let now = self.clock.now();
        if input.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(AppError::Validation(
                "credit expiry must lie in the future".to_owned(),
            ));
        }

        let reason = NonEmptyString::new(input.reason)?;
        let grant = CreditGrant {
            grant_id: Uuid::new_v4(),
            user_id: input.user_id,
            quantity: input.amount,
            credits_remaining: input.amount,
            expires_at: input.expires_at,
            granted_by: GrantedBy::Admin(actor.user_id()),
            reason: reason.into(),
            source_event_id: None,
            created_at: now,
        };

        if self.credits.insert_credit_grant(grant.clone()).await? == CreditGrantInsert::AlreadyApplied
        {
            return Err(AppError::Conflict(format!(
                "credit grant '{}' already exists",
                grant.grant_id
            )));
        }

        self.audit(
            actor,
            AuditAction::CreditsGranted,
            "credit_grant",
            grant.grant_id.to_string(),
            format!(
                "granted {} credits to '{}': {}",
                grant.quantity, grant.user_id, grant.reason
            ),
        )
        .await?;

        Ok(grant)
    }

    /// Grants court certification to a user.
    pub async fn grant_certification(
        &self,
        actor: &UserIdentity,
        input: GrantCertificationInput,
    ) -> AppResult<CertificationGrant> {
        require_admin(actor)?;

        let reason = NonEmptyString::new(input.reason)?;
        let grant = CertificationGrant {
            grant_id: Uuid::new_v4(),
            user_id: input.user_id,
            granted_by: GrantedBy::Admin(actor.user_id()),
            reason: reason.into(),
            valid: true,
            created_at: self.clock.now(),
        };
        self.certifications
            .insert_certification_grant(grant.clone())
            .await?;

        self.audit(
            actor,
            AuditAction::CertificationGranted,
            "certification_grant",
            grant.grant_id.to_string(),
            format!(
                "granted court certification to '{}': {}",
                grant.user_id, grant.reason
            ),
        )
        .await?;

        Ok(grant)
    }

    /// Invalidates a certification grant. The row is kept for audit purposes.
    pub async fn invalidate_certification(
        &self,
        actor: &UserIdentity,
        grant_id: Uuid,
        reason: Option<&str>,
    ) -> AppResult<CertificationGrant> {
        require_admin(actor)?;

        let grant = self
            .certifications
            .invalidate_certification_grant(grant_id)
            .await?;

        self.audit(
            actor,
            AuditAction::CertificationInvalidated,
            "certification_grant",
            grant_id.to_string(),
            reason
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .map_or_else(
                    || format!("invalidated court certification of '{}'", grant.user_id),
                    |reason| {
                        format!(
                            "invalidated court certification of '{}': {reason}",
                            grant.user_id
                        )
                    },
                ),
        )
        .await?;

        Ok(grant)
    }

    /// Sets or clears the unlimited-access override on a profile.
    pub async fn set_plan_override(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        enabled: bool,
    ) -> AppResult<()> {
        require_admin(actor)?;

        self.accounts.set_plan_override(user_id, enabled).await?;
        self.audit(
            actor,
            AuditAction::PlanOverrideChanged,
            "user_account",
            user_id.to_string(),
            format!("plan override set to {enabled}"),
        )
        .await
    }

    /// Sets or clears the court certification flag on a profile.
    pub async fn set_court_certification_flag(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        enabled: bool,
    ) -> AppResult<()> {
        require_admin(actor)?;

        self.accounts
            .set_court_certification(user_id, enabled)
            .await?;
        self.audit(
            actor,
            AuditAction::CourtCertificationFlagChanged,
            "user_account",
            user_id.to_string(),
            format!("court certification flag set to {enabled}"),
        )
        .await
    }

    /// Lists every credit grant of a user, newest first.
    pub async fn list_credit_grants(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<Vec<CreditGrant>> {
        require_staff(actor)?;

        let mut grants = self.credits.list_credit_grants(user_id).await?;
        grants.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(grants)
    }

    /// Lists every certification grant of a user, newest first.
    pub async fn list_certification_grants(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<Vec<CertificationGrant>> {
        require_staff(actor)?;

        let mut grants = self
            .certifications
            .list_certification_grants(user_id)
            .await?;
        grants.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(grants)
    }

    /// Resolves another user's entitlements for staff review.
    pub async fn user_entitlements(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<EntitlementSnapshot> {
        require_staff(actor)?;

        Ok(self.entitlements.resolve(user_id).await)
    }

    async fn audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) -> AppResult<()> {
        tracing::info!(
            actor = %actor.user_id(),
            action = action.as_str(),
            resource_id = %resource_id,
            "admin grant change"
        );

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id().to_string(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail: Some(detail),
            })
            .await
    }
}

fn require_admin(actor: &UserIdentity) -> AppResult<()> {
    if actor.role() == AccountRole::Admin {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "user '{}' is not an administrator",
        actor.user_id()
    )))
}

fn require_staff(actor: &UserIdentity) -> AppResult<()> {
    if matches!(actor.role(), AccountRole::Admin | AccountRole::Support) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "user '{}' may not view other accounts",
        actor.user_id()
    )))
}
