use std::sync::Arc;

use async_trait::async_trait;

use proofai_core::{AppError, AppResult, UserId};
use proofai_domain::{AdmissionDecision, AdmissionFunding, EntitlementInputs, EntitlementSnapshot};

use crate::{Clock, GrantReconciler, UsageLedgerService};

#[cfg(feature = "test-mode-entitlements")]
mod test_mode;

#[cfg(feature = "test-mode-entitlements")]
pub use test_mode::TestModeEntitlementProvider;

/// Strategy that turns stored grants into an entitlement snapshot.
#[async_trait]
pub trait EntitlementResolver: Send + Sync {
    /// Resolves the full entitlement snapshot. Never fails; degrades restrictively.
    async fn resolve(&self, user_id: UserId) -> EntitlementSnapshot;

    /// Decides whether a recording of `duration_seconds` may start.
    async fn check_recording_admission(
        &self,
        user_id: UserId,
        duration_seconds: u64,
    ) -> AdmissionDecision {
        let snapshot = self.resolve(user_id).await;
        AdmissionDecision::evaluate(&snapshot, duration_seconds)
    }
}

/// Resolver backed by the grant reconciler and the usage ledger.
#[derive(Clone)]
pub struct StandardEntitlementResolver {
    reconciler: GrantReconciler,
    usage_ledger: UsageLedgerService,
    clock: Arc<dyn Clock>,
}

impl StandardEntitlementResolver {
    /// Creates a new standard resolver.
    #[must_use]
    pub fn new(
        reconciler: GrantReconciler,
        usage_ledger: UsageLedgerService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reconciler,
            usage_ledger,
            clock,
        }
    }
}

#[async_trait]
impl EntitlementResolver for StandardEntitlementResolver {
    async fn resolve(&self, user_id: UserId) -> EntitlementSnapshot {
        let now = self.clock.now();
        let grants = self.reconciler.resolve_grants(user_id, now).await;
        let mut degraded = grants.degraded;

        let used_minutes = match grants.usage_period {
            Some(period) if !grants.has_unlimited_access => {
                match self.usage_ledger.total_usage(user_id, period).await {
                    Ok(total) => total,
                    Err(error) => {
                        tracing::warn!(user_id = %user_id, error = %error, "usage lookup failed");
                        degraded = true;
                        // Treat the allowance as spent.
                        u64::MAX
                    }
                }
            }
            _ => 0,
        };

        let snapshot = EntitlementSnapshot::from_inputs(EntitlementInputs {
            user_id,
            role: grants.account.role,
            plan: grants.active_plan,
            has_unlimited_access: grants.has_unlimited_access,
            has_paid_plan: grants.has_paid_plan,
            has_court_certification: grants.has_certification,
            active_credits: grants.active_credits,
            minute_limit: grants.minute_limit,
            used_minutes,
            degraded,
            resolved_at: now,
        });

        tracing::debug!(
            user_id = %user_id,
            plan = %snapshot.plan,
            can_record = snapshot.can_record,
            degraded = snapshot.degraded,
            "resolved entitlements"
        );

        snapshot
    }
}

/// Entry point for entitlement checks used by request handlers.
#[derive(Clone)]
pub struct EntitlementService {
    resolver: Arc<dyn EntitlementResolver>,
}

impl EntitlementService {
    /// Creates a new entitlement service around a resolver strategy.
    #[must_use]
    pub fn new(resolver: Arc<dyn EntitlementResolver>) -> Self {
        Self { resolver }
    }

    /// Resolves the entitlement snapshot for a user.
    pub async fn resolve(&self, user_id: UserId) -> EntitlementSnapshot {
        self.resolver.resolve(user_id).await
    }

    /// Evaluates the advisory pre-flight check for a new recording.
    pub async fn check_recording_admission(
        &self,
        user_id: UserId,
        duration_seconds: u64,
    ) -> AdmissionDecision {
        self.resolver
            .check_recording_admission(user_id, duration_seconds)
            .await
    }

    /// Requires that a recording may start and returns what funds it.
    pub async fn require_recording_admission(
        &self,
        user_id: UserId,
        duration_seconds: u64,
    ) -> AppResult<AdmissionFunding> {
        match self
            .check_recording_admission(user_id, duration_seconds)
            .await
        {
            AdmissionDecision::Allowed { funding } => Ok(funding),
            AdmissionDecision::QuotaExceeded {
                requested_minutes,
                remaining_minutes,
            } => Err(AppError::QuotaExceeded(format!(
                "recording needs {requested_minutes} minutes but only {remaining_minutes} remain"
            ))),
            AdmissionDecision::NoActivePlan => Err(AppError::Forbidden(
                "an active plan or recording credit is required".to_owned(),
            )),
        }
    }

    /// Requires report generation access.
    pub async fn require_report_generation(&self, user_id: UserId) -> AppResult<EntitlementSnapshot> {
        let snapshot = self.resolve(user_id).await;
        if !snapshot.can_generate_reports {
            return Err(AppError::Forbidden(
                "report generation requires an active plan or recording credit".to_owned(),
            ));
        }

        Ok(snapshot)
    }

    /// Requires court-certified feature access.
    pub async fn require_court_features(&self, user_id: UserId) -> AppResult<EntitlementSnapshot> {
        let snapshot = self.resolve(user_id).await;
        if !snapshot.can_access_court_features {
            return Err(AppError::Forbidden(
                "court features require court certification".to_owned(),
            ));
        }

        Ok(snapshot)
    }
}
