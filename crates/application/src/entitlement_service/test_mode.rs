#[cfg(not(debug_assertions))]
compile_error!("the `test-mode-entitlements` feature must not be enabled in release builds");

use std::sync::Arc;

use async_trait::async_trait;

use proofai_core::{AccountRole, UserId};
use proofai_domain::{EntitlementInputs, EntitlementSnapshot, MinuteLimit, PlanName};

use super::EntitlementResolver;
use crate::Clock;

/// Resolver that grants unlimited access to every user.
///
/// Only for local development and automated tests.
pub struct TestModeEntitlementProvider {
    clock: Arc<dyn Clock>,
}

impl TestModeEntitlementProvider {
    /// Creates the provider and announces it loudly.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        tracing::warn!("test-mode entitlement provider is active; every user is unlimited");
        Self { clock }
    }
}

#[async_trait]
impl EntitlementResolver for TestModeEntitlementProvider {
    async fn resolve(&self, user_id: UserId) -> EntitlementSnapshot {
        tracing::warn!(user_id = %user_id, "granting test-mode entitlements");

        EntitlementSnapshot::from_inputs(EntitlementInputs {
            user_id,
            role: AccountRole::User,
            plan: PlanName::Lifetime,
            has_unlimited_access: true,
            has_paid_plan: true,
            has_court_certification: true,
            active_credits: 0,
            minute_limit: MinuteLimit::Unbounded,
            used_minutes: 0,
            degraded: false,
            resolved_at: self.clock.now(),
        })
    }
}
