use async_trait::async_trait;

use proofai_core::{AppResult, UserId};
use proofai_domain::{PlanName, UserAccount};

/// Repository port for entitlement-relevant profile fields.
///
/// Writes upsert the profile row so grants can target accounts whose profile
/// has not been materialised yet.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Finds the profile for a user.
    async fn find_account(&self, user_id: UserId) -> AppResult<Option<UserAccount>>;

    /// Resolves a billing customer reference to an account.
    async fn find_user_by_customer_ref(&self, customer_ref: &str) -> AppResult<Option<UserId>>;

    /// Sets or clears the plan override flag.
    async fn set_plan_override(&self, user_id: UserId, enabled: bool) -> AppResult<()>;

    /// Sets or clears the profile court certification flag.
    async fn set_court_certification(&self, user_id: UserId, enabled: bool) -> AppResult<()>;

    /// Records the plan and customer reference last confirmed by billing.
    async fn save_billing_plan(
        &self,
        user_id: UserId,
        plan: PlanName,
        customer_ref: Option<&str>,
    ) -> AppResult<()>;
}
