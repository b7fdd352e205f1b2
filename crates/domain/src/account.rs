use proofai_core::{AccountRole, UserId};
use serde::{Deserialize, Serialize};

use crate::PlanName;

/// Profile fields that drive entitlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Account id.
    pub user_id: UserId,
    /// Account role.
    pub role: AccountRole,
    /// Base plan recorded on the profile.
    pub plan: PlanName,
    /// Administrative override granting unlimited access.
    pub plan_override: bool,
    /// Court certification flag set directly on the profile.
    pub has_court_certification: bool,
    /// Billing provider customer reference.
    pub billing_customer_ref: Option<String>,
}

impl UserAccount {
    /// Returns the account assumed when no profile row exists: a starter user.
    #[must_use]
    pub fn default_for(user_id: UserId) -> Self {
        Self {
            user_id,
            role: AccountRole::User,
            plan: PlanName::Starter,
            plan_override: false,
            has_court_certification: false,
            billing_customer_ref: None,
        }
    }

    /// Returns whether the profile alone grants unlimited access.
    #[must_use]
    pub fn has_unlimited_access(&self) -> bool {
        self.role == AccountRole::Admin || self.plan_override || self.plan.is_unlimited()
    }
}
