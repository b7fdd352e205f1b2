use std::sync::Arc;

use chrono::{DateTime, Utc};

use proofai_core::UserId;
use proofai_domain::{
    BillingPeriod, MinuteLimit, PlanName, SubscriptionGrant, UserAccount, active_credit_total,
};

use crate::{
    AccountRepository, CertificationGrantRepository, CreditGrantRepository, SubscriptionRepository,
};

/// Grant facts for one user merged by precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGrants {
    /// Profile, or the starter default when missing or unreadable.
    pub account: UserAccount,
    /// Current subscription, if one could be read.
    pub subscription: Option<SubscriptionGrant>,
    /// Effective plan.
    pub active_plan: PlanName,
    /// Administrative override flag.
    pub has_override: bool,
    /// Admin, override or lifetime access.
    pub has_unlimited_access: bool,
    /// Paid plan in an access-conferring status, or a lifetime profile.
    pub has_paid_plan: bool,
    /// Sum of unexpired credits.
    pub active_credits: u32,
    /// Court certification from any source.
    pub has_certification: bool,
    /// Minute allowance that applies to the current period.
    pub minute_limit: MinuteLimit,
    /// Period over which usage is counted, when a paid subscription exists.
    pub usage_period: Option<BillingPeriod>,
    /// Whether any lookup failed and a restrictive fallback was used.
    pub degraded: bool,
}

/// Merges profile flags, subscriptions, credits and certifications into one view.
#[derive(Clone)]
pub struct GrantReconciler {
    accounts: Arc<dyn AccountRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    credits: Arc<dyn CreditGrantRepository>,
    certifications: Arc<dyn CertificationGrantRepository>,
}

impl GrantReconciler {
    /// Creates a new grant reconciler.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        credits: Arc<dyn CreditGrantRepository>,
        certifications: Arc<dyn CertificationGrantRepository>,
    ) -> Self {
        Self {
            accounts,
            subscriptions,
            credits,
            certifications,
        }
    }

    /// Resolves every grant source for `user_id` as of `now`.
    ///
    /// Never fails. A failed lookup contributes the most restrictive value for
    /// its source and marks the result as degraded.
    pub async fn resolve_grants(&self, user_id: UserId, now: DateTime<Utc>) -> ResolvedGrants {
        let mut degraded = false;

        let account = match self.accounts.find_account(user_id).await {
            Ok(Some(account)) => account,
            Ok(None) => UserAccount::default_for(user_id),
            Err(error) => {
                tracing::warn!(user_id = %user_id, error = %error, "account lookup failed");
                degraded = true;
                UserAccount::default_for(user_id)
            }
        };

        let subscription = match self.subscriptions.find_subscription(user_id).await {
            Ok(subscription) => subscription,
            Err(error) => {
                tracing::warn!(user_id = %user_id, error = %error, "subscription lookup failed");
                degraded = true;
                None
            }
        };

        let paid_subscription = subscription
            .as_ref()
            .filter(|subscription| subscription.has_paid_plan());
        let active_plan = paid_subscription.map_or(account.plan, |subscription| subscription.plan);

        let has_unlimited_access = account.has_unlimited_access() || active_plan.is_unlimited();
        let has_paid_plan = paid_subscription.is_some() || account.plan.is_unlimited();

        let (minute_limit, usage_period) = if has_unlimited_access {
            (MinuteLimit::Unbounded, None)
        } else if let Some(subscription) = paid_subscription {
            (subscription.minute_limit, Some(subscription.billing_period()))
        } else {
            (MinuteLimit::Limited(0), None)
        };

        let active_credits = match self.credits.list_credit_grants(user_id).await {
            Ok(grants) => active_credit_total(grants.iter(), now),
            Err(error) => {
                tracing::warn!(user_id = %user_id, error = %error, "credit lookup failed");
                degraded = true;
                0
            }
        };

        let certified_without_grants = has_unlimited_access
            || account.has_court_certification
            || paid_subscription
                .is_some_and(|subscription| subscription.plan.definition().includes_court_certification);
        let has_certification = if certified_without_grants {
            true
        } else {
            match self.certifications.has_valid_certification(user_id).await {
                Ok(certified) => certified,
                Err(error) => {
                    tracing::warn!(
                        user_id = %user_id,
                        error = %error,
                        "certification lookup failed"
                    );
                    degraded = true;
                    false
                }
            }
        };

        ResolvedGrants {
            has_override: account.plan_override,
            account,
            subscription,
            active_plan,
            has_unlimited_access,
            has_paid_plan,
            active_credits,
            has_certification,
            minute_limit,
            usage_period,
            degraded,
        }
    }
}
