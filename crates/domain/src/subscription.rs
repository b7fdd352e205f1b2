use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use proofai_core::{AppError, AppResult, UserId};
use serde::{Deserialize, Serialize};

use crate::{BillingPeriod, MinuteLimit, PlanName};

/// Lifecycle status of a subscription as reported by the billing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Trial period in progress.
    Trialing,
    /// Paid and in good standing.
    Active,
    /// Latest invoice failed; awaiting late payment.
    PastDue,
    /// Terminated. No transition leaves this state.
    Canceled,
    /// Retries exhausted without payment.
    Unpaid,
}

impl SubscriptionStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
        }
    }

    /// Returns whether a subscription in this status grants baseline access.
    #[must_use]
    pub fn confers_access(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }

    /// Returns whether moving from `self` to `next` is a legal lifecycle step.
    ///
    /// Re-applying the current status is always legal so replayed events are no-ops.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Self::Trialing, Self::Active)
                | (Self::Trialing, Self::Canceled)
                | (Self::Active, Self::PastDue)
                | (Self::Active, Self::Canceled)
                | (Self::PastDue, Self::Active)
                | (Self::PastDue, Self::Canceled)
                | (Self::PastDue, Self::Unpaid)
                | (Self::Unpaid, Self::Active)
                | (Self::Unpaid, Self::Canceled)
        )
    }

    /// Validates a lifecycle step and returns the next status.
    pub fn transition_to(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            return Ok(next);
        }

        Err(AppError::Conflict(format!(
            "subscription status cannot move from '{}' to '{}'",
            self.as_str(),
            next.as_str()
        )))
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "trialing" => Ok(Self::Trialing),
            "active" => Ok(Self::Active),
            "past_due" => Ok(Self::PastDue),
            "canceled" => Ok(Self::Canceled),
            "unpaid" => Ok(Self::Unpaid),
            _ => Err(AppError::Validation(format!(
                "unknown subscription status '{value}'"
            ))),
        }
    }
}

/// Current subscription held by a user. One row per user, superseded in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionGrant {
    /// Subscriber.
    pub user_id: UserId,
    /// Subscribed plan.
    pub plan: PlanName,
    /// Minute allowance for each billing period.
    pub minute_limit: MinuteLimit,
    /// Start of the current billing period.
    pub period_start: DateTime<Utc>,
    /// End of the current billing period.
    pub period_end: DateTime<Utc>,
    /// Lifecycle status.
    pub status: SubscriptionStatus,
    /// Billing provider customer reference.
    pub billing_customer_ref: Option<String>,
    /// Billing provider subscription reference.
    pub billing_subscription_ref: Option<String>,
    /// Identifier of the last billing event applied to this row.
    pub last_event_id: Option<String>,
}

impl SubscriptionGrant {
    /// Returns whether this subscription grants baseline paid access.
    #[must_use]
    pub fn has_paid_plan(&self) -> bool {
        self.status.confers_access() && self.plan.is_paid_eligible()
    }

    /// Returns the billing period over which the minute allowance applies.
    #[must_use]
    pub fn billing_period(&self) -> BillingPeriod {
        BillingPeriod::new(self.period_start, self.period_end)
    }
}
