use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use proofai_core::{AppError, UserId};
use serde::{Deserialize, Serialize};

use crate::{PlanName, SubscriptionStatus};

/// Billing event categories consumed by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingEventKind {
    /// Checkout finished, for either a subscription or a one-time pack.
    CheckoutCompleted,
    /// Subscription plan, period or status changed.
    SubscriptionUpdated,
    /// Subscription terminated.
    SubscriptionDeleted,
    /// Invoice settled, opening or renewing a period.
    InvoicePaid,
    /// Invoice payment failed.
    InvoiceFailed,
}

impl BillingEventKind {
    /// Returns a stable transport value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutCompleted => "checkout_completed",
            Self::SubscriptionUpdated => "subscription_updated",
            Self::SubscriptionDeleted => "subscription_deleted",
            Self::InvoicePaid => "invoice_paid",
            Self::InvoiceFailed => "invoice_failed",
        }
    }
}

impl Display for BillingEventKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for BillingEventKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "checkout_completed" => Ok(Self::CheckoutCompleted),
            "subscription_updated" => Ok(Self::SubscriptionUpdated),
            "subscription_deleted" => Ok(Self::SubscriptionDeleted),
            "invoice_paid" => Ok(Self::InvoicePaid),
            "invoice_failed" => Ok(Self::InvoiceFailed),
            _ => Err(AppError::Validation(format!(
                "unknown billing event kind '{value}'"
            ))),
        }
    }
}

/// Normalised billing event, already authenticated by the delivering edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingEvent {
    /// Provider event id; replaying the same id must not change state twice.
    pub event_id: String,
    /// Event category.
    pub kind: BillingEventKind,
    /// Account id carried in event metadata, when present.
    pub user_id: Option<UserId>,
    /// Billing provider customer reference.
    pub customer_ref: Option<String>,
    /// Billing provider subscription reference.
    pub subscription_ref: Option<String>,
    /// Price reference used to resolve a plan or a credit pack.
    pub price_ref: Option<String>,
    /// Plan named directly by the event, taking precedence over the price map.
    pub plan: Option<PlanName>,
    /// Subscription status reported by the provider.
    pub status: Option<SubscriptionStatus>,
    /// Start of the billing period, when the event carries one.
    pub period_start: Option<DateTime<Utc>>,
    /// End of the billing period, when the event carries one.
    pub period_end: Option<DateTime<Utc>>,
}
