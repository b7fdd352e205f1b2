use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use proofai_core::{AppError, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Origin of a grant, recorded for audit purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum GrantedBy {
    /// Granted manually by an administrator.
    Admin(UserId),
    /// Granted by a billing event such as a credit pack purchase.
    Billing,
}

impl Display for GrantedBy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin(user_id) => write!(formatter, "{user_id}"),
            Self::Billing => formatter.write_str("billing"),
        }
    }
}

impl FromStr for GrantedBy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "billing" {
            return Ok(Self::Billing);
        }

        UserId::from_str(value).map(Self::Admin)
    }
}

/// Humanitarian, emergency or purchased credit allotment.
///
/// Rows are never updated in place apart from decrementing `credits_remaining`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditGrant {
    /// Stable grant id.
    pub grant_id: Uuid,
    /// Credited account.
    pub user_id: UserId,
    /// Credits originally granted.
    pub quantity: u32,
    /// Credits not yet spent.
    pub credits_remaining: u32,
    /// Expiry instant; `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Who issued the grant.
    pub granted_by: GrantedBy,
    /// Justification captured when the grant was issued.
    pub reason: String,
    /// Billing event that produced this grant, used as an idempotency key.
    pub source_event_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CreditGrant {
    /// Returns whether the grant has not expired at `now`.
    ///
    /// A grant expiring exactly at `now` is already expired.
    #[must_use]
    pub fn is_unexpired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    /// Returns whether the grant can still be spent at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.credits_remaining > 0 && self.is_unexpired_at(now)
    }
}

/// Sums remaining credits across grants that are unexpired at `now`.
#[must_use]
pub fn active_credit_total<'a>(
    grants: impl IntoIterator<Item = &'a CreditGrant>,
    now: DateTime<Utc>,
) -> u32 {
    let total: u64 = grants
        .into_iter()
        .filter(|grant| grant.is_unexpired_at(now))
        .map(|grant| u64::from(grant.credits_remaining))
        .sum();

    u32::try_from(total).unwrap_or(u32::MAX)
}
