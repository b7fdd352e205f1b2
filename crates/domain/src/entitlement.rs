use chrono::{DateTime, Utc};
use proofai_core::{AccountRole, UserId};
use serde::{Deserialize, Serialize};

use crate::{BillableMinutes, MinuteLimit, PlanName};

/// Minutes left in the current billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "minutes", rename_all = "snake_case")]
pub enum RemainingMinutes {
    /// No minute accounting applies.
    Unbounded,
    /// Whole minutes left; never negative.
    Limited(u32),
}

impl RemainingMinutes {
    /// Computes what is left of `limit` after `used_minutes`, saturating at zero.
    #[must_use]
    pub fn after_usage(limit: MinuteLimit, used_minutes: u64) -> Self {
        match limit {
            MinuteLimit::Unbounded => Self::Unbounded,
            MinuteLimit::Limited(limit) => {
                let left = u64::from(limit).saturating_sub(used_minutes);
                Self::Limited(u32::try_from(left).unwrap_or(u32::MAX))
            }
        }
    }

    /// Returns whether `requested` fits into what is left.
    #[must_use]
    pub fn covers(&self, requested: BillableMinutes) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(left) => requested.get() <= *left,
        }
    }

    /// Returns the finite remainder, or `None` when unbounded.
    #[must_use]
    pub fn limited(&self) -> Option<u32> {
        match self {
            Self::Unbounded => None,
            Self::Limited(left) => Some(*left),
        }
    }
}

/// Grant facts gathered for one resolution, already merged by precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementInputs {
    /// Resolved account.
    pub user_id: UserId,
    /// Account role.
    pub role: AccountRole,
    /// Effective plan shown to callers.
    pub plan: PlanName,
    /// Admin, override or lifetime access.
    pub has_unlimited_access: bool,
    /// Paid subscription in an access-conferring status.
    pub has_paid_plan: bool,
    /// Union of every certification source.
    pub has_court_certification: bool,
    /// Sum of unexpired credits.
    pub active_credits: u32,
    /// Minute allowance of the paid subscription; zero without one.
    pub minute_limit: MinuteLimit,
    /// Minutes consumed in the current period.
    pub used_minutes: u64,
    /// Whether a lookup failed and a restrictive fallback was used.
    pub degraded: bool,
    /// Instant the inputs were evaluated at.
    pub resolved_at: DateTime<Utc>,
}

/// Complete, internally consistent entitlement view for one user at one instant.
///
/// Derived on every request and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementSnapshot {
    /// Resolved account.
    pub user_id: UserId,
    /// Account has the admin role.
    pub is_admin: bool,
    /// Account has the support role.
    pub is_support: bool,
    /// Every quota check is bypassed.
    pub has_unlimited_access: bool,
    /// Effective plan.
    pub plan: PlanName,
    /// Paid subscription in an access-conferring status.
    pub has_paid_plan: bool,
    /// Court certification from any source.
    pub has_court_certification: bool,
    /// Sum of unexpired credits.
    pub credits_remaining: u32,
    /// New recordings may be started.
    pub can_record: bool,
    /// Reports may be generated.
    pub can_generate_reports: bool,
    /// Court-certified features may be used.
    pub can_access_court_features: bool,
    /// Minutes left in the current billing period.
    pub remaining_minutes: RemainingMinutes,
    /// Whether a lookup failed and a restrictive fallback was used.
    pub degraded: bool,
    /// Instant the snapshot was computed at.
    pub resolved_at: DateTime<Utc>,
}

impl EntitlementSnapshot {
    /// Derives the snapshot from merged grant facts.
    #[must_use]
    pub fn from_inputs(inputs: EntitlementInputs) -> Self {
        let unlimited = inputs.has_unlimited_access;
        let can_record = unlimited || inputs.has_paid_plan || inputs.active_credits > 0;
        // Recording and reporting stay co-gated.
        let can_generate_reports = can_record;
        let has_court_certification = unlimited || inputs.has_court_certification;

        let remaining_minutes = if unlimited {
            RemainingMinutes::Unbounded
        } else if inputs.has_paid_plan {
            RemainingMinutes::after_usage(inputs.minute_limit, inputs.used_minutes)
        } else {
            RemainingMinutes::Limited(0)
        };

        Self {
            user_id: inputs.user_id,
            is_admin: inputs.role == AccountRole::Admin,
            is_support: inputs.role == AccountRole::Support,
            has_unlimited_access: unlimited,
            plan: inputs.plan,
            has_paid_plan: inputs.has_paid_plan,
            has_court_certification,
            credits_remaining: inputs.active_credits,
            can_record,
            can_generate_reports,
            can_access_court_features: has_court_certification,
            remaining_minutes,
            degraded: inputs.degraded,
            resolved_at: inputs.resolved_at,
        }
    }

    /// Most restrictive snapshot, used when the account itself cannot be read.
    #[must_use]
    pub fn restricted(user_id: UserId, resolved_at: DateTime<Utc>) -> Self {
        Self::from_inputs(EntitlementInputs {
            user_id,
            role: AccountRole::User,
            plan: PlanName::Starter,
            has_unlimited_access: false,
            has_paid_plan: false,
            has_court_certification: false,
            active_credits: 0,
            minute_limit: MinuteLimit::Limited(0),
            used_minutes: 0,
            degraded: true,
            resolved_at,
        })
    }
}

/// What pays for an admitted recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionFunding {
    /// Unlimited access; nothing is metered.
    Unlimited,
    /// The paid plan's remaining minutes cover the request.
    Plan,
    /// An active credit covers the recording.
    Credit,
}

/// Outcome of the pre-flight recording check. Advisory; nothing is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionDecision {
    /// The recording may start.
    Allowed {
        /// What pays for the recording.
        funding: AdmissionFunding,
    },
    /// The paid plan does not have enough minutes left and no credit is available.
    QuotaExceeded {
        /// Minutes the session would bill.
        requested_minutes: u32,
        /// Minutes left in the period.
        remaining_minutes: u32,
    },
    /// No plan, credit or override allows recording.
    NoActivePlan,
}

impl AdmissionDecision {
    /// Evaluates a recording request of `duration_seconds` against a snapshot.
    #[must_use]
    pub fn evaluate(snapshot: &EntitlementSnapshot, duration_seconds: u64) -> Self {
        if snapshot.has_unlimited_access {
            return Self::Allowed {
                funding: AdmissionFunding::Unlimited,
            };
        }

        let requested = BillableMinutes::from_seconds(duration_seconds);
        if snapshot.has_paid_plan && snapshot.remaining_minutes.covers(requested) {
            return Self::Allowed {
                funding: AdmissionFunding::Plan,
            };
        }

        if snapshot.credits_remaining > 0 {
            return Self::Allowed {
                funding: AdmissionFunding::Credit,
            };
        }

        if snapshot.has_paid_plan {
            return Self::QuotaExceeded {
                requested_minutes: requested.get(),
                remaining_minutes: snapshot.remaining_minutes.limited().unwrap_or(0),
            };
        }

        Self::NoActivePlan
    }

    /// Returns whether the recording may start.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}
