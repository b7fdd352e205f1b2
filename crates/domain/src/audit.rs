use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by grant and billing use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an administrator grants credits.
    CreditsGranted,
    /// Emitted when a credit is spent.
    CreditSpent,
    /// Emitted when an administrator grants court certification.
    CertificationGranted,
    /// Emitted when a certification grant is invalidated.
    CertificationInvalidated,
    /// Emitted when the plan override flag changes.
    PlanOverrideChanged,
    /// Emitted when the profile court certification flag changes.
    CourtCertificationFlagChanged,
    /// Emitted when a billing event changes grant state.
    BillingEventApplied,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditsGranted => "entitlement.credits.granted",
            Self::CreditSpent => "entitlement.credits.spent",
            Self::CertificationGranted => "entitlement.certification.granted",
            Self::CertificationInvalidated => "entitlement.certification.invalidated",
            Self::PlanOverrideChanged => "entitlement.plan_override.changed",
            Self::CourtCertificationFlagChanged => "entitlement.court_certification.changed",
            Self::BillingEventApplied => "billing.event.applied",
        }
    }
}
