use std::fmt::{Display, Formatter};
use std::str::FromStr;

use proofai_core::AppError;
use serde::{Deserialize, Serialize};

/// Subscription plans known to the billing catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanName {
    /// Free tier without baseline recording access.
    #[default]
    Starter,
    /// Entry paid tier.
    Community,
    /// Individual self-defence tier.
    SelfDefender,
    /// Partner organisations tier.
    MissionPartner,
    /// Business tier.
    Business,
    /// One-time purchase with permanent unlimited access.
    Lifetime,
}

/// Per-period minute allowance of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "minutes", rename_all = "snake_case")]
pub enum MinuteLimit {
    /// Fixed number of minutes per billing period.
    Limited(u32),
    /// No minute accounting applies.
    Unbounded,
}

/// Catalog entry describing what a plan confers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanDefinition {
    /// Plan name.
    pub name: PlanName,
    /// Whether an active subscription to this plan grants baseline paid access.
    pub confers_paid_access: bool,
    /// Minute allowance per billing period.
    pub minute_limit: MinuteLimit,
    /// Whether the plan bundles court certification.
    pub includes_court_certification: bool,
}

impl PlanName {
    /// Returns a stable storage value for this plan.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Community => "community",
            Self::SelfDefender => "self_defender",
            Self::MissionPartner => "mission_partner",
            Self::Business => "business",
            Self::Lifetime => "lifetime",
        }
    }

    /// Returns all catalog plans.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PlanName] = &[
            PlanName::Starter,
            PlanName::Community,
            PlanName::SelfDefender,
            PlanName::MissionPartner,
            PlanName::Business,
            PlanName::Lifetime,
        ];

        ALL
    }

    /// Parses a stored plan value, treating unknown names as `starter`.
    ///
    /// Stored rows may carry legacy plan names; those confer no access.
    #[must_use]
    pub fn from_storage(value: &str) -> Self {
        Self::from_str(value).unwrap_or_default()
    }

    /// Returns the catalog definition for this plan.
    #[must_use]
    pub fn definition(&self) -> PlanDefinition {
        let (confers_paid_access, minute_limit, includes_court_certification) = match self {
            Self::Starter => (false, MinuteLimit::Limited(0), false),
            Self::Community => (true, MinuteLimit::Limited(60), false),
            Self::SelfDefender => (true, MinuteLimit::Limited(300), false),
            Self::MissionPartner => (true, MinuteLimit::Limited(600), true),
            Self::Business => (true, MinuteLimit::Limited(1_500), true),
            Self::Lifetime => (true, MinuteLimit::Unbounded, true),
        };

        PlanDefinition {
            name: *self,
            confers_paid_access,
            minute_limit,
            includes_court_certification,
        }
    }

    /// Returns whether this plan belongs to the eligible paid set.
    #[must_use]
    pub fn is_paid_eligible(&self) -> bool {
        self.definition().confers_paid_access
    }

    /// Returns whether holding this plan alone grants unlimited access.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Lifetime)
    }
}

impl Display for PlanName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PlanName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "starter" => Ok(Self::Starter),
            "community" => Ok(Self::Community),
            "self_defender" => Ok(Self::SelfDefender),
            "mission_partner" => Ok(Self::MissionPartner),
            "business" => Ok(Self::Business),
            "lifetime" => Ok(Self::Lifetime),
            _ => Err(AppError::Validation(format!("unknown plan '{value}'"))),
        }
    }
}
