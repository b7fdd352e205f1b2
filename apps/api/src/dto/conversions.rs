use std::str::FromStr;

use chrono::{DateTime, Utc};
use proofai_application::{BillingEventOutcome, UsageRecordOutcome};
use proofai_core::{AppError, AppResult, UserId};
use proofai_domain::{
    AdmissionDecision, AdmissionFunding, BillingEvent, BillingEventKind, CertificationGrant,
    CreditGrant, EntitlementSnapshot, PlanName, SubscriptionStatus,
};

use super::admin::CertificationGrantResponse;
use super::billing::{BillingEventRequest, BillingEventResponse};
use super::entitlements::{
    CreditGrantResponse, EntitlementSnapshotResponse, RecordUsageResponse,
    RecordingAdmissionResponse,
};

/// Parses an RFC 3339 timestamp carried in a request payload.
pub(crate) fn parse_timestamp(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid {field} '{value}': {error}")))
}

fn parse_optional<T>(
    value: Option<String>,
    parse: impl FnOnce(&str) -> AppResult<T>,
) -> AppResult<Option<T>> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse(value.as_str()))
        .transpose()
}

impl From<EntitlementSnapshot> for EntitlementSnapshotResponse {
    fn from(value: EntitlementSnapshot) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            is_admin: value.is_admin,
            is_support: value.is_support,
            has_unlimited_access: value.has_unlimited_access,
            plan: value.plan.as_str().to_owned(),
            has_paid_plan: value.has_paid_plan,
            has_court_certification: value.has_court_certification,
            credits_remaining: value.credits_remaining,
            can_record: value.can_record,
            can_generate_reports: value.can_generate_reports,
            can_access_court_features: value.can_access_court_features,
            remaining_minutes: value.remaining_minutes.limited(),
            degraded: value.degraded,
            resolved_at: value.resolved_at.to_rfc3339(),
        }
    }
}

impl From<AdmissionDecision> for RecordingAdmissionResponse {
    fn from(value: AdmissionDecision) -> Self {
        match value {
            AdmissionDecision::Allowed { funding } => Self {
                allowed: true,
                outcome: "allowed".to_owned(),
                funding: Some(
                    match funding {
                        AdmissionFunding::Unlimited => "unlimited",
                        AdmissionFunding::Plan => "plan",
                        AdmissionFunding::Credit => "credit",
                    }
                    .to_owned(),
                ),
                requested_minutes: None,
                remaining_minutes: None,
            },
            AdmissionDecision::QuotaExceeded {
                requested_minutes,
                remaining_minutes,
            } => Self {
                allowed: false,
                outcome: "quota_exceeded".to_owned(),
                funding: None,
                requested_minutes: Some(requested_minutes),
                remaining_minutes: Some(remaining_minutes),
            },
            AdmissionDecision::NoActivePlan => Self {
                allowed: false,
                outcome: "no_active_plan".to_owned(),
                funding: None,
                requested_minutes: None,
                remaining_minutes: None,
            },
        }
    }
}

impl From<UsageRecordOutcome> for RecordUsageResponse {
    fn from(value: UsageRecordOutcome) -> Self {
        match value {
            UsageRecordOutcome::Recorded(record) => Self {
                recorded: true,
                minutes: record.minutes.get(),
                warning: None,
            },
            UsageRecordOutcome::Skipped => Self {
                recorded: false,
                minutes: 0,
                warning: None,
            },
            UsageRecordOutcome::NotRecorded { minutes, reason } => Self {
                recorded: false,
                minutes: minutes.get(),
                warning: Some(format!("usage was not recorded: {reason}")),
            },
        }
    }
}

impl From<CreditGrant> for CreditGrantResponse {
    fn from(value: CreditGrant) -> Self {
        Self {
            grant_id: value.grant_id.to_string(),
            user_id: value.user_id.to_string(),
            quantity: value.quantity,
            credits_remaining: value.credits_remaining,
            expires_at: value.expires_at.map(|expires_at| expires_at.to_rfc3339()),
            granted_by: value.granted_by.to_string(),
            reason: value.reason,
            source_event_id: value.source_event_id,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

impl From<CertificationGrant> for CertificationGrantResponse {
    fn from(value: CertificationGrant) -> Self {
        Self {
            grant_id: value.grant_id.to_string(),
            user_id: value.user_id.to_string(),
            granted_by: value.granted_by.to_string(),
            reason: value.reason,
            valid: value.valid,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

impl From<BillingEventOutcome> for BillingEventResponse {
    fn from(value: BillingEventOutcome) -> Self {
        let (outcome, reason) = match value {
            BillingEventOutcome::Applied => ("applied", None),
            BillingEventOutcome::Duplicate => ("duplicate", None),
            BillingEventOutcome::Ignored(reason) => ("ignored", Some(reason.as_str().to_owned())),
        };

        Self {
            outcome: outcome.to_owned(),
            reason,
        }
    }
}

impl TryFrom<BillingEventRequest> for BillingEvent {
    type Error = AppError;

    fn try_from(value: BillingEventRequest) -> Result<Self, Self::Error> {
        let event_id = value.event_id.trim().to_owned();
        if event_id.is_empty() {
            return Err(AppError::Validation(
                "billing event id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            event_id,
            kind: BillingEventKind::from_str(value.kind.as_str())?,
            user_id: parse_optional(value.user_id, UserId::from_str)?,
            customer_ref: value.customer_ref.filter(|value| !value.trim().is_empty()),
            subscription_ref: value.subscription_ref.filter(|value| !value.trim().is_empty()),
            price_ref: value.price_ref.filter(|value| !value.trim().is_empty()),
            plan: parse_optional(value.plan, PlanName::from_str)?,
            status: parse_optional(value.status, SubscriptionStatus::from_str)?,
            period_start: parse_optional(value.period_start, |value| {
                parse_timestamp("period_start", value)
            })?,
            period_end: parse_optional(value.period_end, |value| {
                parse_timestamp("period_end", value)
            })?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proofai_core::UserId;
    use proofai_domain::{
        AdmissionDecision, AdmissionFunding, BillingEvent, BillingEventKind, EntitlementSnapshot,
        PlanName, RemainingMinutes, SubscriptionStatus,
    };

    use super::super::billing::BillingEventRequest;
    use super::super::entitlements::{EntitlementSnapshotResponse, RecordingAdmissionResponse};

    fn request() -> BillingEventRequest {
        BillingEventRequest {
            event_id: "evt_1".to_owned(),
            kind: "subscription_updated".to_owned(),
            user_id: None,
            customer_ref: Some("cus_1".to_owned()),
            subscription_ref: Some(String::new()),
            price_ref: None,
            plan: Some("business".to_owned()),
            status: Some("past_due".to_owned()),
            period_start: Some("2026-03-01T00:00:00Z".to_owned()),
            period_end: None,
        }
    }

    #[test]
    fn billing_request_normalises_into_an_event() {
        let event = BillingEvent::try_from(request()).unwrap_or_else(|_| unreachable!());

        assert_eq!(event.kind, BillingEventKind::SubscriptionUpdated);
        assert_eq!(event.plan, Some(PlanName::Business));
        assert_eq!(event.status, Some(SubscriptionStatus::PastDue));
        assert_eq!(event.customer_ref.as_deref(), Some("cus_1"));
        assert!(event.subscription_ref.is_none());
        assert!(event.period_start.is_some());
    }

    #[test]
    fn unknown_event_kind_is_rejected() {
        let mut payload = request();
        payload.kind = "customer.created".to_owned();

        assert!(BillingEvent::try_from(payload).is_err());
    }

    #[test]
    fn malformed_period_is_rejected() {
        let mut payload = request();
        payload.period_end = Some("next tuesday".to_owned());

        assert!(BillingEvent::try_from(payload).is_err());
    }

    #[test]
    fn quota_exceeded_admission_carries_the_numbers() {
        let response = RecordingAdmissionResponse::from(AdmissionDecision::QuotaExceeded {
            requested_minutes: 6,
            remaining_minutes: 5,
        });

        assert!(!response.allowed);
        assert_eq!(response.outcome, "quota_exceeded");
        assert_eq!(response.requested_minutes, Some(6));
        assert_eq!(response.remaining_minutes, Some(5));
    }

    #[test]
    fn credit_funded_admission_names_its_funding() {
        let response = RecordingAdmissionResponse::from(AdmissionDecision::Allowed {
            funding: AdmissionFunding::Credit,
        });

        assert!(response.allowed);
        assert_eq!(response.funding.as_deref(), Some("credit"));
    }

    #[test]
    fn unbounded_minutes_serialise_as_null() {
        let mut snapshot = EntitlementSnapshot::restricted(UserId::new(), Utc::now());
        snapshot.remaining_minutes = RemainingMinutes::Unbounded;

        let json = serde_json::to_value(EntitlementSnapshotResponse::from(snapshot))
            .unwrap_or_else(|_| unreachable!());

        assert!(json["remaining_minutes"].is_null());
        assert_eq!(json["plan"], "starter");
        assert_eq!(json["degraded"], true);
    }
}
