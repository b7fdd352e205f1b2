use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of an entitlement snapshot.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/entitlement-snapshot-response.ts"
)]
pub struct EntitlementSnapshotResponse {
    pub user_id: String,
    pub is_admin: bool,
    pub is_support: bool,
    pub has_unlimited_access: bool,
    pub plan: String,
    pub has_paid_plan: bool,
    pub has_court_certification: bool,
    pub credits_remaining: u32,
    pub can_record: bool,
    pub can_generate_reports: bool,
    pub can_access_court_features: bool,
    /// `null` when minutes are not metered.
    pub remaining_minutes: Option<u32>,
    pub degraded: bool,
    pub resolved_at: String,
}

/// Incoming payload for the recording pre-flight check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/recording-admission-request.ts"
)]
pub struct RecordingAdmissionRequest {
    #[ts(type = "number")]
    pub duration_seconds: u64,
}

/// Outcome of the recording pre-flight check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/recording-admission-response.ts"
)]
pub struct RecordingAdmissionResponse {
    pub allowed: bool,
    /// `allowed`, `quota_exceeded` or `no_active_plan`.
    pub outcome: String,
    pub funding: Option<String>,
    pub requested_minutes: Option<u32>,
    pub remaining_minutes: Option<u32>,
}

/// Incoming payload for a finished recording session.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/record-usage-request.ts"
)]
pub struct RecordUsageRequest {
    #[ts(type = "number")]
    pub duration_seconds: u64,
    pub recording_ref: Option<String>,
}

/// Result of metering a finished recording session.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/record-usage-response.ts"
)]
pub struct RecordUsageResponse {
    pub recorded: bool,
    pub minutes: u32,
    pub warning: Option<String>,
}

/// Incoming payload for spending one recording credit.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/spend-credit-request.ts"
)]
pub struct SpendCreditRequest {
    pub recording_ref: Option<String>,
}

/// API representation of a credit grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/credit-grant-response.ts"
)]
pub struct CreditGrantResponse {
    pub grant_id: String,
    pub user_id: String,
    pub quantity: u32,
    pub credits_remaining: u32,
    pub expires_at: Option<String>,
    pub granted_by: String,
    pub reason: String,
    pub source_event_id: Option<String>,
    pub created_at: String,
}
