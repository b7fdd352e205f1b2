use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for a manual credit grant.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/grant-credits-request.ts"
)]
pub struct GrantCreditsRequest {
    pub amount: u32,
    /// RFC 3339 timestamp; omitted for credits that never expire.
    pub expires_at: Option<String>,
    pub reason: String,
}

/// Incoming payload for a manual court-certification grant.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/grant-certification-request.ts"
)]
pub struct GrantCertificationRequest {
    pub reason: String,
}

/// Incoming payload for invalidating a certification grant.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/invalidate-certification-request.ts"
)]
pub struct InvalidateCertificationRequest {
    pub reason: Option<String>,
}

/// Incoming payload for toggling an account flag.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-flag-request.ts"
)]
pub struct UpdateFlagRequest {
    pub enabled: bool,
}

/// API representation of a certification grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/certification-grant-response.ts"
)]
pub struct CertificationGrantResponse {
    pub grant_id: String,
    pub user_id: String,
    pub granted_by: String,
    pub reason: String,
    pub valid: bool,
    pub created_at: String,
}
