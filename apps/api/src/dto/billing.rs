use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Normalised billing event delivered by the billing edge.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/billing-event-request.ts"
)]
pub struct BillingEventRequest {
    pub event_id: String,
    pub kind: String,
    pub user_id: Option<String>,
    pub customer_ref: Option<String>,
    pub subscription_ref: Option<String>,
    pub price_ref: Option<String>,
    pub plan: Option<String>,
    pub status: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
}

/// Result of applying a billing event.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/billing-event-response.ts"
)]
pub struct BillingEventResponse {
    /// `applied`, `duplicate` or `ignored`.
    pub outcome: String,
    pub reason: Option<String>,
}
