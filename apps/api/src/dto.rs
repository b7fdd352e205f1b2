mod admin;
mod billing;
mod common;
mod conversions;
mod entitlements;

pub use admin::{
    CertificationGrantResponse, GrantCertificationRequest, GrantCreditsRequest,
    InvalidateCertificationRequest, UpdateFlagRequest,
};
pub use billing::{BillingEventRequest, BillingEventResponse};
pub(crate) use conversions::parse_timestamp;
pub use common::{HealthDependencyStatus, HealthResponse};
pub use entitlements::{
    CreditGrantResponse, EntitlementSnapshotResponse, RecordUsageRequest, RecordUsageResponse,
    RecordingAdmissionRequest, RecordingAdmissionResponse, SpendCreditRequest,
};
