//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod account;
mod audit;
mod billing;
mod certification;
mod credit;
mod entitlement;
mod plan;
mod subscription;
mod usage;

pub use account::UserAccount;
pub use audit::AuditAction;
pub use billing::{BillingEvent, BillingEventKind};
pub use certification::{CertificationGrant, has_valid_certification};
pub use credit::{CreditGrant, GrantedBy, active_credit_total};
pub use entitlement::{
    AdmissionDecision, AdmissionFunding, EntitlementInputs, EntitlementSnapshot, RemainingMinutes,
};
pub use plan::{MinuteLimit, PlanDefinition, PlanName};
pub use subscription::{SubscriptionGrant, SubscriptionStatus};
pub use usage::{BillableMinutes, BillingPeriod, UsageRecord, total_minutes_in_period};
