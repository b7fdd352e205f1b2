//! Application services and ports.

#![forbid(unsafe_code)]

mod admin_grant_service;
mod audit_ports;
mod billing_service;
mod clock;
mod credit_service;
mod entitlement_ports;
mod entitlement_service;
mod grant_reconciler;
mod usage_ledger_service;

#[cfg(test)]
mod test_support;

pub use admin_grant_service::{AdminGrantService, GrantCertificationInput, GrantCreditsInput};
pub use audit_ports::{AuditEvent, AuditRepository};
pub use billing_service::{
    BillingCatalog, BillingEventOutcome, BillingIgnoreReason, BillingReconciliationService,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use credit_service::CreditService;
pub use entitlement_ports::{
    AccountRepository, CertificationGrantRepository, CreditGrantInsert, CreditGrantRepository,
    ProcessedBillingEventRepository, SubscriptionRepository, UsageLedgerRepository,
};
#[cfg(feature = "test-mode-entitlements")]
pub use entitlement_service::TestModeEntitlementProvider;
pub use entitlement_service::{
    EntitlementResolver, EntitlementService, StandardEntitlementResolver,
};
pub use grant_reconciler::{GrantReconciler, ResolvedGrants};
pub use usage_ledger_service::{UsageLedgerService, UsageRecordOutcome};
