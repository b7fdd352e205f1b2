//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_entitlement_store;
mod postgres_account_repository;
mod postgres_audit_repository;
mod postgres_billing_event_repository;
mod postgres_certification_grant_repository;
mod postgres_credit_grant_repository;
mod postgres_subscription_repository;
mod postgres_usage_ledger_repository;
mod store_error;

pub use in_memory_entitlement_store::InMemoryEntitlementStore;
pub use postgres_account_repository::PostgresAccountRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_billing_event_repository::PostgresBillingEventRepository;
pub use postgres_certification_grant_repository::PostgresCertificationGrantRepository;
pub use postgres_credit_grant_repository::PostgresCreditGrantRepository;
pub use postgres_subscription_repository::PostgresSubscriptionRepository;
pub use postgres_usage_ledger_repository::PostgresUsageLedgerRepository;
