use std::sync::Arc;

use proofai_application::{
    AccountRepository, AuditRepository, CertificationGrantRepository, CreditGrantRepository,
    ProcessedBillingEventRepository, SubscriptionRepository, UsageLedgerRepository,
};
use proofai_infrastructure::{
    InMemoryEntitlementStore, PostgresAccountRepository, PostgresAuditRepository,
    PostgresBillingEventRepository, PostgresCertificationGrantRepository, PostgresCreditGrantRepository,
    PostgresSubscriptionRepository, PostgresUsageLedgerRepository,
};
use sqlx::PgPool;

/// Storage ports shared by every service.
#[derive(Clone)]
pub(crate) struct RepositorySet {
    pub(crate) accounts: Arc<dyn AccountRepository>,
    pub(crate) subscriptions: Arc<dyn SubscriptionRepository>,
    pub(crate) credits: Arc<dyn CreditGrantRepository>,
    pub(crate) certifications: Arc<dyn CertificationGrantRepository>,
    pub(crate) usage: Arc<dyn UsageLedgerRepository>,
    pub(crate) billing_events: Arc<dyn ProcessedBillingEventRepository>,
    pub(crate) audit: Arc<dyn AuditRepository>,
}

pub(super) fn build_postgres_repository_set(pool: &PgPool) -> RepositorySet {
    RepositorySet {
        accounts: Arc::new(PostgresAccountRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        credits: Arc::new(PostgresCreditGrantRepository::new(pool.clone())),
        certifications: Arc::new(PostgresCertificationGrantRepository::new(pool.clone())),
        usage: Arc::new(PostgresUsageLedgerRepository::new(pool.clone())),
        billing_events: Arc::new(PostgresBillingEventRepository::new(pool.clone())),
        audit: Arc::new(PostgresAuditRepository::new(pool.clone())),
    }
}

pub(crate) fn build_in_memory_repository_set(store: Arc<InMemoryEntitlementStore>) -> RepositorySet {
    RepositorySet {
        accounts: store.clone(),
        subscriptions: store.clone(),
        credits: store.clone(),
        certifications: store.clone(),
        usage: store.clone(),
        billing_events: store.clone(),
        audit: store,
    }
}
