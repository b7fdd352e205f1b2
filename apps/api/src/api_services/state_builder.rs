use std::sync::Arc;

use proofai_application::{
    AdminGrantService, BillingReconciliationService, Clock, CreditService, EntitlementResolver,
    EntitlementService, GrantReconciler, StandardEntitlementResolver, SystemClock,
    UsageLedgerService,
};
use proofai_core::AppError;
use proofai_infrastructure::InMemoryEntitlementStore;
use sqlx::PgPool;

use crate::api_config::{ApiConfig, EntitlementProviderKind, EntitlementStoreKind};
use crate::state::AppState;

mod repositories;

pub(crate) use repositories::{RepositorySet, build_in_memory_repository_set};

pub fn build_app_state(pool: Option<PgPool>, config: &ApiConfig) -> Result<AppState, AppError> {
    let repositories = match (config.entitlement_store, pool.as_ref()) {
        (EntitlementStoreKind::Memory, _) => {
            build_in_memory_repository_set(Arc::new(InMemoryEntitlementStore::new()))
        }
        (EntitlementStoreKind::Postgres, Some(pool)) => {
            repositories::build_postgres_repository_set(pool)
        }
        (EntitlementStoreKind::Postgres, None) => {
            return Err(AppError::Internal(
                "postgres entitlement store selected without a connection pool".to_owned(),
            ));
        }
    };

    assemble_app_state(repositories, config, Arc::new(SystemClock), pool)
}

/// Wires services over an already built repository set.
pub(crate) fn assemble_app_state(
    repositories: RepositorySet,
    config: &ApiConfig,
    clock: Arc<dyn Clock>,
    postgres_pool: Option<PgPool>,
) -> Result<AppState, AppError> {
    let usage_ledger_service = UsageLedgerService::new(repositories.usage.clone(), clock.clone());
    let resolver = build_resolver(
        config.entitlement_provider,
        &repositories,
        usage_ledger_service.clone(),
        clock.clone(),
    )?;
    let entitlement_service = EntitlementService::new(resolver);

    Ok(AppState {
        credit_service: CreditService::new(
            repositories.credits.clone(),
            repositories.audit.clone(),
            clock.clone(),
        ),
        admin_grant_service: AdminGrantService::new(
            repositories.accounts.clone(),
            repositories.credits.clone(),
            repositories.certifications.clone(),
            repositories.audit.clone(),
            entitlement_service.clone(),
            clock.clone(),
        ),
        billing_service: BillingReconciliationService::new(
            repositories.accounts.clone(),
            repositories.subscriptions.clone(),
            repositories.credits.clone(),
            repositories.billing_events.clone(),
            repositories.audit.clone(),
            config.billing_catalog.clone(),
            clock,
        ),
        entitlement_service,
        usage_ledger_service,
        postgres_pool,
        identity_gateway_secret: config.identity_gateway_secret.clone(),
        billing_events_secret: config.billing_events_secret.clone(),
    })
}

fn build_resolver(
    provider: EntitlementProviderKind,
    repositories: &RepositorySet,
    usage_ledger_service: UsageLedgerService,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn EntitlementResolver>, AppError> {
    match provider {
        EntitlementProviderKind::Standard => {
            let reconciler = GrantReconciler::new(
                repositories.accounts.clone(),
                repositories.subscriptions.clone(),
                repositories.credits.clone(),
                repositories.certifications.clone(),
            );
            Ok(Arc::new(StandardEntitlementResolver::new(
                reconciler,
                usage_ledger_service,
                clock,
            )))
        }
        #[cfg(feature = "test-mode-entitlements")]
        EntitlementProviderKind::TestMode => Ok(Arc::new(
            proofai_application::TestModeEntitlementProvider::new(clock),
        )),
        #[cfg(not(feature = "test-mode-entitlements"))]
        EntitlementProviderKind::TestMode => Err(AppError::Validation(
            "test-mode entitlements are not compiled into this build".to_owned(),
        )),
    }
}
