use proofai_application::{
    AdminGrantService, BillingReconciliationService, CreditService, EntitlementService,
    UsageLedgerService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub entitlement_service: EntitlementService,
    pub usage_ledger_service: UsageLedgerService,
    pub credit_service: CreditService,
    pub admin_grant_service: AdminGrantService,
    pub billing_service: BillingReconciliationService,
    pub postgres_pool: Option<PgPool>,
    pub identity_gateway_secret: String,
    pub billing_events_secret: String,
}
