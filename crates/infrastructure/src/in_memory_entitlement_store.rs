use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use proofai_application::{
    AccountRepository, AuditEvent, AuditRepository, CertificationGrantRepository,
    CreditGrantInsert, CreditGrantRepository, ProcessedBillingEventRepository,
    SubscriptionRepository, UsageLedgerRepository,
};
use proofai_core::{AppError, AppResult, UserId};
use proofai_domain::{
    BillingEventKind, BillingPeriod, CertificationGrant, CreditGrant, PlanName,
    SubscriptionGrant, UsageRecord, UserAccount, total_minutes_in_period,
};

/// In-memory entitlement store implementing every storage port.
///
/// Intended for local development; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryEntitlementStore {
    accounts: RwLock<HashMap<UserId, UserAccount>>,
    subscriptions: RwLock<HashMap<UserId, SubscriptionGrant>>,
    credit_grants: RwLock<HashMap<Uuid, CreditGrant>>,
    certification_grants: RwLock<HashMap<Uuid, CertificationGrant>>,
    usage_records: RwLock<Vec<UsageRecord>>,
    audit_events: RwLock<Vec<AuditEvent>>,
    processed_billing_events: RwLock<HashMap<String, (BillingEventKind, String)>>,
}

impl InMemoryEntitlementStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        tracing::warn!("using in-memory entitlement store; grants are lost on restart");
        Self::default()
    }

    /// Inserts or replaces a profile, e.g. to seed local accounts.
    pub async fn save_account(&self, account: UserAccount) {
        self.accounts.write().await.insert(account.user_id, account);
    }

    /// Returns every audit event appended so far, oldest first.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit_events.read().await.clone()
    }

    async fn update_account(&self, user_id: UserId, update: impl FnOnce(&mut UserAccount) + Send) {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .entry(user_id)
            .or_insert_with(|| UserAccount::default_for(user_id));
        update(account);
    }
}

#[async_trait]
impl AccountRepository for InMemoryEntitlementStore {
    async fn find_account(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        Ok(self.accounts.read().await.get(&user_id).cloned())
    }

    async fn find_user_by_customer_ref(&self, customer_ref: &str) -> AppResult<Option<UserId>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.billing_customer_ref.as_deref() == Some(customer_ref))
            .map(|account| account.user_id))
    }

    async fn set_plan_override(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        self.update_account(user_id, |account| account.plan_override = enabled)
            .await;
        Ok(())
    }

    async fn set_court_certification(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        self.update_account(user_id, |account| {
            account.has_court_certification = enabled;
        })
        .await;
        Ok(())
    }

    async fn save_billing_plan(
        &self,
        user_id: UserId,
        plan: PlanName,
        customer_ref: Option<&str>,
    ) -> AppResult<()> {
        let customer_ref = customer_ref.map(str::to_owned);
        self.update_account(user_id, |account| {
            account.plan = plan;
            if customer_ref.is_some() {
                account.billing_customer_ref = customer_ref;
            }
        })
        .await;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryEntitlementStore {
    async fn find_subscription(&self, user_id: UserId) -> AppResult<Option<SubscriptionGrant>> {
        Ok(self.subscriptions.read().await.get(&user_id).cloned())
    }

    async fn upsert_subscription(&self, grant: SubscriptionGrant) -> AppResult<()> {
        self.subscriptions.write().await.insert(grant.user_id, grant);
        Ok(())
    }
}

#[async_trait]
impl CreditGrantRepository for InMemoryEntitlementStore {
    async fn list_credit_grants(&self, user_id: UserId) -> AppResult<Vec<CreditGrant>> {
        let mut grants: Vec<CreditGrant> = self
            .credit_grants
            .read()
            .await
            .values()
            .filter(|grant| grant.user_id == user_id)
            .cloned()
            .collect();
        grants.sort_by(|left, right| left.created_at.cmp(&right.created_at));

        Ok(grants)
    }

    async fn insert_credit_grant(&self, grant: CreditGrant) -> AppResult<CreditGrantInsert> {
        let mut grants = self.credit_grants.write().await;

        if let Some(source_event_id) = grant.source_event_id.as_deref() {
            if grants
                .values()
                .any(|stored| stored.source_event_id.as_deref() == Some(source_event_id))
            {
                return Ok(CreditGrantInsert::AlreadyApplied);
            }
        }

        if grants.contains_key(&grant.grant_id) {
            return Err(AppError::Conflict(format!(
                "credit grant '{}' already exists",
                grant.grant_id
            )));
        }

        grants.insert(grant.grant_id, grant);
        Ok(CreditGrantInsert::Inserted)
    }

    async fn consume_credit(&self, grant_id: Uuid) -> AppResult<Option<CreditGrant>> {
        let mut grants = self.credit_grants.write().await;
        let Some(grant) = grants
            .get_mut(&grant_id)
            .filter(|grant| grant.credits_remaining > 0)
        else {
            return Ok(None);
        };

        grant.credits_remaining -= 1;
        Ok(Some(grant.clone()))
    }
}

#[async_trait]
impl CertificationGrantRepository for InMemoryEntitlementStore {
    async fn list_certification_grants(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<CertificationGrant>> {
        let mut grants: Vec<CertificationGrant> = self
            .certification_grants
            .read()
            .await
            .values()
            .filter(|grant| grant.user_id == user_id)
            .cloned()
            .collect();
        grants.sort_by(|left, right| left.created_at.cmp(&right.created_at));

        Ok(grants)
    }

    async fn has_valid_certification(&self, user_id: UserId) -> AppResult<bool> {
        Ok(self
            .certification_grants
            .read()
            .await
            .values()
            .any(|grant| grant.user_id == user_id && grant.valid))
    }

    async fn insert_certification_grant(&self, grant: CertificationGrant) -> AppResult<()> {
        let mut grants = self.certification_grants.write().await;
        if grants.contains_key(&grant.grant_id) {
            return Err(AppError::Conflict(format!(
                "certification grant '{}' already exists",
                grant.grant_id
            )));
        }

        grants.insert(grant.grant_id, grant);
        Ok(())
    }

    async fn invalidate_certification_grant(
        &self,
        grant_id: Uuid,
    ) -> AppResult<CertificationGrant> {
        let mut grants = self.certification_grants.write().await;
        let grant = grants.get_mut(&grant_id).ok_or_else(|| {
            AppError::NotFound(format!("certification grant '{grant_id}' was not found"))
        })?;

        grant.valid = false;
        Ok(grant.clone())
    }
}

#[async_trait]
impl UsageLedgerRepository for InMemoryEntitlementStore {
    async fn append_usage(&self, record: UsageRecord) -> AppResult<()> {
        self.usage_records.write().await.push(record);
        Ok(())
    }

    async fn total_usage_minutes(&self, user_id: UserId, period: BillingPeriod) -> AppResult<u64> {
        let records = self.usage_records.read().await;
        Ok(total_minutes_in_period(
            records.iter().filter(|record| record.user_id == user_id),
            period,
        ))
    }
}

#[async_trait]
impl ProcessedBillingEventRepository for InMemoryEntitlementStore {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        Ok(self
            .processed_billing_events
            .read()
            .await
            .contains_key(event_id))
    }

    async fn mark_processed(
        &self,
        event_id: &str,
        kind: BillingEventKind,
        outcome: &str,
    ) -> AppResult<()> {
        self.processed_billing_events
            .write()
            .await
            .entry(event_id.to_owned())
            .or_insert_with(|| (kind, outcome.to_owned()));
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for InMemoryEntitlementStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.write().await.push(event);
        Ok(())
    }
}
