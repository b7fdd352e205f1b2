use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use proofai_core::{AccountRole, AppError, AppResult, UserId};
use proofai_domain::{
    BillingEventKind, BillingPeriod, CertificationGrant, CreditGrant, GrantedBy, PlanName, SubscriptionGrant,
    SubscriptionStatus, UsageRecord, UserAccount, total_minutes_in_period,
};

use crate::{
    AccountRepository, AuditEvent, AuditRepository, CertificationGrantRepository,
    CreditGrantInsert, CreditGrantRepository, FixedClock, GrantReconciler,
    ProcessedBillingEventRepository, StandardEntitlementResolver, SubscriptionRepository,
    UsageLedgerRepository, UsageLedgerService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FailingLookup {
    Accounts,
    Subscriptions,
    Credits,
    Certifications,
    Usage,
    BillingEvents,
    Audit,
}

/// In-process store implementing every port, with switchable lookup failures.
#[derive(Default)]
pub(crate) struct FakeStore {
    pub(crate) accounts: Mutex<HashMap<UserId, UserAccount>>,
    pub(crate) subscriptions: Mutex<HashMap<UserId, SubscriptionGrant>>,
    pub(crate) credits: Mutex<Vec<CreditGrant>>,
    pub(crate) certifications: Mutex<Vec<CertificationGrant>>,
    pub(crate) usage: Mutex<Vec<UsageRecord>>,
    pub(crate) audit_events: Mutex<Vec<AuditEvent>>,
    pub(crate) processed_events: Mutex<HashMap<String, String>>,
    failures: Mutex<HashSet<FailingLookup>>,
    usage_lookups: AtomicUsize,
}

impl FakeStore {
    pub(crate) async fn fail(&self, lookup: FailingLookup) {
        self.failures.lock().await.insert(lookup);
    }

    pub(crate) async fn recover(&self, lookup: FailingLookup) {
        self.failures.lock().await.remove(&lookup);
    }

    pub(crate) fn usage_lookups(&self) -> usize {
        self.usage_lookups.load(Ordering::SeqCst)
    }

    pub(crate) async fn put_account(&self, account: UserAccount) {
        self.accounts.lock().await.insert(account.user_id, account);
    }

    pub(crate) async fn put_subscription(&self, grant: SubscriptionGrant) {
        self.subscriptions.lock().await.insert(grant.user_id, grant);
    }

    pub(crate) async fn put_credit(&self, grant: CreditGrant) {
        self.credits.lock().await.push(grant);
    }

    pub(crate) async fn put_usage(&self, user_id: UserId, minutes: u32, at: DateTime<Utc>) {
        self.usage.lock().await.push(UsageRecord {
            record_id: Uuid::new_v4(),
            user_id,
            minutes: proofai_domain::BillableMinutes::from_stored(minutes),
            recording_ref: None,
            recorded_at: at,
        });
    }

    async fn check(&self, lookup: FailingLookup) -> AppResult<()> {
        if self.failures.lock().await.contains(&lookup) {
            return Err(AppError::UpstreamUnavailable(format!(
                "{lookup:?} store is unavailable"
            )));
        }

        Ok(())
    }

    async fn upsert_account(&self, user_id: UserId, update: impl FnOnce(&mut UserAccount)) {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .entry(user_id)
            .or_insert_with(|| UserAccount::default_for(user_id));
        update(account);
    }
}

#[async_trait]
impl AccountRepository for FakeStore {
    async fn find_account(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        self.check(FailingLookup::Accounts).await?;
        Ok(self.accounts.lock().await.get(&user_id).cloned())
    }

    async fn find_user_by_customer_ref(&self, customer_ref: &str) -> AppResult<Option<UserId>> {
        self.check(FailingLookup::Accounts).await?;
        Ok(self
            .accounts
            .lock()
            .await
            .values()
            .find(|account| account.billing_customer_ref.as_deref() == Some(customer_ref))
            .map(|account| account.user_id))
    }

    async fn set_plan_override(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        self.check(FailingLookup::Accounts).await?;
        self.upsert_account(user_id, |account| account.plan_override = enabled)
            .await;
        Ok(())
    }

    async fn set_court_certification(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        self.check(FailingLookup::Accounts).await?;
        self.upsert_account(user_id, |account| account.has_court_certification = enabled)
            .await;
        Ok(())
    }

    async fn save_billing_plan(
        &self,
        user_id: UserId,
        plan: PlanName,
        customer_ref: Option<&str>,
    ) -> AppResult<()> {
        self.check(FailingLookup::Accounts).await?;
        self.upsert_account(user_id, |account| {
            account.plan = plan;
            if let Some(customer_ref) = customer_ref {
                account.billing_customer_ref = Some(customer_ref.to_owned());
            }
        })
        .await;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for FakeStore {
    async fn find_subscription(&self, user_id: UserId) -> AppResult<Option<SubscriptionGrant>> {
        self.check(FailingLookup::Subscriptions).await?;
        Ok(self.subscriptions.lock().await.get(&user_id).cloned())
    }

    async fn upsert_subscription(&self, grant: SubscriptionGrant) -> AppResult<()> {
        self.check(FailingLookup::Subscriptions).await?;
        self.subscriptions.lock().await.insert(grant.user_id, grant);
        Ok(())
    }
}

#[async_trait]
impl CreditGrantRepository for FakeStore {
    async fn list_credit_grants(&self, user_id: UserId) -> AppResult<Vec<CreditGrant>> {
        self.check(FailingLookup::Credits).await?;
        Ok(self
            .credits
            .lock()
            .await
            .iter()
            .filter(|grant| grant.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_credit_grant(&self, grant: CreditGrant) -> AppResult<CreditGrantInsert> {
        self.check(FailingLookup::Credits).await?;
        let mut credits = self.credits.lock().await;
        if let Some(source_event_id) = grant.source_event_id.as_deref() {
            if credits
                .iter()
                .any(|stored| stored.source_event_id.as_deref() == Some(source_event_id))
            {
                return Ok(CreditGrantInsert::AlreadyApplied);
            }
        }

        credits.push(grant);
        Ok(CreditGrantInsert::Inserted)
    }

    async fn consume_credit(&self, grant_id: Uuid) -> AppResult<Option<CreditGrant>> {
        self.check(FailingLookup::Credits).await?;
        let mut credits = self.credits.lock().await;
        let Some(grant) = credits.iter_mut().find(|grant| grant.grant_id == grant_id) else {
            return Ok(None);
        };
        if grant.credits_remaining == 0 {
            return Ok(None);
        }

        grant.credits_remaining -= 1;
        Ok(Some(grant.clone()))
    }
}

#[async_trait]
impl CertificationGrantRepository for FakeStore {
    async fn list_certification_grants(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<CertificationGrant>> {
        self.check(FailingLookup::Certifications).await?;
        Ok(self
            .certifications
            .lock()
            .await
            .iter()
            .filter(|grant| grant.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn has_valid_certification(&self, user_id: UserId) -> AppResult<bool> {
        self.check(FailingLookup::Certifications).await?;
        Ok(self
            .certifications
            .lock()
            .await
            .iter()
            .any(|grant| grant.user_id == user_id && grant.valid))
    }

    async fn insert_certification_grant(&self, grant: CertificationGrant) -> AppResult<()> {
        self.check(FailingLookup::Certifications).await?;
        self.certifications.lock().await.push(grant);
        Ok(())
    }

    async fn invalidate_certification_grant(
        &self,
        grant_id: Uuid,
    ) -> AppResult<CertificationGrant> {
        self.check(FailingLookup::Certifications).await?;
        let mut certifications = self.certifications.lock().await;
        let grant = certifications
            .iter_mut()
            .find(|grant| grant.grant_id == grant_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("certification grant '{grant_id}' was not found"))
            })?;
        grant.valid = false;
        Ok(grant.clone())
    }
}

#[async_trait]
impl UsageLedgerRepository for FakeStore {
    async fn append_usage(&self, record: UsageRecord) -> AppResult<()> {
        self.check(FailingLookup::Usage).await?;
        self.usage.lock().await.push(record);
        Ok(())
    }

    async fn total_usage_minutes(&self, user_id: UserId, period: BillingPeriod) -> AppResult<u64> {
        self.usage_lookups.fetch_add(1, Ordering::SeqCst);
        self.check(FailingLookup::Usage).await?;
        let usage = self.usage.lock().await;
        Ok(total_minutes_in_period(
            usage.iter().filter(|record| record.user_id == user_id),
            period,
        ))
    }
}

#[async_trait]
impl ProcessedBillingEventRepository for FakeStore {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        self.check(FailingLookup::BillingEvents).await?;
        Ok(self.processed_events.lock().await.contains_key(event_id))
    }

    async fn mark_processed(
        &self,
        event_id: &str,
        _kind: BillingEventKind,
        outcome: &str,
    ) -> AppResult<()> {
        self.check(FailingLookup::BillingEvents).await?;
        self.processed_events
            .lock()
            .await
            .entry(event_id.to_owned())
            .or_insert_with(|| outcome.to_owned());
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for FakeStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.check(FailingLookup::Audit).await?;
        self.audit_events.lock().await.push(event);
        Ok(())
    }
}

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

pub(crate) fn account(role: AccountRole, plan: PlanName) -> UserAccount {
    UserAccount {
        role,
        plan,
        ..UserAccount::default_for(UserId::new())
    }
}

pub(crate) fn subscription(
    user_id: UserId,
    plan: PlanName,
    status: SubscriptionStatus,
) -> SubscriptionGrant {
    let now = fixed_now();
    SubscriptionGrant {
        user_id,
        plan,
        minute_limit: plan.definition().minute_limit,
        period_start: now - chrono::Duration::days(10),
        period_end: now + chrono::Duration::days(20),
        status,
        billing_customer_ref: Some(format!("cus_{user_id}")),
        billing_subscription_ref: Some(format!("sub_{user_id}")),
        last_event_id: None,
    }
}

pub(crate) fn credit(
    user_id: UserId,
    remaining: u32,
    expires_at: Option<DateTime<Utc>>,
) -> CreditGrant {
    CreditGrant {
        grant_id: Uuid::new_v4(),
        user_id,
        quantity: remaining,
        credits_remaining: remaining,
        expires_at,
        granted_by: GrantedBy::Billing,
        reason: "emergency credit".to_owned(),
        source_event_id: None,
        created_at: fixed_now() - chrono::Duration::days(1),
    }
}

pub(crate) fn reconciler(store: &Arc<FakeStore>) -> GrantReconciler {
    GrantReconciler::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    )
}

pub(crate) fn resolver(store: &Arc<FakeStore>) -> StandardEntitlementResolver {
    let clock = Arc::new(FixedClock::new(fixed_now()));
    StandardEntitlementResolver::new(
        reconciler(store),
        UsageLedgerService::new(store.clone(), clock.clone()),
        clock,
    )
}
