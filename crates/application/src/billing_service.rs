use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use proofai_core::{AppResult, UserId};
use proofai_domain::{
    AuditAction, BillingEvent, BillingEventKind, CreditGrant, GrantedBy, PlanName,
    SubscriptionGrant, SubscriptionStatus,
};

use crate::{
    AccountRepository, AuditEvent, AuditRepository, Clock, CreditGrantInsert,
    CreditGrantRepository, ProcessedBillingEventRepository, SubscriptionRepository,
};

mod catalog;

pub use catalog::BillingCatalog;

const BILLING_ACTOR: &str = "billing";
const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Why a billing event left grant state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingIgnoreReason {
    /// Neither the event metadata nor the customer reference identified an account.
    UnknownUser,
    /// The price reference is not in the catalog and the event names no plan.
    UnknownPrice,
    /// The reported status is not reachable from the stored one.
    InvalidTransition,
    /// The event needs an existing subscription and there is none.
    MissingSubscription,
}

impl BillingIgnoreReason {
    /// Returns a stable transport value for this reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownUser => "unknown_user",
            Self::UnknownPrice => "unknown_price",
            Self::InvalidTransition => "invalid_transition",
            Self::MissingSubscription => "missing_subscription",
        }
    }
}

/// Result of applying one billing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEventOutcome {
    /// Grant state was written.
    Applied,
    /// The event was already applied; nothing changed.
    Duplicate,
    /// The event was dropped.
    Ignored(BillingIgnoreReason),
}

impl BillingEventOutcome {
    /// Returns a stable storage value for this outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Duplicate => "duplicate",
            Self::Ignored(_) => "ignored",
        }
    }
}

/// Translates billing provider events into subscription and credit grants.
#[derive(Clone)]
pub struct BillingReconciliationService {
    accounts: Arc<dyn AccountRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    credits: Arc<dyn CreditGrantRepository>,
    processed_events: Arc<dyn ProcessedBillingEventRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    catalog: BillingCatalog,
    clock: Arc<dyn Clock>,
}

struct SubscriptionChange {
    plan: PlanName,
    status: SubscriptionStatus,
}

impl BillingReconciliationService {
    /// Creates a new billing reconciliation service.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        credits: Arc<dyn CreditGrantRepository>,
        processed_events: Arc<dyn ProcessedBillingEventRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        catalog: BillingCatalog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            subscriptions,
            credits,
            processed_events,
            audit_repository,
            catalog,
            clock,
        }
    }

    /// Applies a normalised billing event. Replaying an event id is a no-op.
    ///
    /// The event id is recorded only after every write succeeded, so a failed
    /// attempt is applied in full on redelivery.
    pub async fn apply_event(&self, event: BillingEvent) -> AppResult<BillingEventOutcome> {
        if self.processed_events.is_processed(&event.event_id).await? {
            tracing::debug!(event_id = %event.event_id, "billing event already processed");
            return Ok(BillingEventOutcome::Duplicate);
        }

        let outcome = self.handle_event(&event).await?;
        self.processed_events
            .mark_processed(&event.event_id, event.kind, outcome.as_str())
            .await?;

        Ok(outcome)
    }

    async fn handle_event(&self, event: &BillingEvent) -> AppResult<BillingEventOutcome> {
        let Some(user_id) = self.identify_user(event).await? else {
            tracing::warn!(
                event_id = %event.event_id,
                kind = %event.kind,
                "dropping billing event for unknown user"
            );
            return Ok(BillingEventOutcome::Ignored(BillingIgnoreReason::UnknownUser));
        };

        if event.kind == BillingEventKind::CheckoutCompleted {
            if let Some(credits) = event
                .price_ref
                .as_deref()
                .and_then(|price_ref| self.catalog.credit_pack_for_price(price_ref))
            {
                return self.grant_credit_pack(user_id, event, credits).await;
            }
        }

        let existing = self.subscriptions.find_subscription(user_id).await?;
        let change = match self.plan_change(event, existing.as_ref()) {
            Ok(change) => change,
            Err(reason) => {
                tracing::warn!(
                    event_id = %event.event_id,
                    user_id = %user_id,
                    reason = reason.as_str(),
                    "ignoring billing event"
                );
                return Ok(BillingEventOutcome::Ignored(reason));
            }
        };

        self.write_subscription(user_id, event, existing, change)
            .await?;
        Ok(BillingEventOutcome::Applied)
    }

    async fn identify_user(&self, event: &BillingEvent) -> AppResult<Option<UserId>> {
        if let Some(user_id) = event.user_id {
            return Ok(Some(user_id));
        }

        match event.customer_ref.as_deref() {
            Some(customer_ref) => self.accounts.find_user_by_customer_ref(customer_ref).await,
            None => Ok(None),
        }
    }

    fn plan_change(
        &self,
        event: &BillingEvent,
        existing: Option<&SubscriptionGrant>,
    ) -> Result<SubscriptionChange, BillingIgnoreReason> {
        let event_plan = event.plan.or_else(|| {
            event
                .price_ref
                .as_deref()
                .and_then(|price_ref| self.catalog.plan_for_price(price_ref))
        });

        let (plan, status) = match event.kind {
            BillingEventKind::CheckoutCompleted => (
                event_plan.ok_or(BillingIgnoreReason::UnknownPrice)?,
                event.status.unwrap_or(SubscriptionStatus::Active),
            ),
            BillingEventKind::SubscriptionUpdated => {
                let plan = event_plan
                    .or(existing.map(|grant| grant.plan))
                    .ok_or(BillingIgnoreReason::UnknownPrice)?;
                let status = event
                    .status
                    .or(existing.map(|grant| grant.status))
                    .unwrap_or(SubscriptionStatus::Active);
                (plan, status)
            }
            BillingEventKind::SubscriptionDeleted => {
                let grant = existing.ok_or(BillingIgnoreReason::MissingSubscription)?;
                (grant.plan, SubscriptionStatus::Canceled)
            }
            BillingEventKind::InvoicePaid => {
                let plan = event_plan
                    .or(existing.map(|grant| grant.plan))
                    .ok_or(BillingIgnoreReason::MissingSubscription)?;
                (plan, SubscriptionStatus::Active)
            }
            BillingEventKind::InvoiceFailed => {
                let grant = existing.ok_or(BillingIgnoreReason::MissingSubscription)?;
                (grant.plan, SubscriptionStatus::PastDue)
            }
        };

        // A new checkout or a different provider subscription supersedes the stored row.
        let supersedes = event.kind == BillingEventKind::CheckoutCompleted
            || existing.is_some_and(|grant| {
                event.subscription_ref.is_some()
                    && grant.billing_subscription_ref.is_some()
                    && event.subscription_ref != grant.billing_subscription_ref
            });

        if let Some(grant) = existing.filter(|_| !supersedes) {
            grant
                .status
                .transition_to(status)
                .map_err(|_| BillingIgnoreReason::InvalidTransition)?;
        }

        Ok(SubscriptionChange { plan, status })
    }

    async fn write_subscription(
        &self,
        user_id: UserId,
        event: &BillingEvent,
        existing: Option<SubscriptionGrant>,
        change: SubscriptionChange,
    ) -> AppResult<()> {
        let (period_start, period_end) = self.period_for(event, existing.as_ref());
        let billing_customer_ref = event
            .customer_ref
            .clone()
            .or_else(|| existing.as_ref().and_then(|grant| grant.billing_customer_ref.clone()));
        let billing_subscription_ref = event.subscription_ref.clone().or_else(|| {
            existing
                .as_ref()
                .and_then(|grant| grant.billing_subscription_ref.clone())
        });

        let account_plan = if change.status == SubscriptionStatus::Canceled {
            PlanName::Starter
        } else {
            change.plan
        };
        self.accounts
            .save_billing_plan(user_id, account_plan, billing_customer_ref.as_deref())
            .await?;

        let grant = SubscriptionGrant {
            user_id,
            plan: change.plan,
            minute_limit: change.plan.definition().minute_limit,
            period_start,
            period_end,
            status: change.status,
            billing_customer_ref,
            billing_subscription_ref,
            last_event_id: Some(event.event_id.clone()),
        };
        self.subscriptions.upsert_subscription(grant).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: BILLING_ACTOR.to_owned(),
                action: AuditAction::BillingEventApplied,
                resource_type: "subscription_grant".to_owned(),
                resource_id: user_id.to_string(),
                detail: Some(format!(
                    "{} '{}' set plan '{}' with status '{}'",
                    event.kind, event.event_id, change.plan, change.status
                )),
            })
            .await?;

        tracing::info!(
            event_id = %event.event_id,
            user_id = %user_id,
            plan = %change.plan,
            status = %change.status,
            "applied billing event"
        );

        Ok(())
    }

    async fn grant_credit_pack(
        &self,
        user_id: UserId,
        event: &BillingEvent,
        credits: u32,
    ) -> AppResult<BillingEventOutcome> {
        let grant = CreditGrant {
            grant_id: Uuid::new_v4(),
            user_id,
            quantity: credits,
            credits_remaining: credits,
            expires_at: None,
            granted_by: GrantedBy::Billing,
            reason: "credit pack purchase".to_owned(),
            source_event_id: Some(event.event_id.clone()),
            created_at: self.clock.now(),
        };
        let grant_id = grant.grant_id;

        match self.credits.insert_credit_grant(grant).await? {
            CreditGrantInsert::AlreadyApplied => {
                tracing::debug!(event_id = %event.event_id, "credit pack already granted");
                Ok(BillingEventOutcome::Duplicate)
            }
            CreditGrantInsert::Inserted => {
                self.audit_repository
                    .append_event(AuditEvent {
                        actor: BILLING_ACTOR.to_owned(),
                        action: AuditAction::BillingEventApplied,
                        resource_type: "credit_grant".to_owned(),
                        resource_id: grant_id.to_string(),
                        detail: Some(format!(
                            "{} '{}' granted {credits} credits",
                            event.kind, event.event_id
                        )),
                    })
                    .await?;

                tracing::info!(
                    event_id = %event.event_id,
                    user_id = %user_id,
                    credits,
                    "granted credit pack"
                );
                Ok(BillingEventOutcome::Applied)
            }
        }
    }

    fn period_for(
        &self,
        event: &BillingEvent,
        existing: Option<&SubscriptionGrant>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        // A renewal that only reports the new end starts where the stored period ended.
        let renewal_start = existing
            .filter(|_| {
                matches!(
                    event.kind,
                    BillingEventKind::InvoicePaid | BillingEventKind::SubscriptionUpdated
                )
            })
            .zip(event.period_end)
            .filter(|(grant, end)| *end > grant.period_end)
            .map(|(grant, _)| grant.period_end);
        let start = event
            .period_start
            .or(renewal_start)
            .or(existing.map(|grant| grant.period_start))
            .unwrap_or_else(|| self.clock.now());
        let end = event
            .period_end
            .or(existing
                .filter(|grant| grant.period_start == start)
                .map(|grant| grant.period_end))
            .unwrap_or(start + Duration::days(DEFAULT_PERIOD_DAYS));

        (start, end)
    }
}

#[cfg(test)]
mod tests;
