use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use proptest::prelude::*;

use proofai_core::{AccountRole, UserId};
use proofai_domain::{
    BillingEvent, BillingEventKind, PlanName, RemainingMinutes, SubscriptionStatus,
};

use super::{
    BillingCatalog, BillingEventOutcome, BillingIgnoreReason, BillingReconciliationService,
};
use crate::test_support::{FailingLookup, FakeStore, account, fixed_now, resolver};
use crate::{EntitlementResolver, FixedClock};

fn catalog() -> BillingCatalog {
    BillingCatalog::new(
        HashMap::from([
            ("price_community".to_owned(), PlanName::Community),
            ("price_business".to_owned(), PlanName::Business),
            ("price_lifetime".to_owned(), PlanName::Lifetime),
        ]),
        HashMap::from([("price_pack3".to_owned(), 3)]),
    )
}

fn service(store: &Arc<FakeStore>) -> BillingReconciliationService {
    BillingReconciliationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        catalog(),
        Arc::new(FixedClock::new(fixed_now())),
    )
}

fn event(event_id: &str, kind: BillingEventKind, user_id: UserId) -> BillingEvent {
    BillingEvent {
        event_id: event_id.to_owned(),
        kind,
        user_id: Some(user_id),
        customer_ref: Some("cus_42".to_owned()),
        subscription_ref: Some("sub_42".to_owned()),
        price_ref: None,
        plan: None,
        status: None,
        period_start: Some(fixed_now() - Duration::days(1)),
        period_end: Some(fixed_now() + Duration::days(29)),
    }
}

fn checkout(event_id: &str, user_id: UserId, price_ref: &str) -> BillingEvent {
    BillingEvent {
        price_ref: Some(price_ref.to_owned()),
        ..event(event_id, BillingEventKind::CheckoutCompleted, user_id)
    }
}

#[tokio::test]
async fn checkout_opens_active_subscription() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();

    let outcome = service(&store)
        .apply_event(checkout("evt_1", user_id, "price_business"))
        .await;

    assert!(matches!(outcome, Ok(BillingEventOutcome::Applied)));
    let subscriptions = store.subscriptions.lock().await;
    let grant = &subscriptions[&user_id];
    assert_eq!(grant.plan, PlanName::Business);
    assert_eq!(grant.status, SubscriptionStatus::Active);
    assert_eq!(grant.last_event_id.as_deref(), Some("evt_1"));
    let accounts = store.accounts.lock().await;
    assert_eq!(accounts[&user_id].plan, PlanName::Business);
    assert_eq!(accounts[&user_id].billing_customer_ref.as_deref(), Some("cus_42"));
}

#[tokio::test]
async fn credit_pack_checkout_grants_credits_once() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    let billing = service(&store);

    let first = billing
        .apply_event(checkout("evt_pack", user_id, "price_pack3"))
        .await;
    let replay = billing
        .apply_event(checkout("evt_pack", user_id, "price_pack3"))
        .await;

    assert!(matches!(first, Ok(BillingEventOutcome::Applied)));
    assert!(matches!(replay, Ok(BillingEventOutcome::Duplicate)));
    let credits = store.credits.lock().await;
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].credits_remaining, 3);
    assert!(store.subscriptions.lock().await.is_empty());
}

#[tokio::test]
async fn unknown_customer_is_dropped() {
    let store = Arc::new(FakeStore::default());
    let mut unknown = checkout("evt_2", UserId::new(), "price_business");
    unknown.user_id = None;
    unknown.customer_ref = Some("cus_missing".to_owned());

    let outcome = service(&store).apply_event(unknown).await;

    assert!(matches!(
        outcome,
        Ok(BillingEventOutcome::Ignored(BillingIgnoreReason::UnknownUser))
    ));
    assert!(store.subscriptions.lock().await.is_empty());
}

#[tokio::test]
async fn customer_reference_identifies_user() {
    let store = Arc::new(FakeStore::default());
    let user = proofai_domain::UserAccount {
        billing_customer_ref: Some("cus_42".to_owned()),
        ..account(AccountRole::User, PlanName::Starter)
    };
    store.put_account(user.clone()).await;
    let mut by_customer = checkout("evt_3", user.user_id, "price_community");
    by_customer.user_id = None;

    let outcome = service(&store).apply_event(by_customer).await;

    assert!(matches!(outcome, Ok(BillingEventOutcome::Applied)));
    assert!(store.subscriptions.lock().await.contains_key(&user.user_id));
}

#[tokio::test]
async fn unknown_price_is_ignored() {
    let store = Arc::new(FakeStore::default());

    let outcome = service(&store)
        .apply_event(checkout("evt_4", UserId::new(), "price_gold"))
        .await;

    assert!(matches!(
        outcome,
        Ok(BillingEventOutcome::Ignored(BillingIgnoreReason::UnknownPrice))
    ));
}

#[tokio::test]
async fn failed_invoice_moves_active_to_past_due() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    let billing = service(&store);
    let resolver = crate::test_support::resolver(&store);

    let _ = billing
        .apply_event(checkout("evt_5", user_id, "price_community"))
        .await;
    assert!(resolver.resolve(user_id).await.has_paid_plan);

    let outcome = billing
        .apply_event(event("evt_6", BillingEventKind::InvoiceFailed, user_id))
        .await;

    assert!(matches!(outcome, Ok(BillingEventOutcome::Applied)));
    assert_eq!(
        store.subscriptions.lock().await[&user_id].status,
        SubscriptionStatus::PastDue
    );
    let snapshot = resolver.resolve(user_id).await;
    assert!(!snapshot.has_paid_plan);
    assert!(!snapshot.can_record);

    let restored = billing
        .apply_event(event("evt_7", BillingEventKind::InvoicePaid, user_id))
        .await;
    assert!(matches!(restored, Ok(BillingEventOutcome::Applied)));
    assert!(resolver.resolve(user_id).await.has_paid_plan);
}

#[tokio::test]
async fn deletion_cancels_and_resets_account_plan() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    let billing = service(&store);

    let _ = billing
        .apply_event(checkout("evt_8", user_id, "price_business"))
        .await;
    let outcome = billing
        .apply_event(event("evt_9", BillingEventKind::SubscriptionDeleted, user_id))
        .await;

    assert!(matches!(outcome, Ok(BillingEventOutcome::Applied)));
    assert_eq!(
        store.subscriptions.lock().await[&user_id].status,
        SubscriptionStatus::Canceled
    );
    assert_eq!(store.accounts.lock().await[&user_id].plan, PlanName::Starter);

    let revived = billing
        .apply_event(event("evt_10", BillingEventKind::InvoicePaid, user_id))
        .await;
    assert!(matches!(
        revived,
        Ok(BillingEventOutcome::Ignored(BillingIgnoreReason::InvalidTransition))
    ));
}

#[tokio::test]
async fn new_checkout_replaces_canceled_subscription() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    let billing = service(&store);

    let _ = billing
        .apply_event(checkout("evt_11", user_id, "price_community"))
        .await;
    let _ = billing
        .apply_event(event("evt_12", BillingEventKind::SubscriptionDeleted, user_id))
        .await;
    let outcome = billing
        .apply_event(checkout("evt_13", user_id, "price_business"))
        .await;

    assert!(matches!(outcome, Ok(BillingEventOutcome::Applied)));
    let subscriptions = store.subscriptions.lock().await;
    assert_eq!(subscriptions[&user_id].status, SubscriptionStatus::Active);
    assert_eq!(subscriptions[&user_id].plan, PlanName::Business);
}

#[tokio::test]
async fn invoice_without_subscription_is_ignored() {
    let store = Arc::new(FakeStore::default());

    let outcome = service(&store)
        .apply_event(event("evt_14", BillingEventKind::InvoiceFailed, UserId::new()))
        .await;

    assert!(matches!(
        outcome,
        Ok(BillingEventOutcome::Ignored(BillingIgnoreReason::MissingSubscription))
    ));
}

#[tokio::test]
async fn billing_writes_are_audited() {
    let store = Arc::new(FakeStore::default());

    let _ = service(&store)
        .apply_event(checkout("evt_15", UserId::new(), "price_community"))
        .await;

    let events = store.audit_events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].actor, "billing");
}

#[tokio::test]
async fn stale_redelivery_does_not_undo_a_later_payment() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    let billing = service(&store);

    let _ = billing
        .apply_event(checkout("evt_open", user_id, "price_community"))
        .await;
    let _ = billing
        .apply_event(event("evt_fail", BillingEventKind::InvoiceFailed, user_id))
        .await;
    let _ = billing
        .apply_event(event("evt_paid", BillingEventKind::InvoicePaid, user_id))
        .await;
    let replay = billing
        .apply_event(event("evt_fail", BillingEventKind::InvoiceFailed, user_id))
        .await;

    assert!(matches!(replay, Ok(BillingEventOutcome::Duplicate)));
    assert_eq!(
        store.subscriptions.lock().await[&user_id].status,
        SubscriptionStatus::Active
    );
    assert!(resolver(&store).resolve(user_id).await.has_paid_plan);
}

#[tokio::test]
async fn ignored_events_are_not_reconsidered_on_redelivery() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    let billing = service(&store);

    let early = billing
        .apply_event(event("evt_early", BillingEventKind::InvoiceFailed, user_id))
        .await;
    let _ = billing
        .apply_event(checkout("evt_open", user_id, "price_community"))
        .await;
    let replay = billing
        .apply_event(event("evt_early", BillingEventKind::InvoiceFailed, user_id))
        .await;

    assert!(matches!(
        early,
        Ok(BillingEventOutcome::Ignored(BillingIgnoreReason::MissingSubscription))
    ));
    assert!(matches!(replay, Ok(BillingEventOutcome::Duplicate)));
    assert_eq!(
        store.subscriptions.lock().await[&user_id].status,
        SubscriptionStatus::Active
    );
}

#[tokio::test]
async fn renewal_with_only_an_end_starts_a_fresh_period() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    let billing = service(&store);

    let opening = BillingEvent {
        period_start: Some(fixed_now() - Duration::days(40)),
        period_end: Some(fixed_now() - Duration::days(10)),
        ..checkout("evt_open", user_id, "price_community")
    };
    let _ = billing.apply_event(opening).await;
    store
        .put_usage(user_id, 60, fixed_now() - Duration::days(20))
        .await;

    let renewal = BillingEvent {
        period_start: None,
        period_end: Some(fixed_now() + Duration::days(20)),
        ..event("evt_renew", BillingEventKind::InvoicePaid, user_id)
    };
    let outcome = billing.apply_event(renewal).await;

    assert!(matches!(outcome, Ok(BillingEventOutcome::Applied)));
    {
        let subscriptions = store.subscriptions.lock().await;
        let grant = &subscriptions[&user_id];
        assert_eq!(grant.period_start, fixed_now() - Duration::days(10));
        assert_eq!(grant.period_end, fixed_now() + Duration::days(20));
    }
    assert_eq!(
        resolver(&store).resolve(user_id).await.remaining_minutes,
        RemainingMinutes::Limited(60)
    );
}

#[tokio::test]
async fn failed_account_write_is_applied_on_redelivery() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    let billing = service(&store);

    let _ = billing
        .apply_event(checkout("evt_life", user_id, "price_lifetime"))
        .await;
    assert!(resolver(&store).resolve(user_id).await.has_unlimited_access);

    store.fail(FailingLookup::Accounts).await;
    let first = billing
        .apply_event(event("evt_cancel", BillingEventKind::SubscriptionDeleted, user_id))
        .await;
    assert!(first.is_err());
    assert_eq!(
        store.subscriptions.lock().await[&user_id].status,
        SubscriptionStatus::Active
    );

    store.recover(FailingLookup::Accounts).await;
    let redelivery = billing
        .apply_event(event("evt_cancel", BillingEventKind::SubscriptionDeleted, user_id))
        .await;

    assert!(matches!(redelivery, Ok(BillingEventOutcome::Applied)));
    assert_eq!(store.accounts.lock().await[&user_id].plan, PlanName::Starter);
    assert!(!resolver(&store).resolve(user_id).await.has_unlimited_access);
}

#[tokio::test]
async fn event_id_is_recorded_only_after_the_writes() {
    let store = Arc::new(FakeStore::default());
    let user_id = UserId::new();
    store.fail(FailingLookup::Subscriptions).await;

    let outcome = service(&store)
        .apply_event(checkout("evt_open", user_id, "price_business"))
        .await;

    assert!(outcome.is_err());
    assert!(store.processed_events.lock().await.is_empty());
}

fn arbitrary_event(user_id: UserId) -> impl Strategy<Value = BillingEvent> {
    (
        0u8..5,
        prop_oneof![
            Just("price_community"),
            Just("price_business"),
            Just("price_pack3")
        ],
        prop_oneof![
            Just(None),
            Just(Some(SubscriptionStatus::Active)),
            Just(Some(SubscriptionStatus::PastDue)),
            Just(Some(SubscriptionStatus::Unpaid)),
        ],
        any::<u16>(),
    )
        .prop_map(move |(kind, price_ref, status, id)| {
            let kind = match kind {
                0 => BillingEventKind::CheckoutCompleted,
                1 => BillingEventKind::SubscriptionUpdated,
                2 => BillingEventKind::SubscriptionDeleted,
                3 => BillingEventKind::InvoicePaid,
                _ => BillingEventKind::InvoiceFailed,
            };
            BillingEvent {
                price_ref: Some(price_ref.to_owned()),
                status,
                ..event(&format!("evt_{id}"), kind, user_id)
            }
        })
}

async fn observable_state(
    store: &FakeStore,
) -> (
    Option<proofai_domain::SubscriptionGrant>,
    Option<PlanName>,
    Vec<(u32, Option<String>)>,
) {
    let subscription = store.subscriptions.lock().await.values().next().cloned();
    let plan = store
        .accounts
        .lock()
        .await
        .values()
        .next()
        .map(|account| account.plan);
    let credits = store
        .credits
        .lock()
        .await
        .iter()
        .map(|grant| (grant.credits_remaining, grant.source_event_id.clone()))
        .collect();

    (subscription, plan, credits)
}

proptest! {
    #[test]
    fn applying_an_event_twice_equals_applying_it_once(
        events in proptest::collection::vec(arbitrary_event(UserId::from_uuid(uuid::Uuid::nil())), 1..12),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap_or_else(|_| unreachable!());

        let (once, twice) = runtime.block_on(async {
            let once_store = Arc::new(FakeStore::default());
            let twice_store = Arc::new(FakeStore::default());
            let once_billing = service(&once_store);
            let twice_billing = service(&twice_store);

            for event in &events {
                let _ = once_billing.apply_event(event.clone()).await;
                let _ = twice_billing.apply_event(event.clone()).await;
                let _ = twice_billing.apply_event(event.clone()).await;
            }

            (
                observable_state(&once_store).await,
                observable_state(&twice_store).await,
            )
        });

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn redelivering_earlier_events_changes_nothing(
        events in proptest::collection::vec(arbitrary_event(UserId::from_uuid(uuid::Uuid::nil())), 2..12),
        replay_order in proptest::collection::vec(any::<prop::sample::Index>(), 1..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap_or_else(|_| unreachable!());

        let (before, after, outcomes) = runtime.block_on(async {
            let store = Arc::new(FakeStore::default());
            let billing = service(&store);

            for event in &events {
                let _ = billing.apply_event(event.clone()).await;
            }
            let before = observable_state(&store).await;

            let mut outcomes = Vec::new();
            for index in &replay_order {
                let earlier = index.get(&events).clone();
                outcomes.push(billing.apply_event(earlier).await);
            }

            (before, observable_state(&store).await, outcomes)
        });

        prop_assert_eq!(before, after);
        prop_assert!(outcomes
            .iter()
            .all(|outcome| matches!(outcome, Ok(BillingEventOutcome::Duplicate))));
    }
}
