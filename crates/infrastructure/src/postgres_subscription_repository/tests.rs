use chrono::{Duration, DurationRound, Utc};
use proofai_application::SubscriptionRepository;
use proofai_core::UserId;
use proofai_domain::{MinuteLimit, PlanName, SubscriptionGrant, SubscriptionStatus};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresSubscriptionRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres subscription tests: {error}");
    }

    Some(pool)
}

fn grant(user_id: UserId, plan: PlanName, status: SubscriptionStatus) -> SubscriptionGrant {
    let now = Utc::now()
        .duration_trunc(Duration::seconds(1))
        .unwrap_or_else(|_| unreachable!());
    SubscriptionGrant {
        user_id,
        plan,
        minute_limit: plan.definition().minute_limit,
        period_start: now,
        period_end: now + Duration::days(30),
        status,
        billing_customer_ref: Some("cus_upsert".to_owned()),
        billing_subscription_ref: Some("sub_upsert".to_owned()),
        last_event_id: Some("evt_first".to_owned()),
    }
}

#[tokio::test]
async fn upsert_replaces_the_single_row_per_user() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresSubscriptionRepository::new(pool);
    let user_id = UserId::new();

    let first = grant(user_id, PlanName::Community, SubscriptionStatus::Active);
    let second = SubscriptionGrant {
        last_event_id: Some("evt_second".to_owned()),
        ..grant(user_id, PlanName::Business, SubscriptionStatus::PastDue)
    };

    assert!(repository.upsert_subscription(first).await.is_ok());
    assert!(repository.upsert_subscription(second.clone()).await.is_ok());
    assert!(repository.upsert_subscription(second.clone()).await.is_ok());

    let stored = repository.find_subscription(user_id).await;
    assert!(matches!(stored, Ok(Some(stored)) if stored == second));
}

#[tokio::test]
async fn unbounded_minute_limit_is_stored_as_null() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresSubscriptionRepository::new(pool);
    let user_id = UserId::new();

    assert!(
        repository
            .upsert_subscription(grant(
                user_id,
                PlanName::Lifetime,
                SubscriptionStatus::Active
            ))
            .await
            .is_ok()
    );

    let stored = repository.find_subscription(user_id).await;
    assert!(matches!(
        stored,
        Ok(Some(stored)) if stored.minute_limit == MinuteLimit::Unbounded
    ));
    assert!(matches!(
        repository.find_subscription(UserId::new()).await,
        Ok(None)
    ));
}
