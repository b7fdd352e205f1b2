use chrono::Utc;
use proofai_application::CertificationGrantRepository;
use proofai_core::{AppError, UserId};
use proofai_domain::{CertificationGrant, GrantedBy};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresCertificationGrantRepository;

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
        panic!("failed to run migrations for postgres certification tests: {error}");
    }

    Some(pool)
}

fn certification(user_id: UserId) -> CertificationGrant {
    CertificationGrant {
        grant_id: Uuid::new_v4(),
        user_id,
        granted_by: GrantedBy::Admin(UserId::new()),
        reason: "verified court filing".to_owned(),
        valid: true,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn invalidation_keeps_the_row() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresCertificationGrantRepository::new(pool);
    let user_id = UserId::new();
    let grant = certification(user_id);
    let grant_id = grant.grant_id;

    assert!(repository.insert_certification_grant(grant).await.is_ok());
    assert!(matches!(
        repository.has_valid_certification(user_id).await,
        Ok(true)
    ));

    let invalidated = repository.invalidate_certification_grant(grant_id).await;
    assert!(matches!(invalidated, Ok(grant) if !grant.valid));
    assert!(matches!(
        repository.has_valid_certification(user_id).await,
        Ok(false)
    ));
    assert!(matches!(
        repository.list_certification_grants(user_id).await,
        Ok(grants) if grants.len() == 1 && !grants[0].valid
    ));
}

#[tokio::test]
async fn invalidating_an_unknown_grant_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresCertificationGrantRepository::new(pool);

    let result = repository
        .invalidate_certification_grant(Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
