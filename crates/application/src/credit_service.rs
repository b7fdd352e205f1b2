use std::cmp::Ordering;
use std::sync::Arc;

use proofai_core::{AppError, AppResult, UserId};
use proofai_domain::{AuditAction, CreditGrant};

use crate::{AuditEvent, AuditRepository, Clock, CreditGrantRepository};

/// Explicit credit consumption, separate from minute metering.
#[derive(Clone)]
pub struct CreditService {
    repository: Arc<dyn CreditGrantRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    clock: Arc<dyn Clock>,
}

impl CreditService {
    /// Creates a new credit service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn CreditGrantRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            audit_repository,
            clock,
        }
    }

    /// Spends one credit from the active grant that expires soonest.
    ///
    /// Grants without expiry are used last; ties go to the oldest grant. A
    /// grant drained concurrently is skipped in favour of the next candidate.
    pub async fn spend_credit(
        &self,
        user_id: UserId,
        recording_ref: Option<&str>,
    ) -> AppResult<CreditGrant> {
        let now = self.clock.now();
        let mut candidates: Vec<CreditGrant> = self
            .repository
            .list_credit_grants(user_id)
            .await?
            .into_iter()
            .filter(|grant| grant.is_active_at(now))
            .collect();
        candidates.sort_by(spend_order);

        for candidate in candidates {
            let Some(grant) = self.repository.consume_credit(candidate.grant_id).await? else {
                continue;
            };

            // The credit is spent at this point; an audit failure is only logged.
            if let Err(error) = self
                .audit_repository
                .append_event(AuditEvent {
                    actor: user_id.to_string(),
                    action: AuditAction::CreditSpent,
                    resource_type: "credit_grant".to_owned(),
                    resource_id: grant.grant_id.to_string(),
                    detail: Some(match recording_ref {
                        Some(recording_ref) => format!(
                            "spent one credit on recording '{recording_ref}', {} left",
                            grant.credits_remaining
                        ),
                        None => format!("spent one credit, {} left", grant.credits_remaining),
                    }),
                })
                .await
            {
                tracing::warn!(
                    user_id = %user_id,
                    grant_id = %grant.grant_id,
                    error = %error,
                    "failed to audit credit spend"
                );
            }

            tracing::info!(
                user_id = %user_id,
                grant_id = %grant.grant_id,
                credits_remaining = grant.credits_remaining,
                "spent credit"
            );
            return Ok(grant);
        }

        Err(AppError::QuotaExceeded(format!(
            "user '{user_id}' has no active recording credits"
        )))
    }
}

fn spend_order(left: &CreditGrant, right: &CreditGrant) -> Ordering {
    let expiry = match (left.expires_at, right.expires_at) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    expiry.then_with(|| left.created_at.cmp(&right.created_at))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use proofai_core::{AppError, UserId};
    use proofai_domain::AuditAction;

    use super::CreditService;
    use crate::FixedClock;
    use crate::test_support::{FailingLookup, FakeStore, credit, fixed_now};

    fn service(store: &Arc<FakeStore>) -> CreditService {
        CreditService::new(
            store.clone(),
            store.clone(),
            Arc::new(FixedClock::new(fixed_now())),
        )
    }

    #[tokio::test]
    async fn spends_soonest_expiring_grant_first() {
        let store = Arc::new(FakeStore::default());
        let user_id = UserId::new();
        let open = credit(user_id, 1, None);
        let late = credit(user_id, 1, Some(fixed_now() + Duration::days(30)));
        let soon = credit(user_id, 1, Some(fixed_now() + Duration::days(2)));
        store.put_credit(open.clone()).await;
        store.put_credit(late.clone()).await;
        store.put_credit(soon.clone()).await;

        let credits = service(&store);
        let first = credits.spend_credit(user_id, Some("rec-9")).await;
        let second = credits.spend_credit(user_id, None).await;
        let third = credits.spend_credit(user_id, None).await;

        assert!(matches!(first, Ok(grant) if grant.grant_id == soon.grant_id));
        assert!(matches!(second, Ok(grant) if grant.grant_id == late.grant_id));
        assert!(matches!(third, Ok(grant) if grant.grant_id == open.grant_id));
        assert!(matches!(
            credits.spend_credit(user_id, None).await,
            Err(AppError::QuotaExceeded(_))
        ));
    }

    #[tokio::test]
    async fn expired_grants_are_never_spent() {
        let store = Arc::new(FakeStore::default());
        let user_id = UserId::new();
        store
            .put_credit(credit(user_id, 4, Some(fixed_now())))
            .await;

        let result = service(&store).spend_credit(user_id, None).await;

        assert!(matches!(result, Err(AppError::QuotaExceeded(_))));
        assert_eq!(store.credits.lock().await[0].credits_remaining, 4);
    }

    #[tokio::test]
    async fn spending_is_audited() {
        let store = Arc::new(FakeStore::default());
        let user_id = UserId::new();
        store.put_credit(credit(user_id, 2, None)).await;

        let result = service(&store).spend_credit(user_id, Some("rec-1")).await;

        assert!(matches!(result, Ok(grant) if grant.credits_remaining == 1));
        let events = store.audit_events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::CreditSpent);
        assert_eq!(events[0].actor, user_id.to_string());
    }

    #[tokio::test]
    async fn audit_failure_does_not_undo_a_spent_credit() {
        let store = Arc::new(FakeStore::default());
        let user_id = UserId::new();
        store.put_credit(credit(user_id, 2, None)).await;
        store.fail(FailingLookup::Audit).await;

        let credits = service(&store);
        let result = credits.spend_credit(user_id, Some("rec-2")).await;

        assert!(matches!(result, Ok(grant) if grant.credits_remaining == 1));
        assert_eq!(store.credits.lock().await[0].credits_remaining, 1);
        assert!(store.audit_events.lock().await.is_empty());
    }
}
