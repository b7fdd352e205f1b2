use async_trait::async_trait;

use proofai_core::{AppResult, UserId};
use proofai_domain::SubscriptionGrant;

/// Repository port for the single current subscription per user.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Finds the current subscription for a user.
    async fn find_subscription(&self, user_id: UserId) -> AppResult<Option<SubscriptionGrant>>;

    /// Inserts or replaces the subscription keyed by `user_id`.
    async fn upsert_subscription(&self, grant: SubscriptionGrant) -> AppResult<()>;
}
