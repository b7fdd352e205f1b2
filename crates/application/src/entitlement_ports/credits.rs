use async_trait::async_trait;
use uuid::Uuid;

use proofai_core::{AppResult, UserId};
use proofai_domain::CreditGrant;

/// Result of inserting a credit grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditGrantInsert {
    /// A new row was written.
    Inserted,
    /// A grant with the same source event already exists; nothing changed.
    AlreadyApplied,
}

/// Repository port for credit grants.
#[async_trait]
pub trait CreditGrantRepository: Send + Sync {
    /// Lists every credit grant for a user, expired and spent ones included.
    async fn list_credit_grants(&self, user_id: UserId) -> AppResult<Vec<CreditGrant>>;

    /// Inserts a grant, deduplicating on `source_event_id` when present.
    async fn insert_credit_grant(&self, grant: CreditGrant) -> AppResult<CreditGrantInsert>;

    /// Decrements one credit if the grant still has any left.
    ///
    /// Returns the updated grant, or `None` when it was already exhausted.
    async fn consume_credit(&self, grant_id: Uuid) -> AppResult<Option<CreditGrant>>;
}
