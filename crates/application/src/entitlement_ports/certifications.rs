use async_trait::async_trait;
use uuid::Uuid;

use proofai_core::{AppResult, UserId};
use proofai_domain::CertificationGrant;

/// Repository port for manual court-certification grants.
#[async_trait]
pub trait CertificationGrantRepository: Send + Sync {
    /// Lists every certification grant for a user.
    async fn list_certification_grants(&self, user_id: UserId)
    -> AppResult<Vec<CertificationGrant>>;

    /// Returns whether the user holds at least one valid grant.
    async fn has_valid_certification(&self, user_id: UserId) -> AppResult<bool>;

    /// Inserts a certification grant.
    async fn insert_certification_grant(&self, grant: CertificationGrant) -> AppResult<()>;

    /// Marks a grant invalid and returns it.
    async fn invalidate_certification_grant(&self, grant_id: Uuid)
    -> AppResult<CertificationGrant>;
}
