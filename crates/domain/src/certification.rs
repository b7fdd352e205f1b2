use chrono::{DateTime, Utc};
use proofai_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::GrantedBy;

/// Manual court-certification grant. Invalidated by flipping `valid`, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationGrant {
    /// Stable grant id.
    pub grant_id: Uuid,
    /// Certified account.
    pub user_id: UserId,
    /// Who issued the grant.
    pub granted_by: GrantedBy,
    /// Justification captured when the grant was issued.
    pub reason: String,
    /// Whether the grant currently counts.
    pub valid: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Returns whether at least one grant is still valid.
#[must_use]
pub fn has_valid_certification<'a>(grants: impl IntoIterator<Item = &'a CertificationGrant>) -> bool {
    grants.into_iter().any(|grant| grant.valid)
}
