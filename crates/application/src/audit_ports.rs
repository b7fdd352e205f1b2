use async_trait::async_trait;

use proofai_core::AppResult;
use proofai_domain::AuditAction;

/// Attributable record of a grant or billing mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Acting user id, or `billing` for billing events.
    pub actor: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Affected resource type.
    pub resource_type: String,
    /// Affected resource identifier.
    pub resource_id: String,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Write-only audit sink. Never consulted when resolving entitlements.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
