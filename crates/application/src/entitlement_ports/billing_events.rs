use async_trait::async_trait;

use proofai_core::AppResult;
use proofai_domain::BillingEventKind;

/// Repository port for billing event ids that have already been handled.
#[async_trait]
pub trait ProcessedBillingEventRepository: Send + Sync {
    /// Returns whether the event id was handled before.
    async fn is_processed(&self, event_id: &str) -> AppResult<bool>;

    /// Records a handled event id with its outcome. Recording an id twice is a no-op.
    async fn mark_processed(
        &self,
        event_id: &str,
        kind: BillingEventKind,
        outcome: &str,
    ) -> AppResult<()>;
}
