use async_trait::async_trait;

use proofai_core::{AppResult, UserId};
use proofai_domain::{BillingPeriod, UsageRecord};

/// Append-only usage ledger port.
#[async_trait]
pub trait UsageLedgerRepository: Send + Sync {
    /// Appends an immutable usage record.
    async fn append_usage(&self, record: UsageRecord) -> AppResult<()>;

    /// Sums minutes recorded within `period`, both bounds included.
    async fn total_usage_minutes(&self, user_id: UserId, period: BillingPeriod) -> AppResult<u64>;
}
