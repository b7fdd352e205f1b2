use std::sync::Arc;

use uuid::Uuid;

use proofai_core::{AppResult, UserId};
use proofai_domain::{BillableMinutes, BillingPeriod, UsageRecord};

use crate::{Clock, UsageLedgerRepository};

/// Outcome of recording a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageRecordOutcome {
    /// The usage record was appended.
    Recorded(UsageRecord),
    /// The session billed zero minutes and nothing was written.
    Skipped,
    /// The ledger write failed; the recording itself must not fail because of it.
    NotRecorded {
        /// Minutes that were not persisted.
        minutes: BillableMinutes,
        /// Failure description.
        reason: String,
    },
}

impl UsageRecordOutcome {
    /// Returns whether a ledger row was written.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}

/// Append-only metering of consumed recording minutes.
#[derive(Clone)]
pub struct UsageLedgerService {
    repository: Arc<dyn UsageLedgerRepository>,
    clock: Arc<dyn Clock>,
}

impl UsageLedgerService {
    /// Creates a new usage ledger service.
    #[must_use]
    pub fn new(repository: Arc<dyn UsageLedgerRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Records a finished session, rounding its duration up to whole minutes.
    ///
    /// Never returns an error: storage failures are logged and reported as
    /// [`UsageRecordOutcome::NotRecorded`].
    pub async fn record_usage(
        &self,
        user_id: UserId,
        duration_seconds: u64,
        recording_ref: Option<String>,
    ) -> UsageRecordOutcome {
        let minutes = BillableMinutes::from_seconds(duration_seconds);
        if minutes.is_zero() {
            return UsageRecordOutcome::Skipped;
        }

        let record = UsageRecord {
            record_id: Uuid::new_v4(),
            user_id,
            minutes,
            recording_ref: recording_ref.filter(|value| !value.trim().is_empty()),
            recorded_at: self.clock.now(),
        };

        match self.repository.append_usage(record.clone()).await {
            Ok(()) => {
                tracing::info!(
                    user_id = %user_id,
                    minutes = minutes.get(),
                    "recorded usage"
                );
                UsageRecordOutcome::Recorded(record)
            }
            Err(error) => {
                tracing::warn!(
                    user_id = %user_id,
                    minutes = minutes.get(),
                    error = %error,
                    "failed to record usage"
                );
                UsageRecordOutcome::NotRecorded {
                    minutes,
                    reason: error.to_string(),
                }
            }
        }
    }

    /// Sums minutes recorded within `period`, both bounds included.
    pub async fn total_usage(&self, user_id: UserId, period: BillingPeriod) -> AppResult<u64> {
        self.repository.total_usage_minutes(user_id, period).await
    }
}
