use chrono::{DateTime, Utc};
use proofai_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whole minutes billed for a recording session.
///
/// Raw durations are tracked in seconds and rounded up exactly once, when a
/// session is converted into a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillableMinutes(u32);

impl BillableMinutes {
    /// Converts a session duration into billed minutes, rounding up.
    #[must_use]
    pub fn from_seconds(duration_seconds: u64) -> Self {
        let minutes = duration_seconds.div_ceil(60);
        Self(u32::try_from(minutes).unwrap_or(u32::MAX))
    }

    /// Wraps an already-billed minute count read back from storage.
    #[must_use]
    pub fn from_stored(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Returns the minute count.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns whether nothing is billed.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Closed time window `[start, end]` over which a plan's minutes apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl BillingPeriod {
    /// Creates a billing period. A reversed window is normalised.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if end < start {
            return Self {
                start: end,
                end: start,
            };
        }

        Self { start, end }
    }

    /// Returns the inclusive start.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the inclusive end.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns whether `instant` falls inside the period, both bounds included.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Append-only ledger entry for consumed recording minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Stable record id.
    pub record_id: Uuid,
    /// Consuming account.
    pub user_id: UserId,
    /// Minutes billed for the session.
    pub minutes: BillableMinutes,
    /// Recording the usage belongs to, when known.
    pub recording_ref: Option<String>,
    /// When the usage was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Sums billed minutes of records that fall inside `period`.
#[must_use]
pub fn total_minutes_in_period<'a>(
    records: impl IntoIterator<Item = &'a UsageRecord>,
    period: BillingPeriod,
) -> u64 {
    records
        .into_iter()
        .filter(|record| period.contains(record.recorded_at))
        .map(|record| u64::from(record.minutes.get()))
        .sum()
}
