use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::domain::Side;

/// Display format of branch timestamps, as printed on the listing page.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

/// The listing reports wall-clock time in Moscow (UTC+03:00, no DST).
pub fn moscow_offset() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap_or_else(|| Utc.fix())
}

pub fn moscow_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&moscow_offset())
}

/// One observed cash exchange offer of a bank branch.
///
/// Records are built once per extraction pass and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BranchRecord {
    pub bank: String,
    pub address: String,
    pub subway: String,
    pub currency_code: String,
    pub buy_rate: f64,
    pub sell_rate: f64,
    pub updated_at: DateTime<FixedOffset>,
}

impl BranchRecord {
    pub fn new(
        bank: impl Into<String>,
        address: impl Into<String>,
        subway: impl Into<String>,
        currency_code: impl Into<String>,
        buy_rate: f64,
        sell_rate: f64,
        updated_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            bank: bank.into(),
            address: address.into(),
            subway: subway.into(),
            currency_code: currency_code.into(),
            buy_rate,
            sell_rate,
            updated_at,
        }
    }

    pub fn rate(&self, side: Side) -> f64 {
        match side {
            Side::Buy => self.buy_rate,
            Side::Sell => self.sell_rate,
        }
    }

    /// Stale when older than `max_age` relative to `now`. Timestamps ahead of
    /// `now` (clock skew on the source side) count as fresh.
    pub fn is_fresh(&self, now: DateTime<FixedOffset>, max_age: Duration) -> bool {
        now.signed_duration_since(self.updated_at) <= max_age
    }

    pub fn updated_display(&self) -> String {
        self.updated_at.format(TIMESTAMP_FORMAT).to_string()
    }
}
