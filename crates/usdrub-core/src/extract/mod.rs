//! Branch listing extraction: fetch a document, split it into rows, keep the
//! rows that make a valid and fresh [`BranchRecord`].

pub mod parser;
pub mod source;

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use tracing::debug;

use crate::{
    branch::{moscow_now, moscow_offset, BranchRecord, TIMESTAMP_FORMAT},
    domain::Region,
    errors::Error,
    Result,
};

pub use parser::{RawRow, RowParser, RowSelectors, SelectorRowParser};
pub use source::{DocumentSource, FileDocumentSource, HttpDocumentSource};

pub const DEFAULT_CURRENCY: &str = "USD";

/// Why a single row was dropped. Never surfaces past the extractor.
#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {value:?}")]
    Invalid { field: &'static str, value: String },

    #[error("{field} rate is zero or less: {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("exchange rate is out of date: updated {0}")]
    Stale(String),
}

#[derive(Clone)]
pub struct Extractor {
    source: Arc<dyn DocumentSource>,
    parser: Arc<dyn RowParser>,
    currency_code: String,
    max_age: Duration,
}

impl Extractor {
    pub fn new(source: Arc<dyn DocumentSource>, parser: Arc<dyn RowParser>) -> Self {
        Self {
            source,
            parser,
            currency_code: DEFAULT_CURRENCY.to_string(),
            max_age: Duration::hours(24),
        }
    }

    pub fn with_max_age(mut self, max_age: std::time::Duration) -> Self {
        self.max_age = Duration::from_std(max_age).unwrap_or(Duration::hours(24));
        self
    }

    pub fn with_currency(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    /// One fetch for `region` (blank means the default region), then row
    /// extraction on the blocking pool. A transport failure is an error; a
    /// document without any valid row is an empty list.
    pub async fn fetch(&self, region: &str) -> Result<Vec<BranchRecord>> {
        let region = Region::new(region);
        let document = self.source.fetch_document(&region).await?;

        let extractor = self.clone();
        let records =
            tokio::task::spawn_blocking(move || extractor.extract(&document, moscow_now()))
                .await
                .map_err(|e| Error::External(format!("extraction task failed: {e}")))?;
        debug!(region = %region, records = records.len(), "extraction finished");
        Ok(records)
    }

    /// Rows failing timestamp, rate or freshness checks are skipped.
    pub fn extract(&self, document: &str, now: DateTime<FixedOffset>) -> Vec<BranchRecord> {
        let rows = self.parser.parse_rows(document);
        let total = rows.len();

        let records: Vec<BranchRecord> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| match self.build_record(row, now) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(row = i, error = %e, "skipping branch row");
                    None
                }
            })
            .collect();

        debug!(total, kept = records.len(), "rows parsed");
        records
    }

    fn build_record(
        &self,
        row: RawRow,
        now: DateTime<FixedOffset>,
    ) -> std::result::Result<BranchRecord, RowError> {
        let updated_at = parse_updated(&row.updated)?;
        let buy_rate = parse_rate("buy", &row.buy)?;
        let sell_rate = parse_rate("sell", &row.sell)?;

        let record = BranchRecord::new(
            row.bank,
            row.address,
            row.subway,
            self.currency_code.clone(),
            buy_rate,
            sell_rate,
            updated_at,
        );

        if !record.is_fresh(now, self.max_age) {
            return Err(RowError::Stale(record.updated_display()));
        }
        Ok(record)
    }
}

/// The timestamp is the last two tokens of the cell (`... 19.10.2026 12:30`).
fn parse_updated(text: &str) -> std::result::Result<DateTime<FixedOffset>, RowError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(RowError::Missing("updated timestamp"));
    }
    let stamp = tokens[tokens.len() - 2..].join(" ");

    let naive = NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).map_err(|_| {
        RowError::Invalid {
            field: "updated timestamp",
            value: stamp.clone(),
        }
    })?;

    moscow_offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or(RowError::Invalid {
            field: "updated timestamp",
            value: stamp,
        })
}

/// Accepts grouping spaces and a decimal comma (`1 079,10`).
fn parse_rate(field: &'static str, text: &str) -> std::result::Result<f64, RowError> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Err(RowError::Missing(field));
    }

    let value: f64 = cleaned.parse().map_err(|_| RowError::Invalid {
        field,
        value: text.to_string(),
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(RowError::NotPositive { field, value });
    }
    Ok(value)
}
