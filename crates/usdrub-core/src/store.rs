//! The live rate snapshot of one region.
//!
//! A refresh builds a complete [`RateSnapshot`] with no lock held and then
//! swaps it in under a short write lock. Readers clone the `Arc`, so they keep
//! a consistent view for as long as they need it.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    aggregate::{aggregate, AggregateStats},
    branch::BranchRecord,
    config::Config,
    cursor::{CursorTracker, PageRequest, PageView},
    domain::{ChatId, Region, Side},
    extract::{Extractor, HttpDocumentSource, SelectorRowParser},
    rank::{RankedPages, PAGE_SIZE},
    Result,
};

pub const UNAVAILABLE_TEXT: &str = "Cash rates are unavailable, try later";

/// A failed fetch, kept next to the last good data.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FetchFailure {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Result of one extraction pass plus the status of the latest attempt.
///
/// The heavy parts sit behind `Arc` so a failed refresh can republish them
/// with a new `last_error` without copying.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RateSnapshot {
    pub records: Arc<Vec<BranchRecord>>,
    pub stats: AggregateStats,
    pub buy_pages: Arc<RankedPages>,
    pub sell_pages: Arc<RankedPages>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<FetchFailure>,
}

impl RateSnapshot {
    /// Derive stats and both ranked views from one record set.
    pub fn build(records: Vec<BranchRecord>, page_size: usize, at: DateTime<Utc>) -> Self {
        let stats = aggregate(&records);
        let buy_pages = RankedPages::build(&records, Side::Buy, page_size);
        let sell_pages = RankedPages::build(&records, Side::Sell, page_size);

        Self {
            records: Arc::new(records),
            stats,
            buy_pages: Arc::new(buy_pages),
            sell_pages: Arc::new(sell_pages),
            refreshed_at: Some(at),
            last_error: None,
        }
    }

    pub fn pages(&self, side: Side) -> &RankedPages {
        match side {
            Side::Buy => self.buy_pages.as_ref(),
            Side::Sell => self.sell_pages.as_ref(),
        }
    }

    /// Best price first on each line. Any non-positive figure means there is
    /// nothing trustworthy to show.
    pub fn summary_text(&self) -> String {
        let s = &self.stats;
        if !s.is_available() {
            let mut text = UNAVAILABLE_TEXT.to_string();
            if let Some(err) = &self.last_error {
                text.push_str(&format!(
                    "\nLast error: {} ({})",
                    err.message,
                    err.at.format("%d.%m.%Y %H:%M UTC")
                ));
            }
            return text;
        }

        format!(
            "Buy:  {:.2} .. {:.2} RUB (avg {:.2})\nSell: {:.2} .. {:.2} RUB (avg {:.2})",
            s.buy_max, s.buy_min, s.buy_avg, s.sell_min, s.sell_max, s.sell_avg
        )
    }

    fn page_view(&self, side: Side, index: usize) -> PageView {
        let pages = self.pages(side);
        let page_count = pages.page_count();
        PageView {
            lines: pages.page(index).map(<[String]>::to_vec).unwrap_or_default(),
            index,
            page_count,
            has_more: index + 1 < page_count,
        }
    }
}

pub struct RateStore {
    region: Region,
    extractor: Extractor,
    page_size: usize,
    snapshot: RwLock<Arc<RateSnapshot>>,
    cursors: CursorTracker,
}

impl RateStore {
    pub fn new(region: Region, extractor: Extractor) -> Self {
        Self {
            region,
            extractor,
            page_size: PAGE_SIZE,
            snapshot: RwLock::new(Arc::new(RateSnapshot::default())),
            cursors: CursorTracker::new(),
        }
    }

    /// Store wired to the HTTP listing and the default row selectors.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let source = HttpDocumentSource::new(cfg.source_url.clone(), cfg.fetch_timeout)?;
        let parser = SelectorRowParser::banki()?;
        let extractor =
            Extractor::new(Arc::new(source), Arc::new(parser)).with_max_age(cfg.rate_max_age);
        Ok(Self::new(cfg.region.clone(), extractor))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Fetch, aggregate and rank, then publish the result. On a fetch error
    /// the previous data stays in place and only `last_error` changes.
    pub async fn update(&self) -> Result<()> {
        match self.extractor.fetch(self.region.as_str()).await {
            Ok(records) => {
                let next = RateSnapshot::build(records, self.page_size, Utc::now());
                info!(
                    region = %self.region,
                    records = next.records.len(),
                    buy_pages = next.buy_pages.page_count(),
                    sell_pages = next.sell_pages.page_count(),
                    "rates refreshed"
                );
                *self.snapshot.write().await = Arc::new(next);
                Ok(())
            }
            Err(e) => {
                warn!(region = %self.region, error = %e, "rate refresh failed, keeping previous data");
                let failure = FetchFailure {
                    message: e.to_string(),
                    at: Utc::now(),
                };

                let mut guard = self.snapshot.write().await;
                *guard = Arc::new(RateSnapshot {
                    last_error: Some(failure),
                    ..RateSnapshot::clone(&guard)
                });
                Err(e)
            }
        }
    }

    pub async fn read(&self) -> Arc<RateSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn rates(&self) -> (AggregateStats, Option<FetchFailure>) {
        let snapshot = self.read().await;
        (snapshot.stats, snapshot.last_error.clone())
    }

    pub async fn format_summary(&self) -> String {
        self.read().await.summary_text()
    }

    pub async fn page(&self, requester: ChatId, side: Side, request: PageRequest) -> PageView {
        let snapshot = self.read().await;
        let page_count = snapshot.pages(side).page_count();

        match self
            .cursors
            .advance(requester, side, request, page_count)
            .await
        {
            Some(index) => snapshot.page_view(side, index),
            None => PageView::default(),
        }
    }

    pub async fn buy_page(&self, requester: ChatId, request: PageRequest) -> PageView {
        self.page(requester, Side::Buy, request).await
    }

    pub async fn sell_page(&self, requester: ChatId, request: PageRequest) -> PageView {
        self.page(requester, Side::Sell, request).await
    }

    pub async fn evict_idle_cursors(&self, max_idle: Duration) -> usize {
        self.cursors.evict_idle(max_idle).await
    }
}
