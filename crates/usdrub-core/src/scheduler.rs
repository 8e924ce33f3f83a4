//! Periodic snapshot refresh driven by a five-field cron expression.
//!
//! One background task per scheduler. Each tick runs `RateStore::update` to
//! completion before the next wait starts, so refreshes never overlap.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use tokio::{sync::Mutex, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    branch::{moscow_now, moscow_offset},
    config::Config,
    store::RateStore,
    Error, Result,
};

#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    store: Arc<RateStore>,
    spec: CronSpec,
    cursor_idle: Duration,
    running: Mutex<Option<Running>>,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn new(store: Arc<RateStore>, spec: CronSpec, cursor_idle: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                spec,
                cursor_idle,
                running: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(store: Arc<RateStore>, cfg: &Config) -> Result<Self> {
        let spec = CronSpec::parse(&cfg.cron_spec)?;
        Ok(Self::new(store, spec, cfg.cursor_idle_timeout))
    }

    pub fn spec(&self) -> &CronSpec {
        &self.inner.spec
    }

    /// Refresh once right away, then keep refreshing on schedule until
    /// [`stop`](Self::stop). Calling it again while running does nothing.
    pub async fn start(&self) {
        let mut running = self.inner.running.lock().await;
        if running.is_some() {
            debug!("refresh scheduler already running");
            return;
        }

        self.tick().await;

        let cancel = CancellationToken::new();
        let scheduler = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { scheduler.run(token).await });

        info!(spec = %self.inner.spec, "refresh scheduler started");
        *running = Some(Running { cancel, handle });
    }

    pub async fn stop(&self) {
        let Some(running) = self.inner.running.lock().await.take() else {
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!(error = %e, "refresh task ended abnormally");
        }
        info!("refresh scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.inner.running.lock().await.is_some()
    }

    /// One refresh plus cursor housekeeping. Failures are logged only; the
    /// store keeps its previous data and the next tick retries.
    pub async fn tick(&self) {
        if let Err(e) = self.inner.store.update().await {
            warn!(error = %e, "scheduled refresh failed");
        }

        let evicted = self
            .inner
            .store
            .evict_idle_cursors(self.inner.cursor_idle)
            .await;
        if evicted > 0 {
            debug!(evicted, "idle page cursors evicted");
        }
    }

    async fn run(&self, cancel: CancellationToken) {
        loop {
            let now = moscow_now();
            let Some(next) = self.inner.spec.next_after(now) else {
                warn!(spec = %self.inner.spec, "cron spec never fires again, stopping");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(next = %next.format("%d.%m.%Y %H:%M"), "next refresh scheduled");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(wait) => self.tick().await,
            }
        }
    }
}

/// Parsed `minute hour day-of-month month day-of-week` expression, evaluated
/// in Moscow time.
///
/// Fields accept `*`, numbers, `a-b` ranges, `/step` and comma lists.
/// Day-of-week runs 0-6 from Sunday, with 7 as an alias for Sunday. When both
/// day fields are restricted a time matches if either one does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CronSpec {
    source: String,
    minutes: u64,
    hours: u64,
    days: u64,
    months: u64,
    weekdays: u64,
    days_restricted: bool,
    weekdays_restricted: bool,
}

const MINUTES: FieldRange = FieldRange::new("minute", 0, 59);
const HOURS: FieldRange = FieldRange::new("hour", 0, 23);
const DAYS: FieldRange = FieldRange::new("day of month", 1, 31);
const MONTHS: FieldRange = FieldRange::new("month", 1, 12);
const WEEKDAYS: FieldRange = FieldRange::new("day of week", 0, 7);

/// Upper bound for the next-run search: four years of minutes covers Feb 29.
const SEARCH_LIMIT_MINUTES: i64 = 4 * 366 * 24 * 60;

impl CronSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let fields: Vec<&str> = spec.split_whitespace().collect();
        let [minute, hour, day, month, weekday] = fields[..] else {
            return Err(Error::Config(format!(
                "cron spec {spec:?} must have 5 fields, got {}",
                fields.len()
            )));
        };

        let mut weekdays = WEEKDAYS.parse(weekday)?;
        if weekdays & (1 << 7) != 0 {
            weekdays = (weekdays | 1) & !(1 << 7);
        }

        Ok(Self {
            source: fields.join(" "),
            minutes: MINUTES.parse(minute)?,
            hours: HOURS.parse(hour)?,
            days: DAYS.parse(day)?,
            months: MONTHS.parse(month)?,
            weekdays,
            days_restricted: !day.starts_with('*'),
            weekdays_restricted: !weekday.starts_with('*'),
        })
    }

    pub fn matches(&self, at: DateTime<FixedOffset>) -> bool {
        let hit = |mask: u64, v: u32| mask & (1 << v) != 0;

        if !hit(self.minutes, at.minute()) || !hit(self.hours, at.hour()) {
            return false;
        }
        if !hit(self.months, at.month()) {
            return false;
        }

        let day = hit(self.days, at.day());
        let weekday = hit(self.weekdays, at.weekday().num_days_from_sunday());
        match (self.days_restricted, self.weekdays_restricted) {
            (true, true) => day || weekday,
            (true, false) => day,
            (false, true) => weekday,
            (false, false) => true,
        }
    }

    /// First matching minute strictly after `after`.
    pub fn next_after(&self, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let after = after.with_timezone(&moscow_offset());
        let mut t = after.with_second(0)?.with_nanosecond(0)? + chrono::Duration::minutes(1);

        let mut budget = SEARCH_LIMIT_MINUTES;
        while budget > 0 {
            if self.matches(t) {
                return Some(t);
            }
            // Skip the rest of an hour that cannot match.
            let step = if self.hours & (1 << t.hour()) == 0 {
                60 - i64::from(t.minute())
            } else {
                1
            };
            t += chrono::Duration::minutes(step);
            budget -= step;
        }
        None
    }
}

impl std::fmt::Display for CronSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for CronSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

struct FieldRange {
    name: &'static str,
    lo: u32,
    hi: u32,
}

impl FieldRange {
    const fn new(name: &'static str, lo: u32, hi: u32) -> Self {
        Self { name, lo, hi }
    }

    /// Bitmask with bit `v` set for every allowed value `v`.
    fn parse(&self, raw: &str) -> Result<u64> {
        let mut mask = 0u64;
        for item in raw.split(',') {
            mask |= self.parse_item(item)?;
        }
        Ok(mask)
    }

    fn parse_item(&self, item: &str) -> Result<u64> {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step = self.number(step)?;
                if step == 0 {
                    return Err(self.invalid(item));
                }
                (range, step)
            }
            None => (item, 1),
        };

        let (start, end) = match range {
            "*" => (self.lo, self.hi),
            _ => match range.split_once('-') {
                Some((a, b)) => (self.value(a)?, self.value(b)?),
                // `5/15` means "from 5 to the end, every 15".
                None if step > 1 => (self.value(range)?, self.hi),
                None => {
                    let v = self.value(range)?;
                    (v, v)
                }
            },
        };
        if start > end {
            return Err(self.invalid(item));
        }

        Ok((start..=end)
            .step_by(step as usize)
            .fold(0u64, |mask, v| mask | 1 << v))
    }

    fn value(&self, raw: &str) -> Result<u32> {
        let v = self.number(raw)?;
        if v < self.lo || v > self.hi {
            return Err(Error::Config(format!(
                "cron {} {v} is outside {}-{}",
                self.name, self.lo, self.hi
            )));
        }
        Ok(v)
    }

    fn number(&self, raw: &str) -> Result<u32> {
        raw.parse().map_err(|_| self.invalid(raw))
    }

    fn invalid(&self, raw: &str) -> Error {
        Error::Config(format!("invalid cron {} {raw:?}", self.name))
    }
}
