//! Min/max/average statistics over a branch record set.
//!
//! Zero rates are filtered per side: buy figures only see records with a
//! non-zero buy rate, sell figures only see records with a non-zero sell rate.
//! Extraction already drops non-positive rates, so this mostly guards against
//! partially parsed rows coming from a custom row parser.

use serde::Serialize;

use crate::{branch::BranchRecord, domain::Side};

/// Six aggregate figures. A zero field means "unavailable", never a real rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    pub buy_min: f64,
    pub buy_max: f64,
    pub buy_avg: f64,
    pub sell_min: f64,
    pub sell_max: f64,
    pub sell_avg: f64,
}

impl AggregateStats {
    /// True only when every figure is a usable (positive) rate.
    pub fn is_available(&self) -> bool {
        [
            self.buy_min,
            self.buy_max,
            self.buy_avg,
            self.sell_min,
            self.sell_max,
            self.sell_avg,
        ]
        .iter()
        .all(|v| *v > 0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Summary {
    min: f64,
    max: f64,
    avg: f64,
}

fn summarize(values: impl Iterator<Item = f64>) -> Summary {
    let mut count = 0usize;
    let mut total = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for v in values {
        count += 1;
        total += v;
        min = min.min(v);
        max = max.max(v);
    }

    if count == 0 {
        return Summary::default();
    }

    Summary {
        min,
        max,
        avg: total / count as f64,
    }
}

fn side_summary(records: &[BranchRecord], side: Side) -> Summary {
    summarize(
        records
            .iter()
            .map(|r| r.rate(side))
            .filter(|rate| *rate != 0.0),
    )
}

pub fn aggregate(records: &[BranchRecord]) -> AggregateStats {
    let buy = side_summary(records, Side::Buy);
    let sell = side_summary(records, Side::Sell);

    AggregateStats {
        buy_min: buy.min,
        buy_max: buy.max,
        buy_avg: buy.avg,
        sell_min: sell.min,
        sell_max: sell.max,
        sell_avg: sell.avg,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::branch::moscow_offset;

    fn rec(bank: &str, buy: f64, sell: f64) -> BranchRecord {
        let ts = moscow_offset()
            .with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
            .unwrap();
        BranchRecord::new(bank, "", "", "USD", buy, sell, ts)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = aggregate(&[]);
        assert_eq!(stats, AggregateStats::default());
        assert!(!stats.is_available());
    }

    #[test]
    fn two_branch_scenario() {
        let stats = aggregate(&[rec("A", 79.0, 81.0), rec("B", 80.0, 80.5)]);
        assert_eq!(stats.buy_min, 79.0);
        assert_eq!(stats.buy_max, 80.0);
        assert!(close(stats.buy_avg, 79.5));
        assert_eq!(stats.sell_min, 80.5);
        assert_eq!(stats.sell_max, 81.0);
        assert!(close(stats.sell_avg, 80.75));
        assert!(stats.is_available());
    }

    #[test]
    fn zero_rates_are_filtered_per_side() {
        let stats = aggregate(&[
            rec("a", 10.0, 0.0),
            rec("b", 0.0, 20.0),
            rec("c", 30.0, 40.0),
        ]);
        assert_eq!((stats.buy_min, stats.buy_max), (10.0, 30.0));
        assert!(close(stats.buy_avg, 20.0));
        assert_eq!((stats.sell_min, stats.sell_max), (20.0, 40.0));
        assert!(close(stats.sell_avg, 30.0));
    }

    #[test]
    fn side_without_qualifying_records_stays_zero() {
        let stats = aggregate(&[rec("a", 10.0, 0.0), rec("b", 12.0, 0.0)]);
        assert_eq!(stats.buy_min, 10.0);
        assert_eq!(stats.sell_min, 0.0);
        assert_eq!(stats.sell_max, 0.0);
        assert_eq!(stats.sell_avg, 0.0);
        assert!(!stats.sell_avg.is_nan());
        assert!(!stats.is_available());
    }

    #[test]
    fn every_rate_lies_within_bounds() {
        let records: Vec<_> = [77.1, 80.3, 79.9, 78.45, 81.0]
            .iter()
            .enumerate()
            .map(|(i, buy)| rec(&format!("bank{i}"), *buy, buy + 1.5))
            .collect();
        let stats = aggregate(&records);

        for r in &records {
            assert!(stats.buy_min <= r.buy_rate && r.buy_rate <= stats.buy_max);
            assert!(stats.sell_min <= r.sell_rate && r.sell_rate <= stats.sell_max);
        }
        let mean = records.iter().map(|r| r.buy_rate).sum::<f64>() / records.len() as f64;
        assert!(close(stats.buy_avg, mean));
        assert!(close(stats.sell_avg, mean + 1.5));
    }
}
