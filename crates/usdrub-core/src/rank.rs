//! Ranking, line rendering and page chunking.
//!
//! All functions here are pure. Ranking sorts a vector of references, so the
//! canonical record list keeps its extraction order.

use crate::{branch::BranchRecord, domain::Side};

/// Lines per page for chat and terminal delivery.
pub const PAGE_SIZE: usize = 10;

/// Best offer first: descending buy rate, ascending sell rate. Ties keep
/// extraction order. Records with a zero rate on `side` are left out.
pub fn rank(records: &[BranchRecord], side: Side) -> Vec<&BranchRecord> {
    let mut ranked: Vec<&BranchRecord> = records.iter().filter(|r| r.rate(side) != 0.0).collect();

    match side {
        Side::Buy => ranked.sort_by(|a, b| b.buy_rate.total_cmp(&a.buy_rate)),
        Side::Sell => ranked.sort_by(|a, b| a.sell_rate.total_cmp(&b.sell_rate)),
    }

    ranked
}

/// `"{rank}) {rate} RUB: {bank}, {address}, {subway} ({updated})"`, with empty
/// address or subway omitted.
pub fn render_line(position: usize, record: &BranchRecord, side: Side) -> String {
    let place = [
        record.bank.as_str(),
        record.address.as_str(),
        record.subway.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(", ");

    format!(
        "{position}) {:.2} RUB: {place} ({})",
        record.rate(side),
        record.updated_display()
    )
}

pub fn render(ranked: &[&BranchRecord], side: Side) -> Vec<String> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, r)| render_line(i + 1, r, side))
        .collect()
}

/// Ordered pages of rendered lines. Page indices are `0..page_count()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RankedPages {
    pages: Vec<Vec<String>>,
}

impl RankedPages {
    /// Rank, render and paginate `records` for one side.
    pub fn build(records: &[BranchRecord], side: Side, page_size: usize) -> Self {
        paginate(render(&rank(records, side), side), page_size)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, index: usize) -> Option<&[String]> {
        self.pages.get(index).map(Vec::as_slice)
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.pages.iter().map(Vec::as_slice)
    }
}

/// Split `lines` into chunks of `page_size`; the last chunk holds the rest.
/// No lines gives no pages.
///
/// A zero page size is a programming error: it panics in debug builds and
/// yields no pages in release builds.
pub fn paginate(lines: Vec<String>, page_size: usize) -> RankedPages {
    debug_assert!(page_size > 0, "page size must be positive");
    if page_size == 0 {
        return RankedPages::default();
    }

    let pages = lines
        .chunks(page_size)
        .map(|chunk| chunk.to_vec())
        .collect();

    RankedPages { pages }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::branch::moscow_offset;

    fn rec(bank: &str, buy: f64, sell: f64) -> BranchRecord {
        let ts = moscow_offset()
            .with_ymd_and_hms(2026, 10, 19, 14, 5, 0)
            .unwrap();
        BranchRecord::new(bank, "", "", "USD", buy, sell, ts)
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn buy_ranks_descending_and_sell_ascending() {
        let records = vec![rec("a", 10.0, 10.0), rec("b", 30.0, 30.0), rec("c", 20.0, 20.0)];

        let buy: Vec<f64> = rank(&records, Side::Buy).iter().map(|r| r.buy_rate).collect();
        assert_eq!(buy, vec![30.0, 20.0, 10.0]);

        let sell: Vec<f64> = rank(&records, Side::Sell).iter().map(|r| r.sell_rate).collect();
        assert_eq!(sell, vec![10.0, 20.0, 30.0]);

        // canonical order untouched
        let banks: Vec<&str> = records.iter().map(|r| r.bank.as_str()).collect();
        assert_eq!(banks, vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_rates_keep_extraction_order() {
        let records = vec![rec("first", 80.0, 81.0), rec("second", 80.0, 81.0), rec("third", 79.0, 81.0)];

        let buy: Vec<&str> = rank(&records, Side::Buy).iter().map(|r| r.bank.as_str()).collect();
        assert_eq!(buy, vec!["first", "second", "third"]);

        let sell: Vec<&str> = rank(&records, Side::Sell).iter().map(|r| r.bank.as_str()).collect();
        assert_eq!(sell, vec!["first", "second", "third"]);
    }

    #[test]
    fn zero_rate_records_are_left_out_of_that_side() {
        let records = vec![rec("a", 10.0, 0.0), rec("b", 0.0, 20.0)];
        assert_eq!(rank(&records, Side::Buy).len(), 1);
        assert_eq!(rank(&records, Side::Sell)[0].bank, "b");
    }

    #[test]
    fn paginates_twelve_lines_into_five_five_two() {
        let pages = paginate(lines(12), 5);
        assert_eq!(pages.page_count(), 3);
        assert_eq!(pages.page(0).unwrap().len(), 5);
        assert_eq!(pages.page(1).unwrap().len(), 5);
        assert_eq!(pages.page(2).unwrap(), &["line 10".to_string(), "line 11".to_string()]);
        assert!(pages.page(3).is_none());
        assert_eq!(pages.line_count(), 12);
    }

    #[test]
    fn no_lines_means_no_pages() {
        let pages = paginate(Vec::new(), 5);
        assert!(pages.is_empty());
        assert_eq!(pages.page_count(), 0);
        assert!(pages.page(0).is_none());
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_page() {
        let pages = paginate(lines(10), 5);
        assert_eq!(pages.page_count(), 2);
        assert!(pages.iter().all(|p| p.len() == 5));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "page size must be positive")]
    fn zero_page_size_panics_in_debug() {
        let _ = paginate(lines(3), 0);
    }

    #[test]
    fn renders_two_branch_scenario() {
        let records = vec![rec("A", 79.0, 81.0), rec("B", 80.0, 80.5)];

        let buy = RankedPages::build(&records, Side::Buy, PAGE_SIZE);
        assert_eq!(buy.page_count(), 1);
        let page = buy.page(0).unwrap();
        assert_eq!(page[0], "1) 80.00 RUB: B (19.10.2026 14:05)");
        assert!(page[1].starts_with("2) 79.00 RUB: A"));

        let sell = RankedPages::build(&records, Side::Sell, PAGE_SIZE);
        let page = sell.page(0).unwrap();
        assert!(page[0].starts_with("1) 80.50 RUB: B"));
        assert!(page[1].starts_with("2) 81.00 RUB: A"));
    }

    #[test]
    fn line_includes_address_and_subway_when_present() {
        let mut r = rec("Bank", 79.123, 81.0);
        r.address = "Tverskaya 1".to_string();
        r.subway = "Okhotny Ryad".to_string();
        assert_eq!(
            render_line(3, &r, Side::Buy),
            "3) 79.12 RUB: Bank, Tverskaya 1, Okhotny Ryad (19.10.2026 14:05)"
        );
    }
}
