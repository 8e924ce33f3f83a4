//! Telegram HTML rendering of summaries and ranked pages.

use chrono::{DateTime, Utc};

use crate::{
    branch::{moscow_offset, TIMESTAMP_FORMAT},
    cursor::PageView,
    domain::{Region, Side},
};

pub const NO_OFFERS_TEXT: &str = "No branch offers yet, try later";

pub const HELP_TEXT: &str = "<b>USD/RUB cash rates</b>\n\n\
/cash - Summary of branch rates\n\
/dashboard - Same as /cash\n\
/help - Show this message\n\n\
<b>Buy cash</b> lists branches paying the most for your dollars.\n\
<b>Sell cash</b> lists branches selling dollars the cheapest.\n\
Use <b>Next</b> under a list to see more branches.";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Summary block as sent for `/cash`. The summary text itself comes from the
/// store and is shown preformatted so the two lines stay aligned.
pub fn summary_html(region: &Region, summary: &str, refreshed_at: Option<DateTime<Utc>>) -> String {
    let mut out = format!(
        "<b>USD/RUB cash, {}</b>\n<pre>{}</pre>",
        escape_html(region.as_str()),
        escape_html(summary)
    );
    if let Some(at) = refreshed_at {
        let local = at.with_timezone(&moscow_offset());
        out.push_str(&format!("\n<i>Refreshed {} MSK</i>", local.format(TIMESTAMP_FORMAT)));
    }
    out
}

pub fn page_html(side: Side, view: &PageView) -> String {
    let title = format!("<b>{}</b>", side.title());
    if view.is_empty() {
        return format!("{title}\n\n{NO_OFFERS_TEXT}");
    }

    let body = view
        .lines
        .iter()
        .map(|l| escape_html(l))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{title}\n\n{body}\n\n<i>page {}/{}</i>",
        view.index + 1,
        view.page_count
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>&\"x\""), "&lt;b&gt;&amp;&quot;x&quot;");
    }

    #[test]
    fn summary_shows_refresh_time_in_moscow() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();
        let html = summary_html(&Region::default(), "Buy:  80.00 .. 79.00 RUB", Some(at));
        assert!(html.starts_with("<b>USD/RUB cash, moskva</b>\n<pre>Buy:  80.00 .. 79.00 RUB</pre>"));
        assert!(html.ends_with("<i>Refreshed 19.10.2026 12:30 MSK</i>"));

        let html = summary_html(&Region::default(), "unavailable", None);
        assert!(!html.contains("Refreshed"));
    }

    #[test]
    fn page_has_title_lines_and_footer() {
        let view = PageView {
            lines: vec![
                "1) 80.00 RUB: B&Co (19.10.2026 14:05)".to_string(),
                "2) 79.00 RUB: A (19.10.2026 14:05)".to_string(),
            ],
            index: 1,
            page_count: 3,
            has_more: true,
        };
        assert_eq!(
            page_html(Side::Sell, &view),
            "<b>Sell cash</b>\n\n1) 80.00 RUB: B&amp;Co (19.10.2026 14:05)\n2) 79.00 RUB: A (19.10.2026 14:05)\n\n<i>page 2/3</i>"
        );
    }

    #[test]
    fn empty_page_says_so() {
        let html = page_html(Side::Buy, &PageView::default());
        assert_eq!(html, format!("<b>Buy cash</b>\n\n{NO_OFFERS_TEXT}"));
    }
}
