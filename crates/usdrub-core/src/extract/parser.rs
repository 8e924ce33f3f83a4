//! Document to raw row conversion.
//!
//! The listing markup is generated with hashed class names that change every
//! few releases of the site, so every selector is configurable.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{errors::Error, Result};

/// Textual fields of one listing row, before any validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow {
    pub bank: String,
    pub address: String,
    pub subway: String,
    pub buy: String,
    pub sell: String,
    pub updated: String,
}

/// Pluggable "document into rows" strategy.
pub trait RowParser: Send + Sync {
    fn parse_rows(&self, document: &str) -> Vec<RawRow>;
}

/// CSS selectors locating the listing and the fields of each row.
///
/// `rates` holds both the buy and the sell figure of a row (`79,50 ₽ 81,20 ₽`);
/// the first number is the buy rate and the second the sell rate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowSelectors {
    pub container: String,
    pub row: String,
    pub bank: String,
    pub address: Option<String>,
    pub subway: String,
    pub rates: String,
    pub updated: String,
}

impl Default for RowSelectors {
    fn default() -> Self {
        Self {
            container: ".fdpae".to_string(),
            row: ".cITBmP".to_string(),
            bank: ".gfTHqP".to_string(),
            address: None,
            subway: ".dJGHYE".to_string(),
            rates: ".jzaqdw".to_string(),
            updated: ".hDxmZl".to_string(),
        }
    }
}

pub struct SelectorRowParser {
    container: Selector,
    row: Selector,
    bank: Selector,
    address: Option<Selector>,
    subway: Selector,
    rates: Selector,
    updated: Selector,
}

impl SelectorRowParser {
    pub fn new(selectors: &RowSelectors) -> Result<Self> {
        Ok(Self {
            container: compile(&selectors.container)?,
            row: compile(&selectors.row)?,
            bank: compile(&selectors.bank)?,
            address: selectors.address.as_deref().map(compile).transpose()?,
            subway: compile(&selectors.subway)?,
            rates: compile(&selectors.rates)?,
            updated: compile(&selectors.updated)?,
        })
    }

    /// Parser for the default banki.ru map listing layout.
    pub fn banki() -> Result<Self> {
        Self::new(&RowSelectors::default())
    }

    fn parse_row(&self, row: ElementRef<'_>) -> RawRow {
        let (buy, sell) = split_rates(&child_text(row, &self.rates));

        RawRow {
            bank: child_text(row, &self.bank),
            address: self
                .address
                .as_ref()
                .map(|sel| child_text(row, sel))
                .unwrap_or_default(),
            subway: child_text(row, &self.subway),
            buy,
            sell,
            updated: child_text(row, &self.updated),
        }
    }
}

impl RowParser for SelectorRowParser {
    fn parse_rows(&self, document: &str) -> Vec<RawRow> {
        let html = Html::parse_document(document);

        html.select(&self.container)
            .flat_map(|container| container.select(&self.row))
            .map(|row| self.parse_row(row))
            .collect()
    }
}

fn compile(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| Error::Config(format!("invalid selector {raw:?}: {e:?}")))
}

/// Text of every element matching `sel` under `row`, whitespace collapsed.
fn child_text(row: ElementRef<'_>, sel: &Selector) -> String {
    let text = row.select(sel).flat_map(|e| e.text()).collect::<String>();
    sanitize(&text)
}

pub fn sanitize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn rate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d\s\u{a0}\u{202f}]*(?:[.,]\d+)?").expect("valid regex"))
}

/// First two numbers of a rates cell; missing figures come back empty.
pub fn split_rates(text: &str) -> (String, String) {
    let mut numbers = rate_re()
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string());
    let buy = numbers.next().unwrap_or_default();
    let sell = numbers.next().unwrap_or_default();
    (buy, sell)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
  <div class="fdpae">
    <div class="cITBmP">
      <div class="gfTHqP">Alfa
        Bank</div>
      <div class="dJGHYE">Kurskaya</div>
      <div class="jzaqdw">79,50 ₽ 81,20 ₽</div>
      <div class="hDxmZl">Updated 19.10.2026 12:30</div>
    </div>
    <div class="cITBmP">
      <div class="gfTHqP">Beta</div>
      <div class="jzaqdw">1 079,10 ₽</div>
      <div class="hDxmZl">19.10.2026 12:31</div>
    </div>
  </div>
  <div class="cITBmP"><div class="gfTHqP">Outside container</div></div>
</body></html>
"#;

    #[test]
    fn parses_rows_inside_container_only() {
        let parser = SelectorRowParser::banki().unwrap();
        let rows = parser.parse_rows(PAGE);
        assert_eq!(rows.len(), 2);

        assert_eq!(
            rows[0],
            RawRow {
                bank: "Alfa Bank".to_string(),
                address: String::new(),
                subway: "Kurskaya".to_string(),
                buy: "79,50".to_string(),
                sell: "81,20".to_string(),
                updated: "Updated 19.10.2026 12:30".to_string(),
            }
        );

        assert_eq!(rows[1].bank, "Beta");
        assert_eq!(rows[1].subway, "");
        assert_eq!(rows[1].buy, "1 079,10");
        assert_eq!(rows[1].sell, "");
    }

    #[test]
    fn optional_address_selector_is_used_when_configured() {
        let selectors = RowSelectors {
            container: "table".to_string(),
            row: "tr".to_string(),
            bank: ".bank".to_string(),
            address: Some(".addr".to_string()),
            subway: ".metro".to_string(),
            rates: ".rates".to_string(),
            updated: ".ts".to_string(),
        };
        let parser = SelectorRowParser::new(&selectors).unwrap();
        let rows = parser.parse_rows(
            r#"<table><tr><td class="bank">B</td><td class="addr">Arbat 5</td>
               <td class="rates">80.1 / 81.9</td><td class="ts">19.10.2026 10:00</td></tr></table>"#,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].address, "Arbat 5");
        assert_eq!((rows[0].buy.as_str(), rows[0].sell.as_str()), ("80.1", "81.9"));
    }

    #[test]
    fn invalid_selector_is_a_config_error() {
        let selectors = RowSelectors {
            row: "[[[".to_string(),
            ..RowSelectors::default()
        };
        assert!(matches!(
            SelectorRowParser::new(&selectors),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn empty_document_has_no_rows() {
        let parser = SelectorRowParser::banki().unwrap();
        assert!(parser.parse_rows("").is_empty());
    }
}
