//! Extraction of rows from portal HTML tables and of the current price from
//! the JSON price-list document

use crate::consumption::PriceInfo;
use crate::error::{EcoguardError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Text of an element with each text fragment trimmed, fragments concatenated
fn cell_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

fn child_elements<'a>(parent: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == tag)
}

/// Cell texts of every row in the first table body.
///
/// Rows with fewer than `min_columns` cells are skipped. A document without
/// a table body, such as a maintenance page, is a protocol error.
pub fn extract_rows(html: &str, min_columns: usize) -> Result<Vec<Vec<String>>> {
    let tbody_sel = selector("tbody")
        .ok_or_else(|| EcoguardError::protocol("Invalid table body selector"))?;
    let document = Html::parse_document(html);
    let tbody = document
        .select(&tbody_sel)
        .next()
        .ok_or_else(|| EcoguardError::protocol("No table body"))?;

    Ok(child_elements(tbody, "tr")
        .map(|row| {
            child_elements(row, "td")
                .map(|cell| cell_text(&cell))
                .collect::<Vec<_>>()
        })
        .filter(|cells| cells.len() >= min_columns)
        .collect())
}

/// `value` attribute of the first `<input>` with the given name
pub fn extract_input_value(html: &str, name: &str) -> Option<String> {
    let sel = selector(&format!("input[name=\"{}\"]", name))?;
    let document = Html::parse_document(html);
    document
        .select(&sel)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
struct PriceListDocument {
    #[serde(rename = "PriceLists", default)]
    price_lists: Vec<PriceList>,
}

#[derive(Debug, Deserialize)]
struct PriceList {
    #[serde(rename = "Components", default)]
    components: Vec<PriceComponent>,
    #[serde(rename = "Interval", default)]
    interval: Value,
}

#[derive(Debug, Deserialize)]
struct PriceComponent {
    #[serde(rename = "Rate", default)]
    rate: Option<f64>,
}

fn interval_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Current rate and its validity from a price-list document.
///
/// Reads `PriceLists[0].Components[0].Rate` and `PriceLists[0].Interval`.
/// Returns `Ok(None)` when either array is empty or the rate is null;
/// malformed JSON is a serialization error.
pub fn extract_price(json: &str) -> Result<Option<PriceInfo>> {
    let document: PriceListDocument = serde_json::from_str(json)?;

    let Some(list) = document.price_lists.first() else {
        return Ok(None);
    };
    let Some(rate) = list.components.first().and_then(|c| c.rate) else {
        return Ok(None);
    };

    Ok(Some(PriceInfo {
        rate,
        valid_from: interval_text(&list.interval),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEARLY: &str = r#"
        <html><body><table>
          <thead><tr><th>Månad</th><th>kWh</th><th>Kostnad</th></tr></thead>
          <tbody>
            <tr><td> Januari 2026 </td><td>312,4</td><td>587,31</td></tr>
            <tr><td>Februari 2026</td><td>-</td></tr>
            <tr><td><span>Mars</span> <span>2026</span></td><td>1&nbsp;020,0</td><td>-</td></tr>
          </tbody>
        </table></body></html>"#;

    #[test]
    fn test_extract_rows_min_columns() {
        let rows = extract_rows(YEARLY, 3).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Januari 2026", "312,4", "587,31"]);
        // Fragments are trimmed individually and concatenated
        assert_eq!(rows[1][0], "Mars2026");

        assert_eq!(extract_rows(YEARLY, 2).unwrap().len(), 3);
    }

    #[test]
    fn test_extract_rows_without_body() {
        for html in ["<p>Inloggning krävs</p>", "<table></table>", ""] {
            let err = extract_rows(html, 2).unwrap_err();
            assert!(matches!(err, EcoguardError::Protocol { .. }));
        }
    }

    #[test]
    fn test_extract_rows_empty_body() {
        let rows = extract_rows("<table><tbody></tbody></table>", 2).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_extract_rows_ignores_header_cells() {
        let html = "<table><tbody><tr><th>Datum</th><th>kWh</th></tr>\
                    <tr><td>2026-02-01</td><td>7,5</td></tr></tbody></table>";
        let rows = extract_rows(html, 2).unwrap();
        assert_eq!(rows, vec![vec!["2026-02-01".to_string(), "7,5".to_string()]]);
    }

    #[test]
    fn test_extract_input_value() {
        let html = r#"<form><input type="hidden" name="__RequestVerificationToken" value="tok-123"/>
                      <input name="Password" type="password"/></form>"#;
        assert_eq!(
            extract_input_value(html, "__RequestVerificationToken").as_deref(),
            Some("tok-123")
        );
        assert_eq!(extract_input_value(html, "Password"), None);
        assert_eq!(extract_input_value(html, "Missing"), None);
    }

    #[test]
    fn test_extract_price() {
        let json = r#"{"PriceLists":[{"Components":[{"Rate":1.88},{"Rate":0.5}],"Interval":"2026-01-01"}]}"#;
        let price = extract_price(json).unwrap().unwrap();
        assert!((price.rate - 1.88).abs() < 1e-9);
        assert_eq!(price.valid_from.as_deref(), Some("2026-01-01"));
    }

    #[test]
    fn test_extract_price_absent() {
        assert!(extract_price(r#"{"PriceLists":[]}"#).unwrap().is_none());
        assert!(extract_price(r#"{}"#).unwrap().is_none());
        assert!(
            extract_price(r#"{"PriceLists":[{"Components":[],"Interval":"x"}]}"#)
                .unwrap()
                .is_none()
        );
        assert!(
            extract_price(r#"{"PriceLists":[{"Components":[{"Rate":null}]}]}"#)
                .unwrap()
                .is_none()
        );
        assert!(extract_price("not json").is_err());
    }

    #[test]
    fn test_extract_price_structured_interval() {
        let json = r#"{"PriceLists":[{"Components":[{"Rate":2}],"Interval":{"From":"2026-01-01"}}]}"#;
        let price = extract_price(json).unwrap().unwrap();
        assert_eq!(price.valid_from.as_deref(), Some(r#"{"From":"2026-01-01"}"#));
    }
}
