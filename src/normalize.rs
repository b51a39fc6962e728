//! Text and number normalization for portal content
//!
//! The portal renders Swedish locale text: comma decimal separators,
//! no-break spaces as thousands separators, a dash for missing values and
//! month labels such as "Februari 2026".

use crate::error::{EcoguardError, Result};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Month names as printed by the portal, in calendar order
pub const SWEDISH_MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "mars",
    "april",
    "maj",
    "juni",
    "juli",
    "augusti",
    "september",
    "oktober",
    "november",
    "december",
];

/// Sentinel the portal prints for "no data yet"
const MISSING: &str = "-";

/// Parse a locale-formatted number.
///
/// Returns `Ok(None)` for empty text and for the dash sentinel. Any other
/// text that does not parse to a finite number is a `DataFormat` error.
pub fn parse_number(text: &str) -> Result<Option<f64>> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '\u{a0}' && *c != '\u{202f}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == MISSING {
        return Ok(None);
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(EcoguardError::data_format(format!(
            "Not a number: {:?}",
            text
        ))),
    }
}

/// Remove combining marks after compatibility decomposition ("Solängen" -> "Solangen")
pub fn strip_diacritics(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// URL prefix shared by every data endpoint of one account
pub fn domain_path(database: &str, username: &str) -> String {
    format!(
        "/domains/{}/objects/{}",
        strip_diacritics(database),
        username
    )
}

/// Parse an ISO `YYYY-MM-DD` date label from a daily table
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")?)
}

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Build a month, rejecting month numbers outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Month containing a date or timestamp
    pub fn of<T: Datelike>(value: &T) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
        }
    }

    /// Local midnight on the first day of the month
    pub fn start_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        tz.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .earliest()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = EcoguardError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EcoguardError::data_format(format!("Invalid month key: {:?}", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = EcoguardError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Resolve a "Månadsnamn YYYY" label to a calendar month.
///
/// Requires exactly two whitespace-separated tokens: a month name from
/// [`SWEDISH_MONTHS`] (any letter case) and a four-digit year.
pub fn resolve_month(label: &str) -> Option<YearMonth> {
    let mut tokens = label.split_whitespace();
    let (name, year) = (tokens.next()?, tokens.next()?);
    if tokens.next().is_some() {
        return None;
    }

    let name = name.to_lowercase();
    let month = SWEDISH_MONTHS.iter().position(|m| *m == name)? as u32 + 1;

    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year = year.parse::<i32>().ok()?;

    YearMonth::new(year, month)
}
