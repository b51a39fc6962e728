//! Scraped consumption records and the parsers for each portal table
//!
//! Every parser takes the raw page body. Rows whose numbers or dates cannot
//! be read are skipped and logged; a page without a table body yields an
//! empty result.

pub mod hourly;
pub mod parse;
pub mod types;

pub use hourly::parse_hourly_rolling;
pub use parse::{parse_current_month_table, parse_month_table, parse_yearly_table};
pub use types::{
    CostReading, CurrentMonth, DailyEntry, MonthSummary, PriceInfo, Reading, YearlySummary,
};

use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;

/// Local wall-clock instant on `date` at `hour:00`.
///
/// A time that falls in a DST gap yields `None`; an ambiguous one resolves
/// to the earlier instant.
pub fn local_instant(tz: &Tz, date: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    tz.from_local_datetime(&naive).earliest()
}

/// Local midnight at the start of `date`
pub fn local_midnight(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    local_instant(tz, date, 0)
}
