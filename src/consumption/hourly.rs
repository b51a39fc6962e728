//! Reconstruction of the rolling 24-hour table
//!
//! The latest-day table lists the trailing hours with labels such as
//! "10:00 - 11:00" and no date. The window ends at the fetch instant and wraps
//! midnight once: every hour at or after the current hour-of-day belongs to
//! yesterday, the rest to today.

use super::local_instant;
use super::types::Reading;
use crate::error::Result;
use crate::logging::get_logger;
use crate::normalize::parse_number;
use crate::table::extract_rows;
use chrono::{DateTime, Days, Timelike};
use chrono_tz::Tz;

/// Leading hour of a "HH:MM - HH:MM" label
fn leading_hour(label: &str) -> Option<u32> {
    let hour = label.split(':').next()?.trim().parse::<u32>().ok()?;
    (hour < 24).then_some(hour)
}

/// Hourly readings of the rolling window relative to `now`.
///
/// Rows without a value are dropped. Output follows table order. A page
/// without a table body is a protocol error.
pub fn parse_hourly_rolling(html: &str, now: &DateTime<Tz>) -> Result<Vec<Reading>> {
    let logger = get_logger("consumption");
    let rows = extract_rows(html, 2)?;
    let tz = now.timezone();
    let today = now.date_naive();
    let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
        return Ok(Vec::new());
    };

    let mut readings = Vec::new();
    for cells in rows {
        let kwh = match parse_number(&cells[1]) {
            Ok(Some(kwh)) => kwh,
            Ok(None) => continue,
            Err(e) => {
                logger.warn(&format!("Skipping hourly row {:?}: {}", cells[0], e));
                continue;
            }
        };
        let Some(hour) = leading_hour(&cells[0]) else {
            logger.warn(&format!("Skipping hourly row with label {:?}", cells[0]));
            continue;
        };

        let date = if hour >= now.hour() { yesterday } else { today };
        match local_instant(&tz, date, hour) {
            Some(at) => readings.push(Reading { at, kwh }),
            None => logger.debug(&format!("Skipping non-existent local hour {} {}:00", date, hour)),
        }
    }

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_hour() {
        assert_eq!(leading_hour("10:00 - 11:00"), Some(10));
        assert_eq!(leading_hour("00:00 - 01:00"), Some(0));
        assert_eq!(leading_hour(" 7:00"), Some(7));
        assert_eq!(leading_hour("24:00 - 01:00"), None);
        assert_eq!(leading_hour("Totalt"), None);
    }
}
