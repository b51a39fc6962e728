use super::types::{CurrentMonth, DailyEntry, MonthSummary, YearlySummary};
use crate::error::Result;
use crate::logging::get_logger;
use crate::normalize::{parse_date, parse_number};
use crate::table::extract_rows;

/// Trailing-year summary: month label, kWh, cost
pub fn parse_yearly_table(html: &str) -> Result<YearlySummary> {
    let logger = get_logger("consumption");
    let mut months = Vec::new();

    for cells in extract_rows(html, 3)? {
        let (kwh, cost) = match (parse_number(&cells[1]), parse_number(&cells[2])) {
            (Ok(kwh), Ok(cost)) => (kwh, cost),
            (Err(e), _) | (_, Err(e)) => {
                logger.warn(&format!("Skipping yearly row {:?}: {}", cells[0], e));
                continue;
            }
        };
        months.push(MonthSummary {
            label: cells[0].clone(),
            kwh,
            cost,
        });
    }

    let month_count = months.len();
    Ok(YearlySummary {
        months,
        month_count,
    })
}

/// Day rows (date, kWh-or-dash) shared by the current-month and per-month tables
fn parse_daily_rows(html: &str, table: &str) -> Result<Vec<DailyEntry>> {
    let logger = get_logger("consumption");
    let mut entries = Vec::new();

    for cells in extract_rows(html, 2)? {
        let date = match parse_date(&cells[0]) {
            Ok(date) => date,
            Err(e) => {
                logger.warn(&format!("Skipping {} row {:?}: {}", table, cells[0], e));
                continue;
            }
        };
        match parse_number(&cells[1]) {
            Ok(kwh) => entries.push(DailyEntry { date, kwh }),
            Err(e) => logger.warn(&format!("Skipping {} row {}: {}", table, date, e)),
        }
    }

    Ok(entries)
}

/// Current month, one row per day so far
pub fn parse_current_month_table(html: &str) -> Result<CurrentMonth> {
    let entries = parse_daily_rows(html, "current month")?;

    // A plain `sum` of nothing is -0.0
    let total = entries
        .iter()
        .filter_map(|e| e.kwh)
        .fold(0.0, |acc, kwh| acc + kwh);
    let today = entries
        .iter()
        .rev()
        .find_map(|e| e.kwh.map(|kwh| (e.date, kwh)));

    Ok(CurrentMonth {
        day_count: entries.len(),
        total_kwh: (total * 1000.0).round() / 1000.0,
        today,
        entries,
    })
}

/// Full daily breakdown of a past month
pub fn parse_month_table(html: &str) -> Result<Vec<DailyEntry>> {
    parse_daily_rows(html, "month")
}
