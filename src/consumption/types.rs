use crate::normalize::{YearMonth, resolve_month};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One row of the trailing-year summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// Month label as printed, e.g. "Februari 2026"
    pub label: String,
    pub kwh: Option<f64>,
    pub cost: Option<f64>,
}

impl MonthSummary {
    /// Price per kWh derived from the month totals.
    ///
    /// Only defined when both totals are present and non-zero.
    pub fn rate(&self) -> Option<f64> {
        match (self.kwh, self.cost) {
            (Some(kwh), Some(cost)) if kwh != 0.0 && cost != 0.0 => Some(cost / kwh),
            _ => None,
        }
    }

    /// Calendar month named by the label
    pub fn month(&self) -> Option<YearMonth> {
        resolve_month(&self.label)
    }
}

/// Up to twelve trailing months, most recent layout as served
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    pub months: Vec<MonthSummary>,

    /// Number of rows that parsed into a [`MonthSummary`]. Rows with
    /// unreadable numbers are skipped and not counted.
    pub month_count: usize,
}

/// Energy for one calendar day; `None` means no data yet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub kwh: Option<f64>,
}

/// The in-progress month as shown by the current-month table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentMonth {
    pub entries: Vec<DailyEntry>,

    /// Sum of present values, rounded to three decimals
    pub total_kwh: f64,

    /// Number of day rows that parsed, with or without data. Rows with an
    /// unreadable date or number are skipped and not counted.
    pub day_count: usize,

    /// Last row carrying a value. Trailing days may still be empty, so this
    /// is not necessarily the calendar day of the fetch.
    pub today: Option<(NaiveDate, f64)>,
}

/// Current price from the price list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    /// Price per kWh
    pub rate: f64,

    /// Validity of the price list, as text
    pub valid_from: Option<String>,
}

/// Energy attributed to one instant of the reconciled series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub at: DateTime<Tz>,
    pub kwh: f64,
}

/// A reading priced with the rate of its month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostReading {
    pub at: DateTime<Tz>,
    pub kwh: f64,
    pub rate: f64,
}

impl CostReading {
    pub fn cost(&self) -> f64 {
        self.kwh * self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(kwh: Option<f64>, cost: Option<f64>) -> MonthSummary {
        MonthSummary {
            label: "Februari 2025".to_string(),
            kwh,
            cost,
        }
    }

    #[test]
    fn test_month_summary_rate() {
        let rate = summary(Some(200.0), Some(180.0)).rate().unwrap();
        assert!((rate - 0.9).abs() < 1e-9);

        assert_eq!(summary(None, Some(180.0)).rate(), None);
        assert_eq!(summary(Some(200.0), None).rate(), None);
        assert_eq!(summary(Some(0.0), Some(180.0)).rate(), None);
        assert_eq!(summary(Some(200.0), Some(0.0)).rate(), None);
    }

    #[test]
    fn test_month_summary_month() {
        assert_eq!(summary(None, None).month(), YearMonth::new(2025, 2));
    }
}
