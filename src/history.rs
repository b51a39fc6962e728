//! Historical reconciliation
//!
//! Builds one ordered series of energy readings out of three sources:
//!
//! - daily readings of closed months, fetched once and cached,
//! - the completed days of the current month,
//! - the rolling 24-hour window, which stands in for the day in progress.
//!
//! Each reading is priced with the rate derived from its month's summary
//! totals, or the current price-list rate when no such derivation exists.

use crate::consumption::{
    CostReading, CurrentMonth, Reading, YearlySummary, local_midnight, parse_month_table,
};
use crate::logging::{StructuredLogger, get_logger};
use crate::normalize::YearMonth;
use crate::portal::Portal;
use chrono::{DateTime, Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Months whose daily breakdown has been fetched. Only grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthCache(BTreeSet<YearMonth>);

impl MonthCache {
    pub fn contains(&self, month: &YearMonth) -> bool {
        self.0.contains(month)
    }

    pub fn insert(&mut self, month: YearMonth) -> bool {
        self.0.insert(month)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &YearMonth> {
        self.0.iter()
    }
}

/// Rate per month, derived from summary totals. Entries are overwritten but
/// never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateCache(BTreeMap<YearMonth, f64>);

impl RateCache {
    pub fn record(&mut self, month: YearMonth, rate: f64) {
        self.0.insert(month, rate);
    }

    pub fn get(&self, month: &YearMonth) -> Option<f64> {
        self.0.get(month).copied()
    }

    /// Rate of the month containing `at`, else `fallback`
    pub fn rate_for<T: Datelike>(&self, at: &T, fallback: f64) -> f64 {
        self.get(&YearMonth::of(at)).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One day of a closed month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedDay {
    pub date: NaiveDate,
    pub kwh: f64,
}

/// Everything reconciliation keeps between cycles and across restarts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryState {
    pub months: MonthCache,
    pub rates: RateCache,
    pub days: Vec<CachedDay>,
}

/// Inputs of one reconciliation pass, as far as the cycle obtained them
#[derive(Debug, Clone, Default)]
pub struct CycleData {
    pub yearly: Option<YearlySummary>,
    pub current: Option<CurrentMonth>,
    pub current_rate: Option<f64>,
    pub hourly: Vec<Reading>,
}

/// Per-account reconciliation state
pub struct HistoryEngine {
    tz: Tz,
    state: HistoryState,
    entries: Vec<Reading>,
    cost_entries: Vec<CostReading>,
    logger: StructuredLogger,
}

impl HistoryEngine {
    pub fn new(tz: Tz) -> Self {
        Self::with_state(tz, HistoryState::default())
    }

    pub fn with_state(tz: Tz, state: HistoryState) -> Self {
        Self {
            tz,
            state,
            entries: Vec::new(),
            cost_entries: Vec::new(),
            logger: get_logger("history"),
        }
    }

    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    /// Replace the cached state, e.g. after loading it from disk
    pub fn restore(&mut self, state: HistoryState) {
        self.logger.info(&format!(
            "Restored {} cached months, {} rates, {} days",
            state.months.len(),
            state.rates.len(),
            state.days.len()
        ));
        self.state = state;
    }

    pub fn month_cache(&self) -> &MonthCache {
        &self.state.months
    }

    pub fn rate_cache(&self) -> &RateCache {
        &self.state.rates
    }

    /// Latest reconciled energy series
    pub fn historical_entries(&self) -> &[Reading] {
        &self.entries
    }

    /// Latest reconciled series with rates
    pub fn historical_cost_entries(&self) -> &[CostReading] {
        &self.cost_entries
    }

    /// Derive rates from every summary row with usable totals.
    /// Later rows win for the same month.
    pub fn record_rates(&mut self, yearly: &YearlySummary) {
        for summary in &yearly.months {
            if let (Some(month), Some(rate)) = (summary.month(), summary.rate()) {
                self.state.rates.record(month, rate);
            }
        }
    }

    /// Summary months before the month of `now` that are not cached yet
    pub fn pending_months(&self, yearly: &YearlySummary, now: &DateTime<Tz>) -> Vec<YearMonth> {
        let current = YearMonth::of(now);
        let mut pending = Vec::new();
        for month in yearly.months.iter().filter_map(|s| s.month()) {
            if month < current && !self.state.months.contains(&month) && !pending.contains(&month)
            {
                pending.push(month);
            }
        }
        pending
    }

    /// Fetch and cache the daily breakdown of each month.
    ///
    /// A month whose fetch fails, or whose page has no table, stays uncached
    /// and is retried next cycle.
    /// Returns the number of months cached.
    pub async fn backfill<P: Portal + ?Sized>(&mut self, portal: &P, months: &[YearMonth]) -> usize {
        let mut cached = 0;
        for month in months {
            if self.state.months.contains(month) {
                continue;
            }
            let Some(start) = month.start_in(&self.tz) else {
                self.logger
                    .warn(&format!("No local start instant for {}", month));
                continue;
            };

            let html = match portal.month_table(start.timestamp()).await {
                Ok(html) => html,
                Err(e) => {
                    self.logger
                        .warn(&format!("Failed to fetch daily table for {}: {}", month, e));
                    continue;
                }
            };

            let days = match parse_month_table(&html) {
                Ok(days) => days,
                Err(e) => {
                    self.logger
                        .warn(&format!("Unusable daily table for {}: {}", month, e));
                    continue;
                }
            };
            let days: Vec<CachedDay> = days
                .into_iter()
                .filter_map(|d| d.kwh.map(|kwh| CachedDay { date: d.date, kwh }))
                .collect();
            self.logger
                .info(&format!("Cached {} days for {}", days.len(), month));
            self.state.days.extend(days);
            self.state.months.insert(*month);
            cached += 1;
        }
        cached
    }

    /// Rebuild both series from the cache, the completed days of the current
    /// month and the rolling hourly readings.
    ///
    /// The current month's entry for the calendar day of `now` is left out;
    /// that day is covered by the hourly readings. Readings sharing a
    /// timestamp are merged into one by summing.
    pub fn rebuild(
        &mut self,
        current: Option<&CurrentMonth>,
        hourly: &[Reading],
        current_rate: Option<f64>,
        now: &DateTime<Tz>,
    ) {
        let today = now.date_naive();
        let mut series: Vec<Reading> = Vec::new();

        for day in &self.state.days {
            if let Some(at) = local_midnight(&self.tz, day.date) {
                series.push(Reading { at, kwh: day.kwh });
            }
        }

        if let Some(current) = current {
            for entry in &current.entries {
                if entry.date == today {
                    continue;
                }
                if let (Some(kwh), Some(at)) = (entry.kwh, local_midnight(&self.tz, entry.date)) {
                    series.push(Reading { at, kwh });
                }
            }
        }

        series.extend_from_slice(hourly);
        series.sort_by_key(|r| r.at);

        let mut merged: Vec<Reading> = Vec::with_capacity(series.len());
        for reading in series {
            match merged.last_mut() {
                Some(last) if last.at == reading.at => last.kwh += reading.kwh,
                _ => merged.push(reading),
            }
        }

        let fallback = current_rate.unwrap_or(0.0);
        self.cost_entries = merged
            .iter()
            .map(|r| CostReading {
                at: r.at,
                kwh: r.kwh,
                rate: self.state.rates.rate_for(&r.at, fallback),
            })
            .collect();
        self.entries = merged;

        self.logger.debug(&format!(
            "Rebuilt series with {} readings",
            self.entries.len()
        ));
    }

    /// Full reconciliation pass for one cycle
    pub async fn reconcile<P: Portal + ?Sized>(
        &mut self,
        portal: &P,
        data: &CycleData,
        now: &DateTime<Tz>,
    ) {
        if let Some(yearly) = &data.yearly {
            self.record_rates(yearly);
            let pending = self.pending_months(yearly, now);
            if !pending.is_empty() {
                self.backfill(portal, &pending).await;
            }
        }
        self.rebuild(data.current.as_ref(), &data.hourly, data.current_rate, now);
    }
}
