#![allow(dead_code)]

use chrono::TimeZone;
use chrono_tz::Europe::Stockholm;
use chrono_tz::Tz;
use ecoguard::error::{EcoguardError, Result};
use ecoguard::normalize::YearMonth;
use ecoguard::portal::{Portal, PortalConnector};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Page bodies served by the fake portal; `None` fails with a transport error
#[derive(Debug, Clone, Default)]
pub struct Pages {
    pub yearly: Option<String>,
    pub current: Option<String>,
    pub prices: Option<String>,
    pub hourly: Option<String>,
    pub months: HashMap<i64, String>,
}

impl Pages {
    pub fn with_month(mut self, year: i32, month: u32, html: String) -> Self {
        self.months.insert(month_epoch(year, month), html);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub connects: Arc<AtomicUsize>,
    pub month_fetches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl Counters {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn month_fetches(&self) -> usize {
        self.month_fetches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakePortal {
    pub pages: Arc<Pages>,
    pub counters: Counters,
}

impl FakePortal {
    pub fn new(pages: Pages) -> Self {
        Self {
            pages: Arc::new(pages),
            counters: Counters::default(),
        }
    }
}

fn serve(page: &Option<String>, name: &str) -> Result<String> {
    page.clone()
        .ok_or_else(|| EcoguardError::transport(format!("{} unavailable", name)))
}

#[async_trait::async_trait]
impl Portal for FakePortal {
    async fn yearly_table(&self) -> Result<String> {
        serve(&self.pages.yearly, "yearly")
    }

    async fn current_month_table(&self) -> Result<String> {
        serve(&self.pages.current, "current month")
    }

    async fn price_lists(&self) -> Result<String> {
        serve(&self.pages.prices, "price lists")
    }

    async fn month_table(&self, month_start_epoch: i64) -> Result<String> {
        self.counters.month_fetches.fetch_add(1, Ordering::SeqCst);
        serve(&self.pages.months.get(&month_start_epoch).cloned(), "month")
    }

    async fn latest_day_table(&self) -> Result<String> {
        serve(&self.pages.hourly, "hourly")
    }

    async fn close(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeConnector {
    pub pages: Arc<Pages>,
    pub counters: Counters,
    pub reject: bool,
}

impl FakeConnector {
    pub fn new(pages: Pages) -> Self {
        Self {
            pages: Arc::new(pages),
            counters: Counters::default(),
            reject: false,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::new(Pages::default())
        }
    }
}

#[async_trait::async_trait]
impl PortalConnector for FakeConnector {
    type Portal = FakePortal;

    async fn connect(&self) -> Result<FakePortal> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(EcoguardError::authentication("Login failed - check credentials"));
        }
        Ok(FakePortal {
            pages: self.pages.clone(),
            counters: self.counters.clone(),
        })
    }
}

pub fn month_epoch(year: i32, month: u32) -> i64 {
    YearMonth::new(year, month)
        .and_then(|m| m.start_in(&Stockholm))
        .map(|t| t.timestamp())
        .unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::DateTime<Tz> {
    Stockholm.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// `<table><tbody>` with one `<tr>` per row
pub fn table(rows: &[&[&str]]) -> String {
    let body: String = rows
        .iter()
        .map(|cells| {
            let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
            format!("<tr>{}</tr>", tds)
        })
        .collect();
    format!("<table><tbody>{}</tbody></table>", body)
}

pub fn price_json(rate: f64, interval: &str) -> String {
    format!(
        r#"{{"PriceLists":[{{"Components":[{{"Rate":{}}}],"Interval":"{}"}}]}}"#,
        rate, interval
    )
}
