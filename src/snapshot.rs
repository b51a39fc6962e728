//! Last-known values of one refresh cycle and their sensor projection

use crate::consumption::{CurrentMonth, MonthSummary, PriceInfo, YearlySummary};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of month slots exposed as sensors
pub const MONTH_SLOTS: u8 = 12;

/// Flattened result of one refresh cycle. Fields whose sub-fetch failed are
/// left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub refreshed_at: Option<DateTime<FixedOffset>>,
    pub months: Vec<MonthSummary>,
    pub yearly_month_count: Option<usize>,
    pub current_month_total_kwh: Option<f64>,
    pub current_month_day_count: Option<usize>,
    pub today_kwh: Option<f64>,
    pub today_date: Option<NaiveDate>,
    pub price_per_kwh: Option<f64>,
    pub price_valid_from: Option<String>,
}

impl Snapshot {
    pub fn apply_yearly(&mut self, yearly: &YearlySummary) {
        self.months = yearly.months.clone();
        self.yearly_month_count = Some(yearly.month_count);
    }

    pub fn apply_current_month(&mut self, current: &CurrentMonth) {
        self.current_month_total_kwh = Some(current.total_kwh);
        self.current_month_day_count = Some(current.day_count);
        self.today_date = current.today.map(|(date, _)| date);
        self.today_kwh = current.today.map(|(_, kwh)| kwh);
    }

    pub fn apply_price(&mut self, price: &PriceInfo) {
        self.price_per_kwh = Some(price.rate);
        self.price_valid_from = price.valid_from.clone();
    }

    /// Month slot `index` (1-based)
    pub fn month(&self, index: u8) -> Option<&MonthSummary> {
        self.months.get(usize::from(index).checked_sub(1)?)
    }

    /// Every sensor with its current value
    pub fn sensor_values(&self) -> Vec<(String, Option<SensorValue>)> {
        SensorKey::all()
            .into_iter()
            .map(|key| (key.key(), key.value(self)))
            .collect()
    }
}

/// Value of a sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Number(f64),
    Count(u64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Energy,
    Monetary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

/// Catalogue of exposed sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKey {
    MonthName(u8),
    MonthKwh(u8),
    MonthCost(u8),
    CurrentMonthTotalKwh,
    CurrentMonthDayCount,
    TodayKwh,
    PricePerKwh,
    PriceValidFrom,
}

impl SensorKey {
    /// All sensors in display order
    pub fn all() -> Vec<SensorKey> {
        let mut keys = Vec::with_capacity(usize::from(MONTH_SLOTS) * 3 + 5);
        for i in 1..=MONTH_SLOTS {
            keys.extend([
                SensorKey::MonthName(i),
                SensorKey::MonthKwh(i),
                SensorKey::MonthCost(i),
            ]);
        }
        keys.extend([
            SensorKey::CurrentMonthTotalKwh,
            SensorKey::CurrentMonthDayCount,
            SensorKey::TodayKwh,
            SensorKey::PricePerKwh,
            SensorKey::PriceValidFrom,
        ]);
        keys
    }

    pub fn key(&self) -> String {
        match self {
            SensorKey::MonthName(i) => format!("month_{}_name", i),
            SensorKey::MonthKwh(i) => format!("month_{}_kwh", i),
            SensorKey::MonthCost(i) => format!("month_{}_cost", i),
            SensorKey::CurrentMonthTotalKwh => "current_month_total_kwh".to_string(),
            SensorKey::CurrentMonthDayCount => "current_month_day_count".to_string(),
            SensorKey::TodayKwh => "today_kwh".to_string(),
            SensorKey::PricePerKwh => "price_per_kwh".to_string(),
            SensorKey::PriceValidFrom => "price_valid_from".to_string(),
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SensorKey::MonthKwh(_) | SensorKey::CurrentMonthTotalKwh | SensorKey::TodayKwh => {
                Some("kWh")
            }
            SensorKey::MonthCost(_) => Some("SEK"),
            SensorKey::CurrentMonthDayCount => Some("days"),
            SensorKey::PricePerKwh => Some("SEK/kWh"),
            SensorKey::MonthName(_) | SensorKey::PriceValidFrom => None,
        }
    }

    pub fn device_class(&self) -> Option<DeviceClass> {
        match self {
            SensorKey::MonthKwh(_) | SensorKey::CurrentMonthTotalKwh | SensorKey::TodayKwh => {
                Some(DeviceClass::Energy)
            }
            SensorKey::MonthCost(_) => Some(DeviceClass::Monetary),
            _ => None,
        }
    }

    pub fn state_class(&self) -> Option<StateClass> {
        match self {
            SensorKey::CurrentMonthTotalKwh => Some(StateClass::TotalIncreasing),
            SensorKey::TodayKwh | SensorKey::PricePerKwh => Some(StateClass::Measurement),
            _ => None,
        }
    }

    /// Suggested number of decimals
    pub fn precision(&self) -> Option<u8> {
        match self {
            SensorKey::MonthKwh(_) | SensorKey::CurrentMonthTotalKwh | SensorKey::TodayKwh => {
                Some(1)
            }
            SensorKey::MonthCost(_) | SensorKey::PricePerKwh => Some(2),
            _ => None,
        }
    }

    /// Current value, a pure projection of the snapshot
    pub fn value(&self, snapshot: &Snapshot) -> Option<SensorValue> {
        match self {
            SensorKey::MonthName(i) => snapshot
                .month(*i)
                .map(|m| SensorValue::Text(m.label.clone())),
            SensorKey::MonthKwh(i) => snapshot.month(*i)?.kwh.map(SensorValue::Number),
            SensorKey::MonthCost(i) => snapshot.month(*i)?.cost.map(SensorValue::Number),
            SensorKey::CurrentMonthTotalKwh => {
                snapshot.current_month_total_kwh.map(SensorValue::Number)
            }
            SensorKey::CurrentMonthDayCount => snapshot
                .current_month_day_count
                .map(|n| SensorValue::Count(n as u64)),
            SensorKey::TodayKwh => snapshot.today_kwh.map(SensorValue::Number),
            SensorKey::PricePerKwh => snapshot.price_per_kwh.map(SensorValue::Number),
            SensorKey::PriceValidFrom => snapshot.price_valid_from.clone().map(SensorValue::Text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.apply_yearly(&YearlySummary {
            months: vec![MonthSummary {
                label: "Januari 2026".to_string(),
                kwh: Some(312.4),
                cost: None,
            }],
            month_count: 1,
        });
        snapshot.apply_price(&PriceInfo {
            rate: 1.88,
            valid_from: Some("2026-01-01".to_string()),
        });
        snapshot
    }

    #[test]
    fn test_catalogue() {
        let keys = SensorKey::all();
        assert_eq!(keys.len(), 41);
        assert_eq!(keys[0].key(), "month_1_name");
        assert_eq!(keys[35].key(), "month_12_cost");
        assert_eq!(SensorKey::PricePerKwh.unit(), Some("SEK/kWh"));
        assert_eq!(
            SensorKey::CurrentMonthTotalKwh.state_class(),
            Some(StateClass::TotalIncreasing)
        );
        assert_eq!(SensorKey::MonthCost(3).device_class(), Some(DeviceClass::Monetary));
        assert_eq!(SensorKey::MonthKwh(3).precision(), Some(1));
    }

    #[test]
    fn test_values_project_snapshot() {
        let snapshot = snapshot();
        assert_eq!(
            SensorKey::MonthName(1).value(&snapshot),
            Some(SensorValue::Text("Januari 2026".to_string()))
        );
        assert_eq!(
            SensorKey::MonthKwh(1).value(&snapshot),
            Some(SensorValue::Number(312.4))
        );
        assert_eq!(SensorKey::MonthCost(1).value(&snapshot), None);
        assert_eq!(SensorKey::MonthName(2).value(&snapshot), None);
        assert_eq!(SensorKey::MonthName(0).value(&snapshot), None);
        assert_eq!(SensorKey::TodayKwh.value(&snapshot), None);

        let values = snapshot.sensor_values();
        assert_eq!(values.len(), 41);
        assert!(values.iter().any(|(k, v)| k == "price_per_kwh"
            && *v == Some(SensorValue::Number(1.88))));
    }
}
