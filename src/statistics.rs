//! Long-term statistics
//!
//! The reconciled series are turned into cumulative records and handed to a
//! [`StatisticsSink`]. Sums restart from zero on every conversion, so the
//! input must always be the complete series.

use crate::consumption::{CostReading, Reading};
use crate::error::Result;
use crate::logging::get_logger;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source tag of every statistic this crate produces
pub const STATISTICS_SOURCE: &str = "ecoguard";

/// Identifier of the energy statistic
pub const ENERGY_STATISTIC_ID: &str = "ecoguard:energy_consumption";

/// Identifier of the cost statistic
pub const COST_STATISTIC_ID: &str = "ecoguard:energy_cost";

/// One point of a cumulative statistic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticRecord {
    pub start: DateTime<FixedOffset>,
    /// Value of this period
    pub state: f64,
    /// Running total up to and including this period
    pub sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeanType {
    None,
    Arithmetic,
    Circular,
}

/// Description of a statistic series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticMetadata {
    pub statistic_id: String,
    pub name: String,
    pub source: String,
    pub unit_of_measurement: String,
    pub unit_class: Option<String>,
    pub has_sum: bool,
    pub mean_type: MeanType,
}

pub fn energy_metadata() -> StatisticMetadata {
    StatisticMetadata {
        statistic_id: ENERGY_STATISTIC_ID.to_string(),
        name: "Ecoguard Energy Consumption".to_string(),
        source: STATISTICS_SOURCE.to_string(),
        unit_of_measurement: "kWh".to_string(),
        unit_class: Some("energy".to_string()),
        has_sum: true,
        mean_type: MeanType::None,
    }
}

pub fn cost_metadata(currency: &str) -> StatisticMetadata {
    StatisticMetadata {
        statistic_id: COST_STATISTIC_ID.to_string(),
        name: "Ecoguard Energy Cost".to_string(),
        source: STATISTICS_SOURCE.to_string(),
        unit_of_measurement: currency.to_string(),
        unit_class: None,
        has_sum: true,
        mean_type: MeanType::None,
    }
}

fn accumulate<I>(points: I) -> Vec<StatisticRecord>
where
    I: IntoIterator<Item = (DateTime<FixedOffset>, f64)>,
{
    let mut sum = 0.0;
    points
        .into_iter()
        .map(|(start, state)| {
            sum += state;
            StatisticRecord { start, state, sum }
        })
        .collect()
}

/// Energy per reading with a running sum
pub fn to_energy_statistics(series: &[Reading]) -> Vec<StatisticRecord> {
    accumulate(series.iter().map(|r| (r.at.fixed_offset(), r.kwh)))
}

/// Cost per reading (kWh × rate) with a running sum
pub fn to_cost_statistics(series: &[CostReading]) -> Vec<StatisticRecord> {
    accumulate(series.iter().map(|r| (r.at.fixed_offset(), r.cost())))
}

/// Destination for cumulative statistic series
#[async_trait::async_trait]
pub trait StatisticsSink: Send + Sync {
    /// Store a series, replacing records with the same start
    async fn add_statistics(
        &self,
        metadata: &StatisticMetadata,
        records: &[StatisticRecord],
    ) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatisticsDocument {
    pub metadata: StatisticMetadata,
    pub statistics: Vec<StatisticRecord>,
}

/// Writes each statistic to `<dir>/<id>.json`, `:` replaced by `_`
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, statistic_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", statistic_id.replace(':', "_")))
    }
}

#[async_trait::async_trait]
impl StatisticsSink for JsonFileSink {
    async fn add_statistics(
        &self,
        metadata: &StatisticMetadata,
        records: &[StatisticRecord],
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let document = StatisticsDocument {
            metadata: metadata.clone(),
            statistics: records.to_vec(),
        };
        let contents = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(self.path_for(&metadata.statistic_id), contents).await?;
        Ok(())
    }
}

/// Number of records handed to the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub energy: usize,
    pub cost: usize,
}

/// Hand both series to the sink.
///
/// Nothing is imported while the energy series is empty. Sink failures are
/// logged and reflected as zero counts in the report.
pub async fn import_statistics<S: StatisticsSink + ?Sized>(
    sink: &S,
    energy: &[Reading],
    costs: &[CostReading],
    currency: &str,
) -> ImportReport {
    let logger = get_logger("statistics");
    let mut report = ImportReport::default();
    if energy.is_empty() {
        return report;
    }

    let energy_stats = to_energy_statistics(energy);
    match sink.add_statistics(&energy_metadata(), &energy_stats).await {
        Ok(()) => report.energy = energy_stats.len(),
        Err(e) => {
            logger.error(&format!("Failed to import energy statistics: {}", e));
            return report;
        }
    }

    if !costs.is_empty() {
        let cost_stats = to_cost_statistics(costs);
        match sink.add_statistics(&cost_metadata(currency), &cost_stats).await {
            Ok(()) => report.cost = cost_stats.len(),
            Err(e) => logger.error(&format!("Failed to import cost statistics: {}", e)),
        }
    }

    logger.debug(&format!(
        "Imported {} energy and {} cost statistics",
        report.energy, report.cost
    ));
    report
}
