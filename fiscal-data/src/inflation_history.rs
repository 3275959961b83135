//! Inflation series read from local files.
//!
//! Two layouts are understood:
//!
//! | Layout | Shape |
//! |--------|-------|
//! | CSV | `region,year,rate` with an empty `rate` for a missing year |
//! | World Bank export | the JSON array saved from the `FP.CPI.TOTL.ZG` indicator API |
//!
//! Rates are annual percentages as published.

use std::collections::BTreeMap;
use std::io::Read;

use async_trait::async_trait;
use fiscal_core::calculations::{
    InflationHistoryError, InflationHistoryProvider, InflationObservation,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::IgnoredAny;

#[derive(Debug, Deserialize)]
struct CsvRow {
    region: String,
    year: i32,
    rate: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct WorldBankRow {
    countryiso3code: String,
    date: String,
    value: Option<Decimal>,
}

/// Series keyed by upper-case region code, each sorted by year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInflationHistory {
    series: BTreeMap<String, Vec<InflationObservation>>,
}

impl FileInflationHistory {
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, InflationHistoryError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut history = Self::default();

        for result in csv_reader.deserialize() {
            let row: CsvRow = result.map_err(|e| InflationHistoryError::Source(e.to_string()))?;
            history.push(&row.region, InflationObservation {
                year: row.year,
                rate: row.rate,
            });
        }

        history.sort();
        Ok(history)
    }

    /// Reads a saved World Bank indicator response: a metadata object
    /// followed by the array of yearly rows.
    pub fn from_world_bank_json<R: Read>(reader: R) -> Result<Self, InflationHistoryError> {
        let (_meta, rows): (IgnoredAny, Vec<WorldBankRow>) = serde_json::from_reader(reader)
            .map_err(|e| InflationHistoryError::Source(e.to_string()))?;
        let mut history = Self::default();

        for row in rows {
            let year = row.date.trim().parse::<i32>().map_err(|_| {
                InflationHistoryError::Source(format!("invalid year '{}'", row.date))
            })?;
            history.push(&row.countryiso3code, InflationObservation {
                year,
                rate: row.value,
            });
        }

        history.sort();
        Ok(history)
    }

    pub fn regions(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }

    fn push(
        &mut self,
        region: &str,
        observation: InflationObservation,
    ) {
        self.series
            .entry(region.trim().to_ascii_uppercase())
            .or_default()
            .push(observation);
    }

    fn sort(&mut self) {
        for observations in self.series.values_mut() {
            observations.sort_by_key(|obs| obs.year);
        }
    }
}

#[async_trait]
impl InflationHistoryProvider for FileInflationHistory {
    async fn fetch(
        &self,
        region: &str,
    ) -> Result<Vec<InflationObservation>, InflationHistoryError> {
        self.series
            .get(&region.trim().to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| InflationHistoryError::UnknownRegion(region.to_string()))
    }
}
