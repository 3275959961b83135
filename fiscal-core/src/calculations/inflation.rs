//! Inflation discounting and historical inflation averages.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{growth_factor, safe_div, sum};

/// Discounts and compounds amounts at a constant annual inflation rate.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::InflationAdjuster;
///
/// let adjuster = InflationAdjuster::new(dec!(0.02));
///
/// assert_eq!(adjuster.present_value(dec!(1000), 0), dec!(1000));
/// assert_eq!(adjuster.future_value(dec!(1000), 2), dec!(1040.4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationAdjuster {
    rate: Decimal,
}

impl InflationAdjuster {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// `(1 + rate)^years`
    pub fn discount_factor(
        &self,
        years: u32,
    ) -> Decimal {
        growth_factor(self.rate, years)
    }

    /// Value today of `nominal` received in `years`. A rate of -100 % yields
    /// zero rather than dividing by zero.
    pub fn present_value(
        &self,
        nominal: Decimal,
        years: u32,
    ) -> Decimal {
        if years == 0 {
            return nominal;
        }
        safe_div(nominal, self.discount_factor(years))
    }

    pub fn future_value(
        &self,
        amount: Decimal,
        years: u32,
    ) -> Decimal {
        amount.saturating_mul(self.discount_factor(years))
    }

    /// Spreads `total` evenly over `years` and discounts each yearly tranche
    /// to its own year (tranche `k` is paid at the end of year `k`).
    pub fn progressive_present_value(
        &self,
        total: Decimal,
        years: u32,
    ) -> Decimal {
        if years == 0 {
            return total;
        }
        let tranche = total / Decimal::from(years);
        sum((1..=years).map(|year| self.present_value(tranche, year)))
    }
}

/// `nominal / (1 + rate)^years`
pub fn present_value(
    nominal: Decimal,
    years: u32,
    rate: Decimal,
) -> Decimal {
    InflationAdjuster::new(rate).present_value(nominal, years)
}

// ============================================================================
// Historical series
// ============================================================================

/// Averaging windows reported for a region, in years.
pub const STANDARD_WINDOWS: [u32; 6] = [5, 10, 20, 25, 30, 50];

/// Annual consumer-price inflation for one year, in percent as published.
/// Missing years carry `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationObservation {
    pub year: i32,
    pub rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingAverage {
    pub window: u32,
    pub first_year: i32,
    pub last_year: i32,
    /// `None` when the window holds no observation.
    pub average: Option<Decimal>,
    pub observations: usize,
}

/// Averages the observations falling in `[last_year - window + 1, last_year]`,
/// skipping missing values.
pub fn trailing_average(
    observations: &[InflationObservation],
    window: u32,
    last_year: i32,
) -> TrailingAverage {
    let span = i32::try_from(window).unwrap_or(i32::MAX);
    let first_year = last_year.saturating_sub(span).saturating_add(1);

    let values: Vec<Decimal> = observations
        .iter()
        .filter(|obs| obs.year >= first_year && obs.year <= last_year)
        .filter_map(|obs| obs.rate)
        .collect();

    let average = if values.is_empty() {
        None
    } else {
        Some(sum(values.iter().copied()) / Decimal::from(values.len()))
    };

    TrailingAverage {
        window,
        first_year,
        last_year,
        average,
        observations: values.len(),
    }
}

/// Trailing averages over [`STANDARD_WINDOWS`], ending at the latest year
/// with an observation. Empty when the series has no value at all.
pub fn trailing_averages(observations: &[InflationObservation]) -> Vec<TrailingAverage> {
    let Some(last_year) = observations
        .iter()
        .filter(|obs| obs.rate.is_some())
        .map(|obs| obs.year)
        .max()
    else {
        return Vec::new();
    };

    STANDARD_WINDOWS
        .iter()
        .map(|window| trailing_average(observations, *window, last_year))
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InflationHistoryError {
    #[error("No inflation history for region: {0}")]
    UnknownRegion(String),

    #[error("Inflation history source error: {0}")]
    Source(String),
}

/// Read-only source of inflation series keyed by region code.
#[async_trait]
pub trait InflationHistoryProvider: Send + Sync {
    /// Observations for `region`, in ascending year order.
    async fn fetch(
        &self,
        region: &str,
    ) -> Result<Vec<InflationObservation>, InflationHistoryError>;
}
