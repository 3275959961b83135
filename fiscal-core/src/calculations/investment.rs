//! Regular contributions to a compounding investment.
//!
//! Contributions are made at the start of each year for
//! `contribution_years`, growing by `contribution_growth_rate`. Each one
//! compounds at `return_rate` until the end of the simulation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::growth_factor;
use crate::calculations::inflation::InflationAdjuster;
use crate::models::{FromSettings, Settings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionPlan {
    pub annual_contribution: Decimal,
    pub contribution_growth_rate: Decimal,
    pub return_rate: Decimal,
    pub inflation_rate: Decimal,
    pub contribution_years: u32,
    pub simulation_years: u32,
}

impl Default for ContributionPlan {
    fn default() -> Self {
        Self {
            annual_contribution: Decimal::from(20_000),
            contribution_growth_rate: Decimal::new(3, 2),
            return_rate: Decimal::new(5, 2),
            inflation_rate: Decimal::new(25, 3),
            contribution_years: 10,
            simulation_years: 20,
        }
    }
}

impl FromSettings for ContributionPlan {
    fn from_settings(settings: &Settings) -> Self {
        let d = ContributionPlan::default();
        Self {
            annual_contribution: settings
                .amount("invest.annual_contribution", d.annual_contribution),
            contribution_growth_rate: settings
                .signed_rate("invest.contribution_growth_rate", d.contribution_growth_rate),
            return_rate: settings.signed_rate("invest.return_rate", d.return_rate),
            inflation_rate: settings.signed_rate("invest.inflation_rate", d.inflation_rate),
            contribution_years: settings.years("invest.contribution_years", d.contribution_years),
            simulation_years: settings.years("invest.simulation_years", d.simulation_years),
        }
    }

    fn write_settings(
        &self,
        settings: &mut Settings,
    ) {
        settings.set("invest.annual_contribution", self.annual_contribution);
        settings.set("invest.contribution_growth_rate", self.contribution_growth_rate);
        settings.set("invest.return_rate", self.return_rate);
        settings.set("invest.inflation_rate", self.inflation_rate);
        settings.set("invest.contribution_years", self.contribution_years);
        settings.set("invest.simulation_years", self.simulation_years);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionYear {
    pub year: u32,
    pub contribution: Decimal,
    pub cumulative_contributions: Decimal,
    pub projected_value: Decimal,
    pub present_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionProjection {
    pub total_contributions: Decimal,
    pub projected_value: Decimal,
    pub present_value: Decimal,
    pub years: Vec<ContributionYear>,
}

impl ContributionPlan {
    /// Contribution paid in `year` (1-based), zero once contributions stop.
    pub fn contribution_in(
        &self,
        year: u32,
    ) -> Decimal {
        if year == 0 || year > self.contribution_years {
            return Decimal::ZERO;
        }
        self.annual_contribution
            .saturating_mul(growth_factor(self.contribution_growth_rate, year - 1))
    }

    /// Value at the end of `year` of every contribution made so far.
    pub fn value_at(
        &self,
        year: u32,
    ) -> Decimal {
        let paid = self.contribution_years.min(year);
        (1..=paid)
            .map(|k| {
                self.contribution_in(k)
                    .saturating_mul(growth_factor(self.return_rate, year - k + 1))
            })
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn project(&self) -> ContributionProjection {
        let inflation = InflationAdjuster::new(self.inflation_rate);
        let mut cumulative = Decimal::ZERO;

        let years: Vec<ContributionYear> = (1..=self.simulation_years)
            .map(|year| {
                let contribution = self.contribution_in(year);
                cumulative += contribution;
                let projected_value = self.value_at(year);
                ContributionYear {
                    year,
                    contribution,
                    cumulative_contributions: cumulative,
                    projected_value,
                    present_value: inflation.present_value(projected_value, year),
                }
            })
            .collect();

        let projected_value = self.value_at(self.simulation_years);
        debug!(%projected_value, years = years.len(), "contribution plan projected");

        ContributionProjection {
            total_contributions: cumulative,
            projected_value,
            present_value: inflation.present_value(projected_value, self.simulation_years),
            years,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn plan() -> ContributionPlan {
        ContributionPlan {
            annual_contribution: dec!(1000),
            contribution_growth_rate: Decimal::ZERO,
            return_rate: dec!(0.1),
            inflation_rate: dec!(0.1),
            contribution_years: 2,
            simulation_years: 3,
        }
    }

    #[test]
    fn contributions_stop_and_compounding_continues() {
        let projection = plan().project();

        let values: Vec<Decimal> = projection.years.iter().map(|y| y.projected_value).collect();
        assert_eq!(values, vec![dec!(1100), dec!(2310), dec!(2541)]);
        assert_eq!(projection.years[2].contribution, Decimal::ZERO);
        assert_eq!(projection.years[2].cumulative_contributions, dec!(2000));
        assert_eq!(projection.total_contributions, dec!(2000));
        assert_eq!(projection.projected_value, dec!(2541));
    }

    #[test]
    fn present_value_discounts_over_each_year() {
        let projection = plan().project();

        assert_eq!(projection.years[0].present_value, dec!(1000));
        assert!((projection.years[1].present_value - dec!(1909.0909090909)).abs() < dec!(0.000001));
    }

    #[test]
    fn contributions_grow_each_year() {
        let plan = ContributionPlan {
            contribution_growth_rate: dec!(0.5),
            ..plan()
        };

        assert_eq!(plan.contribution_in(1), dec!(1000));
        assert_eq!(plan.contribution_in(2), dec!(1500));
        assert_eq!(plan.contribution_in(3), Decimal::ZERO);
    }

    #[test]
    fn contribution_horizon_beyond_simulation_is_capped() {
        let plan = ContributionPlan {
            contribution_years: 10,
            simulation_years: 1,
            ..plan()
        };

        let projection = plan.project();

        assert_eq!(projection.total_contributions, dec!(1000));
        assert_eq!(projection.projected_value, dec!(1100));
    }

    #[test]
    fn empty_plan_is_zero() {
        let plan = ContributionPlan {
            simulation_years: 0,
            ..plan()
        };

        let projection = plan.project();

        assert!(projection.years.is_empty());
        assert_eq!(projection.projected_value, Decimal::ZERO);
        assert_eq!(projection.present_value, Decimal::ZERO);
    }
}
