//! Real-estate fund share (SCPI) projection with dismemberment and
//! reinvestment.
//!
//! Capital is tracked as [`OwnershipSegment`]s. The initial investment is the
//! first segment; each reinvestment of positive cash flow opens another one
//! with its own start year and dismemberment horizon. Every segment grows by
//! the appreciation rate independently, so after `N` years a segment is worth
//! `initial_value × (1 + appreciation)^(N − start_year + 1)`.
//!
//! | Ownership | Value while dismembered | Value afterwards |
//! |-----------|-------------------------|------------------|
//! | Full | segment value | segment value |
//! | Bare ownership | value × discount | full value |
//! | Usufruct | value / (1 − discount) | nothing |
//!
//! The discount is looked up by the segment's dismemberment duration in the
//! discount table, falling back to the default discount.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{max, safe_div};
use crate::calculations::inflation::InflationAdjuster;
use crate::calculations::loan::{AmortizationYearSlice, LoanAmortizer, LoanParameters};
use crate::calculations::projection::ProjectionYearSnapshot;
use crate::calculations::projection::regime::{Deductibles, RealRegime, TaxRegimeStrategy};
use crate::models::{FromSettings, Settings};

/// Dismemberment durations with their own discount entry.
pub const DISCOUNT_TABLE_YEARS: std::ops::RangeInclusive<u32> = 3..=20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipKind {
    Full,
    BareOwnership,
    Usufruct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestorEntity {
    /// Held directly; distributions are taxed at the personal rate.
    Personal,
    /// Held by a company subject to corporate tax, which may deduct
    /// amortization and loan costs.
    Company,
}

/// Personal taxation of distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalTaxation {
    /// Single flat rate covering tax and social levies.
    FlatTax,
    /// Marginal income tax rate plus social levies.
    MarginalRate,
}

macro_rules! settings_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut fmt::Formatter<'_>,
            ) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }
    };
}

settings_enum!(OwnershipKind {
    Full => "full",
    BareOwnership => "bare_ownership",
    Usufruct => "usufruct",
});

settings_enum!(InvestorEntity {
    Personal => "personal",
    Company => "company",
});

settings_enum!(PersonalTaxation {
    FlatTax => "flat_tax",
    MarginalRate => "marginal_rate",
});

/// Tunable heuristics for reinvesting positive cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinvestmentPolicy {
    /// Share of the inflation erosion of a usufruct position that is kept as
    /// cash instead of reinvested once the loan is repaid.
    pub coverage_factor: Decimal,
    /// Dismemberment duration given to reinvested usufruct segments.
    pub usufruct_segment_years: u32,
}

impl Default for ReinvestmentPolicy {
    fn default() -> Self {
        Self {
            coverage_factor: Decimal::new(75, 2),
            usufruct_segment_years: 20,
        }
    }
}

/// A tranche of capital entering the fund in `start_year`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipSegment {
    pub initial_value: Decimal,
    pub current_value: Decimal,
    pub start_year: u32,
    /// `None` for full ownership.
    pub dismemberment_years: Option<u32>,
}

impl OwnershipSegment {
    fn new(
        value: Decimal,
        start_year: u32,
        dismemberment_years: Option<u32>,
    ) -> Self {
        Self {
            initial_value: value,
            current_value: value,
            start_year,
            dismemberment_years,
        }
    }

    fn is_dismembered_in(
        &self,
        year: u32,
    ) -> bool {
        let held = year.saturating_sub(self.start_year) + 1;
        self.dismemberment_years
            .is_some_and(|duration| held <= duration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundShareInput {
    pub entity: InvestorEntity,
    pub investment_amount: Decimal,
    pub ownership: OwnershipKind,
    pub dismemberment_years: u32,
    /// Bare-ownership share of the full value, used when the table has no
    /// entry for a duration.
    pub default_discount: Decimal,
    pub discount_table: BTreeMap<u32, Decimal>,
    pub distribution_yield: Decimal,
    pub appreciation_rate: Decimal,
    pub personal_taxation: PersonalTaxation,
    pub income_tax_rate: Decimal,
    pub social_levy_rate: Decimal,
    pub corporate_tax_rate: Decimal,
    pub inflation_rate: Decimal,
    pub simulation_years: u32,
    pub use_loan: bool,
    /// Share of the effective investment financed by the loan.
    pub loan_share: Decimal,
    pub loan_term_years: u32,
    pub loan_interest_rate: Decimal,
    pub loan_insurance_rate: Decimal,
    pub loan_dossier_fees: Decimal,
    pub management_fee_rate: Decimal,
    pub entry_fee_rate: Decimal,
    pub accounting_fees: Decimal,
    /// Months without distributions after subscription.
    pub distribution_delay_months: u32,
    pub reinvest: bool,
    pub policy: ReinvestmentPolicy,
}

impl Default for FundShareInput {
    fn default() -> Self {
        let default_discount = Decimal::new(60, 2);
        Self {
            entity: InvestorEntity::Personal,
            investment_amount: Decimal::from(100_000),
            ownership: OwnershipKind::Full,
            dismemberment_years: 10,
            default_discount,
            discount_table: DISCOUNT_TABLE_YEARS
                .map(|years| (years, default_discount))
                .collect(),
            distribution_yield: Decimal::new(5, 2),
            appreciation_rate: Decimal::new(2, 2),
            personal_taxation: PersonalTaxation::FlatTax,
            income_tax_rate: Decimal::new(30, 2),
            social_levy_rate: Decimal::new(172, 3),
            corporate_tax_rate: Decimal::new(15, 2),
            inflation_rate: Decimal::new(25, 3),
            simulation_years: 20,
            use_loan: false,
            loan_share: Decimal::new(50, 2),
            loan_term_years: 15,
            loan_interest_rate: Decimal::new(35, 3),
            loan_insurance_rate: Decimal::new(3, 3),
            loan_dossier_fees: Decimal::from(1_000),
            management_fee_rate: Decimal::new(10, 2),
            entry_fee_rate: Decimal::new(8, 2),
            accounting_fees: Decimal::ZERO,
            distribution_delay_months: 3,
            reinvest: false,
            policy: ReinvestmentPolicy::default(),
        }
    }
}

impl FundShareInput {
    /// Amount subscribed plus capitalized fees.
    pub fn effective_investment(&self) -> Decimal {
        let dossier = if self.use_loan {
            self.loan_dossier_fees
        } else {
            Decimal::ZERO
        };
        (self.investment_amount + dossier) * (Decimal::ONE + self.entry_fee_rate)
    }

    pub fn loan_amount(&self) -> Decimal {
        if self.use_loan {
            self.effective_investment() * self.loan_share
        } else {
            Decimal::ZERO
        }
    }

    pub fn loan(&self) -> LoanParameters {
        LoanParameters {
            principal: self.loan_amount(),
            annual_interest_rate: self.loan_interest_rate,
            annual_insurance_rate: self.loan_insurance_rate,
            term_years: if self.use_loan {
                self.loan_term_years
            } else {
                0
            },
        }
    }

    /// Capital the investor puts in personally.
    pub fn personal_capital(&self) -> Decimal {
        self.effective_investment() - self.loan_amount()
    }

    /// Discount for a dismemberment of `years`.
    pub fn discount_for(
        &self,
        years: u32,
    ) -> Decimal {
        self.discount_table
            .get(&years)
            .copied()
            .unwrap_or(self.default_discount)
    }

    fn personal_rate(&self) -> Decimal {
        match self.personal_taxation {
            PersonalTaxation::FlatTax => self.income_tax_rate,
            PersonalTaxation::MarginalRate => self.income_tax_rate + self.social_levy_rate,
        }
    }

    fn segment_value(
        &self,
        segment: &OwnershipSegment,
        year: u32,
    ) -> Decimal {
        let dismembered = segment.is_dismembered_in(year);
        let discount = segment
            .dismemberment_years
            .map(|years| self.discount_for(years))
            .unwrap_or(self.default_discount);

        match self.ownership {
            OwnershipKind::Full => segment.current_value,
            OwnershipKind::BareOwnership if dismembered => segment.current_value * discount,
            OwnershipKind::BareOwnership => segment.current_value,
            OwnershipKind::Usufruct if dismembered => {
                safe_div(segment.current_value, Decimal::ONE - discount)
            }
            OwnershipKind::Usufruct => Decimal::ZERO,
        }
    }

    fn initial_dismemberment(&self) -> Option<u32> {
        match self.ownership {
            OwnershipKind::Full => None,
            OwnershipKind::BareOwnership | OwnershipKind::Usufruct => {
                Some(self.dismemberment_years)
            }
        }
    }

    /// Dismemberment duration of a segment opened in `year`.
    fn reinvestment_dismemberment(
        &self,
        year: u32,
    ) -> Option<u32> {
        match self.ownership {
            OwnershipKind::Full => None,
            OwnershipKind::Usufruct => Some(self.policy.usufruct_segment_years),
            OwnershipKind::BareOwnership => self
                .dismemberment_years
                .checked_sub(year - 1)
                .filter(|remaining| *remaining > 0),
        }
    }
}

fn read_enum<T: FromStr + fmt::Display>(
    settings: &Settings,
    key: &str,
    default: T,
) -> T {
    let raw = settings.text(key, &default.to_string());
    raw.parse().unwrap_or_else(|_| {
        warn!(key, value = %raw, "unknown setting value, using default");
        default
    })
}

impl FromSettings for FundShareInput {
    fn from_settings(settings: &Settings) -> Self {
        let d = FundShareInput::default();
        let default_discount = settings.rate("scpi.default_discount", d.default_discount);
        Self {
            entity: read_enum(settings, "scpi.entity", d.entity),
            investment_amount: settings.amount("scpi.investment_amount", d.investment_amount),
            ownership: read_enum(settings, "scpi.ownership", d.ownership),
            dismemberment_years: settings
                .years("scpi.dismemberment_years", d.dismemberment_years),
            default_discount,
            discount_table: DISCOUNT_TABLE_YEARS
                .map(|years| {
                    let key = format!("scpi.discount.{years}");
                    (years, settings.rate(&key, default_discount))
                })
                .collect(),
            distribution_yield: settings.rate("scpi.distribution_yield", d.distribution_yield),
            appreciation_rate: settings
                .signed_rate("scpi.appreciation_rate", d.appreciation_rate),
            personal_taxation: read_enum(settings, "scpi.personal_taxation", d.personal_taxation),
            income_tax_rate: settings.rate("scpi.income_tax_rate", d.income_tax_rate),
            social_levy_rate: settings.rate("scpi.social_levy_rate", d.social_levy_rate),
            corporate_tax_rate: settings.rate("scpi.corporate_tax_rate", d.corporate_tax_rate),
            inflation_rate: settings.signed_rate("scpi.inflation_rate", d.inflation_rate),
            simulation_years: settings.years("scpi.simulation_years", d.simulation_years),
            use_loan: settings.flag("scpi.use_loan", d.use_loan),
            loan_share: settings.rate("scpi.loan_share", d.loan_share),
            loan_term_years: settings.years("scpi.loan_term_years", d.loan_term_years),
            loan_interest_rate: settings.rate("scpi.loan_interest_rate", d.loan_interest_rate),
            loan_insurance_rate: settings.rate("scpi.loan_insurance_rate", d.loan_insurance_rate),
            loan_dossier_fees: settings.amount("scpi.loan_dossier_fees", d.loan_dossier_fees),
            management_fee_rate: settings.rate("scpi.management_fee_rate", d.management_fee_rate),
            entry_fee_rate: settings.rate("scpi.entry_fee_rate", d.entry_fee_rate),
            accounting_fees: settings.amount("scpi.accounting_fees", d.accounting_fees),
            distribution_delay_months: settings
                .months("scpi.distribution_delay_months", d.distribution_delay_months),
            reinvest: settings.flag("scpi.reinvest", d.reinvest),
            policy: ReinvestmentPolicy {
                coverage_factor: settings
                    .rate("scpi.reinvest_coverage_factor", d.policy.coverage_factor),
                usufruct_segment_years: settings.years(
                    "scpi.usufruct_segment_years",
                    d.policy.usufruct_segment_years,
                ),
            },
        }
    }

    fn write_settings(
        &self,
        settings: &mut Settings,
    ) {
        settings.set("scpi.entity", self.entity.as_str());
        settings.set("scpi.investment_amount", self.investment_amount);
        settings.set("scpi.ownership", self.ownership.as_str());
        settings.set("scpi.dismemberment_years", self.dismemberment_years);
        settings.set("scpi.default_discount", self.default_discount);
        for (years, discount) in &self.discount_table {
            settings.set(format!("scpi.discount.{years}"), *discount);
        }
        settings.set("scpi.distribution_yield", self.distribution_yield);
        settings.set("scpi.appreciation_rate", self.appreciation_rate);
        settings.set("scpi.personal_taxation", self.personal_taxation.as_str());
        settings.set("scpi.income_tax_rate", self.income_tax_rate);
        settings.set("scpi.social_levy_rate", self.social_levy_rate);
        settings.set("scpi.corporate_tax_rate", self.corporate_tax_rate);
        settings.set("scpi.inflation_rate", self.inflation_rate);
        settings.set("scpi.simulation_years", self.simulation_years);
        settings.set("scpi.use_loan", self.use_loan);
        settings.set("scpi.loan_share", self.loan_share);
        settings.set("scpi.loan_term_years", self.loan_term_years);
        settings.set("scpi.loan_interest_rate", self.loan_interest_rate);
        settings.set("scpi.loan_insurance_rate", self.loan_insurance_rate);
        settings.set("scpi.loan_dossier_fees", self.loan_dossier_fees);
        settings.set("scpi.management_fee_rate", self.management_fee_rate);
        settings.set("scpi.entry_fee_rate", self.entry_fee_rate);
        settings.set("scpi.accounting_fees", self.accounting_fees);
        settings.set("scpi.distribution_delay_months", self.distribution_delay_months);
        settings.set("scpi.reinvest", self.reinvest);
        settings.set("scpi.reinvest_coverage_factor", self.policy.coverage_factor);
        settings.set("scpi.usufruct_segment_years", self.policy.usufruct_segment_years);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundShareSummary {
    pub effective_investment: Decimal,
    pub personal_capital: Decimal,
    /// Distributions net of fees.
    pub total_distributions: Decimal,
    pub total_taxes: Decimal,
    pub total_loan_payments: Decimal,
    pub total_reinvested: Decimal,
    /// Last year's total value. A usufruct position leaves out the fund
    /// value, which returns to the bare owner.
    pub final_value: Decimal,
    pub final_present_value: Decimal,
    pub gain_on_total_cost: Decimal,
    pub gain_on_personal_capital: Decimal,
    /// `final_value / personal_capital − 1`
    pub return_on_personal_capital: Decimal,
    pub annualized_return: Decimal,
    pub gross_yield: Decimal,
    pub net_yield: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundShareProjection {
    pub years: Vec<ProjectionYearSnapshot>,
    /// Segments with their values after the last simulated year.
    pub segments: Vec<OwnershipSegment>,
    pub summary: FundShareSummary,
}

impl FundShareProjection {
    pub fn project(input: &FundShareInput) -> Self {
        let inflation = InflationAdjuster::new(input.inflation_rate);
        let appreciation = Decimal::ONE + input.appreciation_rate;
        let schedule = LoanAmortizer::new(input.loan()).schedule_for(input.simulation_years);
        let loan_term = input.loan().term_years;
        let twelve = Decimal::from(12);

        let mut segments = vec![OwnershipSegment::new(
            input.investment_amount,
            1,
            input.initial_dismemberment(),
        )];
        let mut cash_balance = Decimal::ZERO;
        let mut years = Vec::with_capacity(input.simulation_years as usize);

        for slice in &schedule {
            let year = slice.year;

            let asset_value: Decimal = segments
                .iter()
                .map(|segment| input.segment_value(segment, year))
                .sum();

            let income = if year == 1 {
                let paid_months = Decimal::from(12u32.saturating_sub(input.distribution_delay_months));
                asset_value * input.distribution_yield * paid_months / twelve
            } else {
                asset_value * input.distribution_yield
            };
            let charges = income * input.management_fee_rate + input.accounting_fees;

            let (regime, deductibles) = tax_treatment(input, year, slice, charges);
            let taxable = regime.taxable_income(income, &deductibles);
            let taxes = regime.tax(taxable);
            let deductions = regime.deductions(income, &deductibles);
            let loan_payment = slice.total_paid();

            let cash_flow = income - charges - taxes - loan_payment;
            cash_balance += cash_flow;

            let mut reinvested = Decimal::ZERO;
            if input.reinvest && cash_flow > Decimal::ZERO {
                let remaining = input.reinvestment_dismemberment(year);
                let mut to_invest = cash_flow;
                if input.ownership == OwnershipKind::Usufruct && year > loan_term {
                    let discount = remaining
                        .map(|years| input.discount_for(years))
                        .unwrap_or(input.default_discount);
                    let erosion = asset_value * input.inflation_rate * (Decimal::ONE - discount);
                    to_invest = max(cash_flow - erosion * input.policy.coverage_factor, Decimal::ZERO);
                }
                if to_invest > Decimal::ZERO {
                    segments.push(OwnershipSegment::new(to_invest, year, remaining));
                    cash_balance -= to_invest;
                    reinvested = to_invest;
                }
            }

            for segment in &mut segments {
                segment.current_value = segment.current_value.saturating_mul(appreciation);
            }

            years.push(
                ProjectionYearSnapshot {
                    year,
                    asset_value,
                    income,
                    charges,
                    deductions,
                    taxes,
                    loan_payment,
                    cash_flow,
                    cash_balance,
                    reinvested,
                    remaining_loan_balance: slice.remaining_balance,
                    total_value: Decimal::ZERO,
                    present_value: Decimal::ZERO,
                }
                .valued(&inflation),
            );
        }

        let summary = summarize(input, &years, &inflation);
        debug!(
            years = years.len(),
            segments = segments.len(),
            final_value = %summary.final_value,
            "fund share projection complete"
        );

        Self {
            years,
            segments,
            summary,
        }
    }
}

/// Regime and deductible amounts for the investor's entity.
fn tax_treatment(
    input: &FundShareInput,
    year: u32,
    slice: &AmortizationYearSlice,
    charges: Decimal,
) -> (RealRegime, Deductibles) {
    match input.entity {
        InvestorEntity::Personal => (
            RealRegime {
                rate: input.personal_rate(),
            },
            Deductibles {
                charges,
                ..Deductibles::default()
            },
        ),
        InvestorEntity::Company => {
            let usufruct_amortization = if input.ownership == OwnershipKind::Usufruct
                && year <= input.dismemberment_years
            {
                safe_div(
                    input.investment_amount,
                    Decimal::from(input.dismemberment_years),
                )
            } else {
                Decimal::ZERO
            };
            let loan_fees = if input.use_loan && year == 1 {
                input.loan_dossier_fees
            } else {
                Decimal::ZERO
            };
            (
                RealRegime {
                    rate: input.corporate_tax_rate,
                },
                Deductibles {
                    charges,
                    loan_interest: slice.interest_paid,
                    loan_insurance: slice.insurance_paid,
                    loan_fees,
                    amortization: usufruct_amortization,
                },
            )
        }
    }
}

/// `(final / capital)^(1 / years) − 1`, zero when undefined.
fn annualized_return(
    final_value: Decimal,
    capital: Decimal,
    years: u32,
) -> Decimal {
    if years == 0 || capital <= Decimal::ZERO || final_value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let ratio = safe_div(final_value, capital).to_f64().unwrap_or(0.0);
    let rate = ratio.powf(1.0 / f64::from(years)) - 1.0;
    if !rate.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(rate).unwrap_or(Decimal::ZERO)
}

fn summarize(
    input: &FundShareInput,
    years: &[ProjectionYearSnapshot],
    inflation: &InflationAdjuster,
) -> FundShareSummary {
    let effective_investment = input.effective_investment();
    let personal_capital = input.personal_capital();

    let mut final_value = years.last().map(|last| last.total_value).unwrap_or_default();
    if input.ownership == OwnershipKind::Usufruct && input.dismemberment_years > 0 {
        final_value -= years.last().map(|last| last.asset_value).unwrap_or_default();
    }

    let return_on_personal_capital = if personal_capital > Decimal::ZERO {
        safe_div(final_value, personal_capital) - Decimal::ONE
    } else {
        Decimal::ZERO
    };

    let gross_distributions = input.investment_amount * input.distribution_yield;
    let net_distributions = gross_distributions * (Decimal::ONE - input.management_fee_rate)
        - input.accounting_fees;

    FundShareSummary {
        effective_investment,
        personal_capital,
        total_distributions: years.iter().map(|y| y.income - y.charges).sum(),
        total_taxes: years.iter().map(|y| y.taxes).sum(),
        total_loan_payments: years.iter().map(|y| y.loan_payment).sum(),
        total_reinvested: years.iter().map(|y| y.reinvested).sum(),
        final_value,
        final_present_value: inflation.present_value(final_value, input.simulation_years),
        gain_on_total_cost: final_value - effective_investment,
        gain_on_personal_capital: final_value - personal_capital,
        return_on_personal_capital,
        annualized_return: annualized_return(
            final_value,
            personal_capital,
            input.simulation_years,
        ),
        gross_yield: safe_div(gross_distributions, input.investment_amount),
        net_yield: safe_div(net_distributions, input.investment_amount),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::common::growth_factor;

    /// Value of `initial` after growing from `start_year` through `year`.
    fn segment_value_after(
        initial: Decimal,
        start_year: u32,
        year: u32,
        appreciation_rate: Decimal,
    ) -> Decimal {
        let held = (year + 1).saturating_sub(start_year);
        initial.saturating_mul(growth_factor(appreciation_rate, held))
    }

    fn assert_close(
        actual: Decimal,
        expected: Decimal,
    ) {
        assert!(
            (actual - expected).abs() <= dec!(0.000001),
            "expected {expected}, got {actual}"
        );
    }

    // ===== full ownership tests =====

    #[test]
    fn first_year_distributions_skip_delay_months() {
        let projection = FundShareProjection::project(&FundShareInput::default());

        let first = &projection.years[0];
        assert_eq!(first.asset_value, dec!(100000));
        assert_eq!(first.income, dec!(3750));
        assert_eq!(first.charges, dec!(375));
        assert_eq!(first.taxes, dec!(1012.5));
        assert_eq!(first.cash_flow, dec!(2362.5));
        assert_eq!(first.total_value, dec!(102362.5));

        let second = &projection.years[1];
        assert_eq!(second.asset_value, dec!(102000));
        assert_eq!(second.income, dec!(5100));
        assert_eq!(second.taxes, dec!(1377));
        assert_eq!(second.cash_balance, dec!(5575.5));
    }

    #[test]
    fn marginal_rate_adds_social_levies() {
        let input = FundShareInput {
            personal_taxation: PersonalTaxation::MarginalRate,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);

        assert_eq!(projection.years[0].taxes, dec!(1593));
    }

    #[test]
    fn summary_reports_yields_and_capital() {
        let projection = FundShareProjection::project(&FundShareInput::default());
        let summary = &projection.summary;

        assert_eq!(summary.effective_investment, dec!(108000));
        assert_eq!(summary.personal_capital, dec!(108000));
        assert_eq!(summary.gross_yield, dec!(0.05));
        assert_eq!(summary.net_yield, dec!(0.045));
        assert_eq!(summary.total_loan_payments, Decimal::ZERO);
        assert!(summary.annualized_return > Decimal::ZERO);
        assert!(summary.annualized_return < summary.return_on_personal_capital);
    }

    // ===== dismemberment tests =====

    #[test]
    fn bare_ownership_is_discounted_until_dismemberment_ends() {
        let input = FundShareInput {
            ownership: OwnershipKind::BareOwnership,
            appreciation_rate: Decimal::ZERO,
            simulation_years: 12,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);

        assert_eq!(projection.years[0].asset_value, dec!(60000));
        assert_eq!(projection.years[9].asset_value, dec!(60000));
        assert_eq!(projection.years[10].asset_value, dec!(100000));
    }

    #[test]
    fn usufruct_is_grossed_up_then_expires() {
        let mut input = FundShareInput {
            ownership: OwnershipKind::Usufruct,
            appreciation_rate: Decimal::ZERO,
            simulation_years: 12,
            ..FundShareInput::default()
        };
        input.discount_table.insert(10, dec!(0.75));

        let projection = FundShareProjection::project(&input);

        assert_eq!(projection.years[0].asset_value, dec!(400000));
        assert_eq!(projection.years[10].asset_value, Decimal::ZERO);
        assert_eq!(projection.years[10].income, Decimal::ZERO);
        assert_eq!(
            projection.summary.final_value,
            projection.years[11].cash_balance
        );
    }

    #[test]
    fn company_deducts_usufruct_amortization_and_loan_costs() {
        let input = FundShareInput {
            entity: InvestorEntity::Company,
            ownership: OwnershipKind::Usufruct,
            use_loan: true,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);
        let first = &projection.years[0];

        // distributions are smaller than the deductions, nothing is taxed
        assert_eq!(first.taxes, Decimal::ZERO);
        assert_eq!(first.deductions, first.income);
        assert!(first.loan_payment > Decimal::ZERO);
        assert_eq!(input.effective_investment(), dec!(109080));
        assert_eq!(input.loan_amount(), dec!(54540));
    }

    #[test]
    fn company_taxes_profit_above_deductions_at_corporate_rate() {
        let input = FundShareInput {
            entity: InvestorEntity::Company,
            distribution_delay_months: 0,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);

        // 5000 distributions - 500 fees, taxed at 15 %
        assert_eq!(projection.years[0].deductions, dec!(500));
        assert_eq!(projection.years[0].taxes, dec!(675));
    }

    // ===== loan tests =====

    #[test]
    fn loan_balance_is_subtracted_from_total_value() {
        let input = FundShareInput {
            use_loan: true,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);

        let first = &projection.years[0];
        assert!(first.remaining_loan_balance > Decimal::ZERO);
        assert_eq!(
            first.total_value,
            first.asset_value + first.cash_balance - first.remaining_loan_balance
        );
        assert_eq!(projection.years[15].loan_payment, Decimal::ZERO);
        assert_eq!(projection.years[14].remaining_loan_balance, Decimal::ZERO);
        assert_close(
            projection.summary.total_loan_payments,
            input.loan().annual_payment() * dec!(15),
        );
    }

    // ===== reinvestment tests =====

    #[test]
    fn reinvested_segments_each_grow_from_their_start_year() {
        let input = FundShareInput {
            reinvest: true,
            simulation_years: 8,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);
        let last_year = input.simulation_years;

        assert_eq!(projection.segments.len(), 9);
        for segment in &projection.segments {
            assert_close(
                segment.current_value,
                segment_value_after(
                    segment.initial_value,
                    segment.start_year,
                    last_year,
                    input.appreciation_rate,
                ),
            );
        }
        assert!(projection.years.iter().all(|y| y.cash_balance.abs() < dec!(0.000001)));
    }

    #[test]
    fn usufruct_reinvestment_keeps_inflation_erosion_as_cash() {
        let input = FundShareInput {
            ownership: OwnershipKind::Usufruct,
            reinvest: true,
            simulation_years: 2,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);
        let first = &projection.years[0];

        // 250000 × 0.025 × 0.4 × 0.75 stays as cash
        assert_close(first.reinvested, first.cash_flow - dec!(1875));
        assert_close(first.cash_balance, dec!(1875));
        assert_eq!(projection.segments[1].dismemberment_years, Some(20));
    }

    #[test]
    fn bare_ownership_reinvestment_shortens_dismemberment() {
        let input = FundShareInput {
            ownership: OwnershipKind::BareOwnership,
            reinvest: true,
            simulation_years: 3,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);

        let horizons: Vec<Option<u32>> = projection
            .segments
            .iter()
            .map(|segment| segment.dismemberment_years)
            .collect();
        assert_eq!(horizons, vec![Some(10), Some(10), Some(9), Some(8)]);
    }

    // ===== degenerate input tests =====

    #[test]
    fn zero_investment_produces_zeros() {
        let input = FundShareInput {
            investment_amount: Decimal::ZERO,
            ownership: OwnershipKind::Usufruct,
            ..FundShareInput::default()
        };

        let projection = FundShareProjection::project(&input);

        assert!(projection.years.iter().all(|y| y.total_value.is_zero()));
        assert_eq!(projection.summary.gross_yield, Decimal::ZERO);
        assert_eq!(projection.summary.return_on_personal_capital, Decimal::ZERO);
        assert_eq!(projection.summary.annualized_return, Decimal::ZERO);
    }

    #[test]
    fn full_discount_usufruct_does_not_divide_by_zero() {
        let mut input = FundShareInput {
            ownership: OwnershipKind::Usufruct,
            ..FundShareInput::default()
        };
        input.discount_table.insert(10, Decimal::ONE);

        let projection = FundShareProjection::project(&input);

        assert_eq!(projection.years[0].asset_value, Decimal::ZERO);
    }

    #[test]
    fn settings_round_trip_keeps_discount_table() {
        let mut input = FundShareInput {
            ownership: OwnershipKind::BareOwnership,
            entity: InvestorEntity::Company,
            ..FundShareInput::default()
        };
        input.discount_table.insert(15, dec!(0.55));
        let mut settings = Settings::new();

        input.write_settings(&mut settings);

        assert_eq!(settings.text("scpi.ownership", ""), "bare_ownership");
        assert_eq!(FundShareInput::from_settings(&settings), input);
    }

    #[test]
    fn unknown_ownership_falls_back_to_default() {
        let mut settings = Settings::new();
        settings.set("scpi.ownership", "timeshare");

        let input = FundShareInput::from_settings(&settings);

        assert_eq!(input.ownership, OwnershipKind::Full);
    }
}
