//! Progressive income tax with the French low-income rebate (decote).
//!
//! [`ProgressiveTaxCalculator`] walks a bracket schedule and taxes the share
//! of the amount falling inside each bracket at that bracket's rate:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Sort brackets by upper bound (unbounded last) |
//! | 2    | Tax each slice `min(remaining, up_to - lower)` at the bracket rate |
//! | 3    | Record the highest rate that taxed a non-empty slice |
//! | 4    | If requested and tax ≤ ceiling, subtract `flat − tax × rate`, clamped to `[0, tax]` |
//!
//! Brackets are not validated. Non-monotonic rates are taxed as given, and a
//! schedule with no unbounded bracket leaves income above its last bound
//! untaxed.
//!
//! [`HouseholdTaxCalculator`] builds the taxable base of a household from
//! salary, rents, dividends and capital gains, and adds social levies.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fiscal_core::TaxBracket;
//! use fiscal_core::calculations::{DecoteParams, ProgressiveTaxCalculator};
//!
//! let brackets = TaxBracket::france_2025();
//! let calculator = ProgressiveTaxCalculator::new(&brackets, DecoteParams::default());
//!
//! let result = calculator.calculate(dec!(33632.375), true);
//!
//! assert_eq!(result.tax, dec!(3255.0025));
//! assert_eq!(result.decote, dec!(0));
//! assert_eq!(result.marginal_rate, dec!(0.30));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{max, min, safe_div};
use crate::models::{BracketLimit, FiscalYearConfig, FromSettings, Settings, TaxBracket};

/// Low-income rebate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoteParams {
    /// Computed tax above which no rebate applies.
    pub ceiling: Decimal,
    pub flat_rebate: Decimal,
    pub rate: Decimal,
}

impl DecoteParams {
    pub fn from_config(config: &FiscalYearConfig) -> Self {
        Self {
            ceiling: config.decote_ceiling,
            flat_rebate: config.decote_flat_rebate,
            rate: config.decote_rate,
        }
    }
}

impl Default for DecoteParams {
    fn default() -> Self {
        Self::from_config(&FiscalYearConfig::default())
    }
}

/// Outcome of a progressive tax evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxResult {
    /// Tax after the decote. Never negative.
    pub tax: Decimal,
    /// Rebate actually applied.
    pub decote: Decimal,
    /// Highest bracket rate reached, as a fraction.
    pub marginal_rate: Decimal,
}

/// Evaluates a progressive bracket schedule.
#[derive(Debug, Clone)]
pub struct ProgressiveTaxCalculator<'a> {
    brackets: &'a [TaxBracket],
    decote: DecoteParams,
}

impl<'a> ProgressiveTaxCalculator<'a> {
    pub fn new(
        brackets: &'a [TaxBracket],
        decote: DecoteParams,
    ) -> Self {
        Self { brackets, decote }
    }

    /// Taxes `amount` and optionally applies the decote.
    ///
    /// Zero or negative amounts yield an all-zero result.
    pub fn calculate(
        &self,
        amount: Decimal,
        apply_decote: bool,
    ) -> TaxResult {
        if amount <= Decimal::ZERO {
            return TaxResult::default();
        }

        let (gross_tax, marginal_rate) = self.bracket_tax(amount);
        let decote = if apply_decote {
            self.decote_for(gross_tax)
        } else {
            Decimal::ZERO
        };

        TaxResult {
            tax: gross_tax - decote,
            decote,
            marginal_rate,
        }
    }

    fn sorted_brackets(&self) -> Vec<&'a TaxBracket> {
        let mut sorted: Vec<&TaxBracket> = self.brackets.iter().collect();
        sorted.sort_by(|a, b| a.up_to.cmp(&b.up_to));
        sorted
    }

    fn bracket_tax(
        &self,
        amount: Decimal,
    ) -> (Decimal, Decimal) {
        let mut tax = Decimal::ZERO;
        let mut marginal_rate = Decimal::ZERO;
        let mut lower_bound = Decimal::ZERO;
        let mut remaining = amount;

        for bracket in self.sorted_brackets() {
            if remaining <= Decimal::ZERO {
                break;
            }

            let slice = match bracket.up_to {
                BracketLimit::Amount(upper) => {
                    let span = max(upper - lower_bound, Decimal::ZERO);
                    lower_bound = max(lower_bound, upper);
                    min(remaining, span)
                }
                BracketLimit::Unbounded => remaining,
            };

            if slice > Decimal::ZERO {
                tax += slice * bracket.rate;
                remaining -= slice;
                if bracket.rate > marginal_rate {
                    marginal_rate = bracket.rate;
                }
            }
        }

        (tax, marginal_rate)
    }

    fn decote_for(
        &self,
        tax: Decimal,
    ) -> Decimal {
        if tax > self.decote.ceiling {
            return Decimal::ZERO;
        }
        let raw = self.decote.flat_rebate - tax * self.decote.rate;
        min(max(raw, Decimal::ZERO), tax)
    }
}

/// Convenience wrapper using the default decote parameters.
pub fn progressive_tax(
    amount: Decimal,
    brackets: &[TaxBracket],
    apply_decote: bool,
) -> TaxResult {
    ProgressiveTaxCalculator::new(brackets, DecoteParams::default()).calculate(amount, apply_decote)
}

/// Household income for the year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdIncome {
    pub salary: Decimal,
    pub rents: Decimal,
    pub dividends: Decimal,
    pub capital_gains: Decimal,
    pub apply_social_to_dividends: bool,
    pub apply_social_to_capital_gains: bool,
    /// Deduct the deductible CSG share from taxable dividends.
    pub apply_csg_deductibility: bool,
    pub apply_decote: bool,
}

impl Default for HouseholdIncome {
    fn default() -> Self {
        Self {
            salary: Decimal::ZERO,
            rents: Decimal::ZERO,
            dividends: Decimal::ZERO,
            capital_gains: Decimal::ZERO,
            apply_social_to_dividends: true,
            apply_social_to_capital_gains: true,
            apply_csg_deductibility: false,
            apply_decote: false,
        }
    }
}

impl FromSettings for HouseholdIncome {
    fn from_settings(settings: &Settings) -> Self {
        let d = HouseholdIncome::default();
        Self {
            salary: settings.amount("household.salary", d.salary),
            rents: settings.amount("household.rents", d.rents),
            dividends: settings.amount("household.dividends", d.dividends),
            capital_gains: settings.amount("household.capital_gains", d.capital_gains),
            apply_social_to_dividends: settings
                .flag("household.social_on_dividends", d.apply_social_to_dividends),
            apply_social_to_capital_gains: settings
                .flag("household.social_on_capital_gains", d.apply_social_to_capital_gains),
            apply_csg_deductibility: settings
                .flag("household.csg_deductibility", d.apply_csg_deductibility),
            apply_decote: settings.flag("household.decote", d.apply_decote),
        }
    }

    fn write_settings(
        &self,
        settings: &mut Settings,
    ) {
        settings.set("household.salary", self.salary);
        settings.set("household.rents", self.rents);
        settings.set("household.dividends", self.dividends);
        settings.set("household.capital_gains", self.capital_gains);
        settings.set("household.social_on_dividends", self.apply_social_to_dividends);
        settings.set("household.social_on_capital_gains", self.apply_social_to_capital_gains);
        settings.set("household.csg_deductibility", self.apply_csg_deductibility);
        settings.set("household.decote", self.apply_decote);
    }
}

/// Breakdown of a household's income tax and social levies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdTaxResult {
    pub taxable_salary: Decimal,
    pub taxable_rents: Decimal,
    pub taxable_dividends: Decimal,
    pub taxable_capital_gains: Decimal,
    pub taxable_income: Decimal,
    pub social_levies: Decimal,
    pub income_tax: TaxResult,
    pub gross_income: Decimal,
    pub net_income: Decimal,
    /// Income tax over gross income.
    pub effective_tax_rate: Decimal,
    /// Income tax plus social levies over gross income.
    pub total_levy_rate: Decimal,
}

/// Household income tax calculator.
#[derive(Debug, Clone)]
pub struct HouseholdTaxCalculator<'a> {
    config: &'a FiscalYearConfig,
    brackets: &'a [TaxBracket],
}

impl<'a> HouseholdTaxCalculator<'a> {
    pub fn new(
        config: &'a FiscalYearConfig,
        brackets: &'a [TaxBracket],
    ) -> Self {
        Self { config, brackets }
    }

    pub fn calculate(
        &self,
        income: &HouseholdIncome,
    ) -> HouseholdTaxResult {
        let config = self.config;

        let taxable_salary = income.salary * (Decimal::ONE - config.professional_expense_deduction);
        let taxable_rents = income.rents * (Decimal::ONE - config.rent_abatement);

        let dividend_social = if income.apply_social_to_dividends {
            income.dividends * config.social_levy_rate
        } else {
            Decimal::ZERO
        };
        let deductible_csg = if income.apply_csg_deductibility {
            income.dividends * config.deductible_csg_rate
        } else {
            Decimal::ZERO
        };
        let taxable_dividends = max(
            income.dividends * (Decimal::ONE - config.dividend_abatement) - deductible_csg,
            Decimal::ZERO,
        );

        let capital_gains_social = if income.apply_social_to_capital_gains {
            income.capital_gains * config.social_levy_rate
        } else {
            Decimal::ZERO
        };
        let taxable_capital_gains = income.capital_gains;

        let taxable_income =
            taxable_salary + taxable_rents + taxable_dividends + taxable_capital_gains;
        let income_tax = ProgressiveTaxCalculator::new(
            self.brackets,
            DecoteParams::from_config(config),
        )
        .calculate(taxable_income, income.apply_decote);

        let social_levies = dividend_social + capital_gains_social;
        let gross_income = income.salary + income.rents + income.dividends + income.capital_gains;
        let net_income = gross_income - income_tax.tax - social_levies;

        debug!(
            %taxable_income,
            tax = %income_tax.tax,
            %social_levies,
            "household tax computed"
        );

        HouseholdTaxResult {
            taxable_salary,
            taxable_rents,
            taxable_dividends,
            taxable_capital_gains,
            taxable_income,
            social_levies,
            income_tax,
            gross_income,
            net_income,
            effective_tax_rate: safe_div(income_tax.tax, gross_income),
            total_levy_rate: safe_div(income_tax.tax + social_levies, gross_income),
        }
    }
}
