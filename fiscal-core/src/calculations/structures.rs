//! Net income of a self-employed activity under each French legal structure.
//!
//! | Structure | Owner is paid through | Company tax | Dividends |
//! |-----------|----------------------|-------------|-----------|
//! | SASU | salary grossed up from the requested net | two-tier corporate tax | profit after tax |
//! | EURL | the whole margin, as self-employed pay | none on a zero margin | none |
//! | EI | the whole margin, as self-employed pay | none | none |
//!
//! Each structure has its own pure function behind [`StructureComparator::compute`].
//! Owner-level income tax goes through [`ProgressiveTaxCalculator`], with the
//! health surcharge (CSM) added when dividends are high and salary is low.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fiscal_core::{FiscalYearConfig, TaxBracket};
//! use fiscal_core::calculations::{StructureComparator, StructureInput, StructureKind};
//!
//! let config = FiscalYearConfig::default();
//! let brackets = TaxBracket::france_2025();
//! let comparator = StructureComparator::new(&config, &brackets);
//!
//! let sasu = comparator.compute(StructureKind::Sasu, &StructureInput::default());
//!
//! assert_eq!(sasu.company_profit, dec!(78625));
//! assert_eq!(sasu.corporate_tax, dec!(15406.25));
//! assert_eq!(sasu.gross_dividends, dec!(63218.75));
//! assert_eq!(sasu.net_income, dec!(46511.65375));
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{max, min, safe_div};
use crate::calculations::income_tax::{DecoteParams, ProgressiveTaxCalculator, TaxResult};
use crate::models::{FiscalYearConfig, FromSettings, Settings, TaxBracket};

/// Upper bound on optimizer iterations. A one-unit tolerance is reached well
/// before this for any realistic revenue.
const MAX_OPTIMIZER_ITERATIONS: u32 = 200;
const OPTIMIZER_TOLERANCE: Decimal = Decimal::ONE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Single-shareholder company, president paid as an assimilated employee.
    Sasu,
    /// Single-member company, manager paid as self-employed.
    Eurl,
    /// Sole proprietorship, optionally under the micro regime.
    SoleProprietorship,
}

impl StructureKind {
    pub const ALL: [StructureKind; 3] = [
        StructureKind::Sasu,
        StructureKind::Eurl,
        StructureKind::SoleProprietorship,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StructureKind::Sasu => "SASU",
            StructureKind::Eurl => "EURL",
            StructureKind::SoleProprietorship => "EI",
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StructureKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sasu" => Ok(StructureKind::Sasu),
            "eurl" => Ok(StructureKind::Eurl),
            "ei" | "sole_proprietorship" | "sole-proprietorship" => {
                Ok(StructureKind::SoleProprietorship)
            }
            other => Err(format!("unknown structure kind: {other}")),
        }
    }
}

/// How the owner is taxed on dividends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendTaxation {
    /// Dividends join the progressive base after abatement; social levies on top.
    Progressive,
    /// Flat tax on dividends; salary alone goes through the brackets.
    FlatTax,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("Net salary optimization is only available for SASU, not {0}")]
    UnsupportedKind(StructureKind),
}

/// Activity figures shared by every structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureInput {
    pub revenue: Decimal,
    pub expenses: Decimal,
    /// Requested net salary. Only the SASU uses it.
    pub net_salary: Decimal,
    /// Rent paid by the company to the owner, deductible and taxed as rent.
    pub rent: Decimal,
    pub dividend_taxation: DividendTaxation,
    /// Regional corporate tax exemption (ZFRR).
    pub corporate_tax_exempt: bool,
    /// Regional employer contribution exemption (ZFRR).
    pub employer_contributions_exempt: bool,
    pub micro_regime: bool,
    /// Flat withholding on micro-regime income (versement libératoire).
    pub flat_withholding: bool,
}

impl Default for StructureInput {
    fn default() -> Self {
        Self {
            revenue: Decimal::from(83_625),
            expenses: Decimal::from(5_000),
            net_salary: Decimal::ZERO,
            rent: Decimal::ZERO,
            dividend_taxation: DividendTaxation::Progressive,
            corporate_tax_exempt: false,
            employer_contributions_exempt: false,
            micro_regime: true,
            flat_withholding: true,
        }
    }
}

impl FromSettings for StructureInput {
    fn from_settings(settings: &Settings) -> Self {
        let d = StructureInput::default();
        let progressive = settings.flag(
            "company.progressive_dividend_tax",
            d.dividend_taxation == DividendTaxation::Progressive,
        );
        Self {
            revenue: settings.amount("company.revenue", d.revenue),
            expenses: settings.amount("company.expenses", d.expenses),
            net_salary: settings.amount("company.net_salary", d.net_salary),
            rent: settings.amount("company.rent", d.rent),
            dividend_taxation: if progressive {
                DividendTaxation::Progressive
            } else {
                DividendTaxation::FlatTax
            },
            corporate_tax_exempt: settings
                .flag("company.corporate_tax_exempt", d.corporate_tax_exempt),
            employer_contributions_exempt: settings.flag(
                "company.employer_contributions_exempt",
                d.employer_contributions_exempt,
            ),
            micro_regime: settings.flag("company.micro_regime", d.micro_regime),
            flat_withholding: settings.flag("company.flat_withholding", d.flat_withholding),
        }
    }

    fn write_settings(
        &self,
        settings: &mut Settings,
    ) {
        settings.set("company.revenue", self.revenue);
        settings.set("company.expenses", self.expenses);
        settings.set("company.net_salary", self.net_salary);
        settings.set("company.rent", self.rent);
        settings.set(
            "company.progressive_dividend_tax",
            self.dividend_taxation == DividendTaxation::Progressive,
        );
        settings.set("company.corporate_tax_exempt", self.corporate_tax_exempt);
        settings.set(
            "company.employer_contributions_exempt",
            self.employer_contributions_exempt,
        );
        settings.set("company.micro_regime", self.micro_regime);
        settings.set("company.flat_withholding", self.flat_withholding);
    }
}

/// Outcome of one structure for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureResult {
    pub kind: StructureKind,
    pub gross_revenue: Decimal,
    pub expenses: Decimal,
    pub rent: Decimal,
    pub gross_salary: Decimal,
    pub net_salary: Decimal,
    pub employee_contributions: Decimal,
    pub employer_contributions: Decimal,
    pub company_profit: Decimal,
    pub corporate_tax: Decimal,
    pub gross_dividends: Decimal,
    /// Dividends left after social levies or flat tax, and the health surcharge.
    pub net_dividends: Decimal,
    pub health_surcharge: Decimal,
    /// Dividend social levies (progressive) or flat tax on dividends.
    pub dividend_levies: Decimal,
    pub income_tax: Decimal,
    pub decote: Decimal,
    pub marginal_rate: Decimal,
    /// Income tax and dividend levies over the owner's gross inflows.
    pub effective_tax_rate: Decimal,
    /// Contributions accruing retirement rights.
    pub retirement_contributions: Decimal,
    /// Owner's net annual income, reported as zero when negative.
    pub net_income: Decimal,
}

/// Best net salary found for a SASU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryOptimization {
    pub net_salary: Decimal,
    pub iterations: u32,
    pub result: StructureResult,
}

/// Owner-level taxes on salary, dividends and rent.
#[derive(Debug, Clone, Copy, Default)]
struct PersonalTax {
    income_tax: TaxResult,
    dividend_levies: Decimal,
    health_surcharge: Decimal,
}

/// Computes and compares structures for one tax year.
#[derive(Debug, Clone)]
pub struct StructureComparator<'a> {
    config: &'a FiscalYearConfig,
    brackets: &'a [TaxBracket],
}

impl<'a> StructureComparator<'a> {
    pub fn new(
        config: &'a FiscalYearConfig,
        brackets: &'a [TaxBracket],
    ) -> Self {
        Self { config, brackets }
    }

    pub fn compute(
        &self,
        kind: StructureKind,
        input: &StructureInput,
    ) -> StructureResult {
        match kind {
            StructureKind::Sasu => self.compute_sasu(input),
            StructureKind::Eurl => self.compute_eurl(input),
            StructureKind::SoleProprietorship => self.compute_sole_proprietorship(input),
        }
    }

    /// One result per structure, in [`StructureKind::ALL`] order.
    pub fn compare(
        &self,
        input: &StructureInput,
    ) -> Vec<StructureResult> {
        let results: Vec<StructureResult> = StructureKind::ALL
            .iter()
            .map(|kind| self.compute(*kind, input))
            .collect();

        debug!(
            revenue = %input.revenue,
            best = ?best(&results).map(|r| r.kind),
            "structures compared"
        );

        results
    }

    /// Largest net salary the company can pay once contributions are added.
    ///
    /// Employer contributions are charged on the gross salary, so one unit of
    /// net salary costs `(1 + employee) × (1 + employer)`.
    pub fn max_net_salary(
        &self,
        input: &StructureInput,
    ) -> Decimal {
        let margin = input.revenue - input.expenses - input.rent;
        let gross_factor = Decimal::ONE + self.config.employee_contribution_rate;
        let loaded = if input.employer_contributions_exempt {
            gross_factor
        } else {
            gross_factor * (Decimal::ONE + self.config.employer_contribution_rate)
        };
        max(safe_div(margin, loaded), Decimal::ZERO)
    }

    /// Net salary maximizing the owner's net income.
    ///
    /// Ternary search over `[0, max_net_salary]` until the interval is narrower
    /// than one currency unit. This assumes net income is unimodal in the
    /// salary; with a plateau or several local maxima it returns one of them.
    pub fn optimize_net_salary(
        &self,
        kind: StructureKind,
        input: &StructureInput,
    ) -> Result<SalaryOptimization, StructureError> {
        if kind != StructureKind::Sasu {
            return Err(StructureError::UnsupportedKind(kind));
        }

        let net_income_for = |salary: Decimal| {
            let candidate = StructureInput {
                net_salary: salary,
                ..input.clone()
            };
            self.compute_sasu(&candidate).net_income
        };

        let three = Decimal::from(3);
        let mut low = Decimal::ZERO;
        let mut high = self.max_net_salary(input);
        let mut iterations = 0;

        while high - low > OPTIMIZER_TOLERANCE && iterations < MAX_OPTIMIZER_ITERATIONS {
            let third = (high - low) / three;
            let left = low + third;
            let right = high - third;

            if net_income_for(left) < net_income_for(right) {
                low = left;
            } else {
                high = right;
            }
            iterations += 1;
        }

        let net_salary = ((low + high) / Decimal::TWO).floor();
        let result = self.compute_sasu(&StructureInput {
            net_salary,
            ..input.clone()
        });

        debug!(%net_salary, iterations, net_income = %result.net_income, "salary optimized");

        Ok(SalaryOptimization {
            net_salary,
            iterations,
            result,
        })
    }

    fn compute_sasu(
        &self,
        input: &StructureInput,
    ) -> StructureResult {
        let config = self.config;

        let net_salary = input.net_salary;
        let employee_contributions = net_salary * config.employee_contribution_rate;
        let gross_salary = net_salary + employee_contributions;
        let employer_contributions = if input.employer_contributions_exempt {
            Decimal::ZERO
        } else {
            gross_salary * config.employer_contribution_rate
        };

        let company_profit = input.revenue
            - (input.expenses + input.rent)
            - gross_salary
            - employer_contributions;
        let corporate_tax = self.corporate_tax(company_profit, input.corporate_tax_exempt);
        let gross_dividends = max(company_profit - corporate_tax, Decimal::ZERO);

        let personal = self.personal_tax(
            net_salary,
            gross_dividends,
            input.rent,
            input.dividend_taxation,
        );
        let net_dividends = gross_dividends - personal.dividend_levies - personal.health_surcharge;
        let net_income = net_salary + net_dividends + input.rent - personal.income_tax.tax;

        StructureResult {
            kind: StructureKind::Sasu,
            gross_revenue: input.revenue,
            expenses: input.expenses,
            rent: input.rent,
            gross_salary,
            net_salary,
            employee_contributions,
            employer_contributions,
            company_profit,
            corporate_tax,
            gross_dividends,
            net_dividends,
            health_surcharge: personal.health_surcharge,
            dividend_levies: personal.dividend_levies,
            income_tax: personal.income_tax.tax,
            decote: personal.income_tax.decote,
            marginal_rate: personal.income_tax.marginal_rate,
            effective_tax_rate: safe_div(
                personal.income_tax.tax + personal.dividend_levies,
                net_salary + gross_dividends + input.rent,
            ),
            retirement_contributions: employee_contributions * config.salaried_retirement_share,
            net_income: max(net_income, Decimal::ZERO),
        }
    }

    fn compute_eurl(
        &self,
        input: &StructureInput,
    ) -> StructureResult {
        let config = self.config;

        // The whole margin is paid out as the manager's remuneration.
        let gross_salary = input.revenue - (input.expenses + input.rent);
        let net_salary = safe_div(
            gross_salary,
            Decimal::ONE + config.manager_contribution_rate,
        );
        let employee_contributions = net_salary * config.manager_contribution_rate;
        let company_profit = input.revenue
            - (input.expenses + input.rent)
            - gross_salary
            - employee_contributions;
        let corporate_tax = self.corporate_tax(company_profit, input.corporate_tax_exempt);

        let personal = self.personal_tax(
            net_salary,
            Decimal::ZERO,
            input.rent,
            input.dividend_taxation,
        );
        let net_income = net_salary + input.rent - personal.income_tax.tax;

        StructureResult {
            kind: StructureKind::Eurl,
            gross_revenue: input.revenue,
            expenses: input.expenses,
            rent: input.rent,
            gross_salary,
            net_salary,
            employee_contributions,
            employer_contributions: Decimal::ZERO,
            company_profit,
            corporate_tax,
            gross_dividends: Decimal::ZERO,
            net_dividends: Decimal::ZERO,
            health_surcharge: personal.health_surcharge,
            dividend_levies: personal.dividend_levies,
            income_tax: personal.income_tax.tax,
            decote: personal.income_tax.decote,
            marginal_rate: personal.income_tax.marginal_rate,
            effective_tax_rate: safe_div(personal.income_tax.tax, net_salary + input.rent),
            retirement_contributions: gross_salary
                * config.manager_contribution_rate
                * config.self_employed_retirement_share,
            net_income: max(net_income, Decimal::ZERO),
        }
    }

    fn compute_sole_proprietorship(
        &self,
        input: &StructureInput,
    ) -> StructureResult {
        let config = self.config;

        let company_profit = input.revenue - (input.expenses + input.rent);
        let gross_salary = company_profit;
        let net_salary = safe_div(
            gross_salary,
            Decimal::ONE + config.sole_proprietor_contribution_rate,
        );
        let employee_contributions = net_salary * config.sole_proprietor_contribution_rate;
        let taxable_rent = input.rent * (Decimal::ONE - config.rent_abatement);

        let micro_eligible = input.micro_regime && input.revenue <= config.micro_revenue_ceiling;
        let income_tax = if micro_eligible && input.flat_withholding {
            TaxResult {
                tax: max(net_salary, Decimal::ZERO) * config.micro_flat_withholding_rate,
                ..TaxResult::default()
            }
        } else if micro_eligible {
            let taxable = company_profit * (Decimal::ONE - config.micro_abatement) + taxable_rent;
            self.tax_calculator().calculate(taxable, true)
        } else {
            self.tax_calculator()
                .calculate(company_profit + taxable_rent, true)
        };

        let net_income = net_salary + input.rent - income_tax.tax;

        StructureResult {
            kind: StructureKind::SoleProprietorship,
            gross_revenue: input.revenue,
            expenses: input.expenses,
            rent: input.rent,
            gross_salary,
            net_salary,
            employee_contributions,
            employer_contributions: Decimal::ZERO,
            company_profit,
            corporate_tax: Decimal::ZERO,
            gross_dividends: Decimal::ZERO,
            net_dividends: Decimal::ZERO,
            health_surcharge: Decimal::ZERO,
            dividend_levies: Decimal::ZERO,
            income_tax: income_tax.tax,
            decote: income_tax.decote,
            marginal_rate: income_tax.marginal_rate,
            effective_tax_rate: safe_div(income_tax.tax, company_profit + input.rent),
            retirement_contributions: employee_contributions
                * config.self_employed_retirement_share,
            net_income: max(net_income, Decimal::ZERO),
        }
    }

    fn tax_calculator(&self) -> ProgressiveTaxCalculator<'a> {
        ProgressiveTaxCalculator::new(self.brackets, DecoteParams::from_config(self.config))
    }

    /// Reduced rate up to the ceiling, normal rate above. Nothing on a loss.
    fn corporate_tax(
        &self,
        profit: Decimal,
        exempt: bool,
    ) -> Decimal {
        if exempt || profit <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let config = self.config;
        let reduced_base = min(profit, config.corporate_reduced_ceiling);
        let normal_base = max(profit - config.corporate_reduced_ceiling, Decimal::ZERO);
        reduced_base * config.corporate_reduced_rate + normal_base * config.corporate_normal_rate
    }

    fn health_surcharge(
        &self,
        net_salary: Decimal,
        gross_dividends: Decimal,
    ) -> Decimal {
        let dividend_threshold = self.config.health_dividend_threshold();
        let salary_threshold = self.config.health_salary_threshold();
        if gross_dividends < dividend_threshold || net_salary > salary_threshold {
            return Decimal::ZERO;
        }
        let excess = gross_dividends - dividend_threshold;
        let exposure = Decimal::ONE - safe_div(net_salary, salary_threshold);
        self.config.health_surcharge_rate * excess * exposure
    }

    fn personal_tax(
        &self,
        net_salary: Decimal,
        gross_dividends: Decimal,
        rent: Decimal,
        taxation: DividendTaxation,
    ) -> PersonalTax {
        let config = self.config;
        let health_surcharge = self.health_surcharge(net_salary, gross_dividends);
        let taxable_rent = rent * (Decimal::ONE - config.rent_abatement);

        match taxation {
            DividendTaxation::Progressive => {
                let dividend_levies = gross_dividends * config.social_levy_rate;
                let taxable_dividends = gross_dividends * (Decimal::ONE - config.dividend_abatement)
                    - gross_dividends * config.deductible_csg_rate;
                let taxable = net_salary * (Decimal::ONE - config.professional_expense_deduction)
                    + taxable_dividends
                    + taxable_rent;
                PersonalTax {
                    income_tax: self.tax_calculator().calculate(taxable, true),
                    dividend_levies,
                    health_surcharge,
                }
            }
            DividendTaxation::FlatTax => PersonalTax {
                income_tax: self
                    .tax_calculator()
                    .calculate(net_salary + taxable_rent, true),
                dividend_levies: gross_dividends * config.flat_tax_rate,
                health_surcharge,
            },
        }
    }
}

/// First result with the highest net income.
pub fn best(results: &[StructureResult]) -> Option<&StructureResult> {
    results.iter().fold(None, |best, current| match best {
        Some(leader) if current.net_income <= leader.net_income => Some(leader),
        _ => Some(current),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn fixture() -> (FiscalYearConfig, Vec<TaxBracket>) {
        (FiscalYearConfig::default(), TaxBracket::france_2025())
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

    // ===== SASU tests =====

    #[test]
    fn sasu_defaults_pin_company_and_owner_figures() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);

        let result = comparator.compute(StructureKind::Sasu, &StructureInput::default());

        assert_eq!(result.company_profit, dec!(78625));
        assert_eq!(result.corporate_tax, dec!(15406.25));
        assert_eq!(result.gross_dividends, dec!(63218.75));
        assert_eq!(result.health_surcharge, dec!(2578.46875));
        assert_eq!(result.dividend_levies, dec!(10873.625));
        assert_eq!(result.income_tax, dec!(3255.0025));
        assert_eq!(result.marginal_rate, dec!(0.30));
        assert_eq!(result.net_dividends, dec!(49766.65625));
        assert_eq!(result.net_income, dec!(46511.65375));
    }

    #[test]
    fn sasu_results_repeat_for_identical_inputs() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput::default();

        assert_eq!(
            comparator.compute(StructureKind::Sasu, &input),
            comparator.compute(StructureKind::Sasu, &input)
        );
    }

    #[test]
    fn sasu_salary_is_grossed_up_with_contributions() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            net_salary: dec!(20000),
            ..StructureInput::default()
        };

        let result = comparator.compute(StructureKind::Sasu, &input);

        assert_eq!(result.gross_salary, dec!(25600));
        assert_eq!(result.employee_contributions, dec!(5600));
        assert_eq!(result.employer_contributions, dec!(13824));
        assert_eq!(result.company_profit, dec!(39201));
        assert_eq!(result.corporate_tax, dec!(5880.15));
        assert_eq!(result.retirement_contributions, dec!(1680));
        // salary above 20 % of PASS, no surcharge
        assert_eq!(result.health_surcharge, Decimal::ZERO);
    }

    #[test]
    fn sasu_exemptions_zero_corporate_tax_and_employer_contributions() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            net_salary: dec!(10000),
            corporate_tax_exempt: true,
            employer_contributions_exempt: true,
            ..StructureInput::default()
        };

        let result = comparator.compute(StructureKind::Sasu, &input);

        assert_eq!(result.employer_contributions, Decimal::ZERO);
        assert_eq!(result.corporate_tax, Decimal::ZERO);
        assert_eq!(result.gross_dividends, dec!(65825));
    }

    #[test]
    fn sasu_flat_tax_levies_thirty_percent_on_dividends() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            dividend_taxation: DividendTaxation::FlatTax,
            ..StructureInput::default()
        };

        let result = comparator.compute(StructureKind::Sasu, &input);

        assert_eq!(result.dividend_levies, dec!(18965.625));
        assert_eq!(result.income_tax, Decimal::ZERO);
        assert_eq!(result.net_income, dec!(41674.65625));
    }

    #[test]
    fn sasu_loss_clamps_net_income_to_zero() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            revenue: dec!(1000),
            expenses: dec!(50000),
            ..StructureInput::default()
        };

        let result = comparator.compute(StructureKind::Sasu, &input);

        assert_eq!(result.corporate_tax, Decimal::ZERO);
        assert_eq!(result.gross_dividends, Decimal::ZERO);
        assert_eq!(result.net_income, Decimal::ZERO);
    }

    // ===== EURL tests =====

    #[test]
    fn eurl_pays_out_margin_as_remuneration() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);

        let result = comparator.compute(StructureKind::Eurl, &StructureInput::default());

        assert_eq!(result.gross_salary, dec!(78625));
        assert_close(result.net_salary, dec!(54224.137931034482758620689655));
        assert_close(result.employee_contributions, dec!(24400.862068965517241379310345));
        assert_eq!(result.corporate_tax, Decimal::ZERO);
        assert_eq!(result.gross_dividends, Decimal::ZERO);
        assert_close(result.income_tax, dec!(7805.8072413793103448275862));
        assert_close(result.net_income, dec!(46418.330689655172413793103));
        assert_close(result.retirement_contributions, dec!(8845.3125));
    }

    // ===== sole proprietorship tests =====

    #[test]
    fn sole_proprietorship_above_micro_ceiling_is_taxed_progressively() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);

        let result =
            comparator.compute(StructureKind::SoleProprietorship, &StructureInput::default());

        assert_eq!(result.company_profit, dec!(78625));
        assert_close(result.net_salary, dec!(54600.694444444444444444444444));
        assert_eq!(result.income_tax, dec!(16752.79));
        assert_eq!(result.marginal_rate, dec!(0.30));
        assert_close(result.net_income, dec!(37847.904444444444444444444444));
    }

    #[test]
    fn sole_proprietorship_micro_with_flat_withholding() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            revenue: dec!(50000),
            expenses: dec!(6800),
            ..StructureInput::default()
        };

        let result = comparator.compute(StructureKind::SoleProprietorship, &input);

        assert_eq!(result.net_salary, dec!(30000));
        assert_eq!(result.income_tax, dec!(660));
        assert_eq!(result.marginal_rate, Decimal::ZERO);
        assert_eq!(result.net_income, dec!(29340));
    }

    #[test]
    fn sole_proprietorship_micro_without_withholding_applies_abatement() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            revenue: dec!(50000),
            expenses: dec!(6800),
            flat_withholding: false,
            ..StructureInput::default()
        };

        let result = comparator.compute(StructureKind::SoleProprietorship, &input);

        // 43200 × 0.66 = 28512 taxable
        assert_eq!(result.decote, dec!(42.078375));
        assert_eq!(result.income_tax, dec!(1829.571625));
        assert_eq!(result.marginal_rate, dec!(0.11));
    }

    // ===== comparison tests =====

    #[test]
    fn compare_returns_every_kind_in_order() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);

        let results = comparator.compare(&StructureInput::default());

        let kinds: Vec<StructureKind> = results.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, StructureKind::ALL.to_vec());
        assert!(results.iter().all(|r| r.net_income >= Decimal::ZERO));
    }

    #[test]
    fn best_picks_maximum_net_income() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);

        let results = comparator.compare(&StructureInput::default());
        let winner = best(&results).expect("three results");

        let top = results
            .iter()
            .map(|r| r.net_income)
            .max()
            .expect("three results");
        assert_eq!(winner.net_income, top);
        assert_eq!(winner.kind, StructureKind::Sasu);
    }

    #[test]
    fn best_keeps_first_on_ties() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            revenue: Decimal::ZERO,
            expenses: dec!(1000),
            ..StructureInput::default()
        };

        let results = comparator.compare(&input);

        assert_eq!(best(&results).map(|r| r.kind), Some(StructureKind::Sasu));
        assert_eq!(best(&[]), None);
    }

    // ===== optimizer tests =====

    #[test]
    fn max_net_salary_accounts_for_both_contributions() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            revenue: dec!(197120),
            expenses: dec!(0),
            ..StructureInput::default()
        };

        let salary = comparator.max_net_salary(&input);

        assert_eq!(salary, dec!(100000));
    }

    #[test]
    fn max_net_salary_leaves_no_profit() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);

        for revenue in [dec!(83625), dec!(141000), dec!(300000)] {
            let input = StructureInput {
                revenue,
                expenses: dec!(0),
                ..StructureInput::default()
            };
            let paid = StructureInput {
                net_salary: comparator.max_net_salary(&input),
                ..input
            };

            let profit = comparator.compute(StructureKind::Sasu, &paid).company_profit;

            assert!(profit.abs() < dec!(0.01), "revenue {revenue}: profit {profit}");
        }
    }

    #[test]
    fn max_net_salary_without_employer_contributions() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            revenue: dec!(128000),
            expenses: dec!(0),
            employer_contributions_exempt: true,
            ..StructureInput::default()
        };

        assert_eq!(comparator.max_net_salary(&input), dec!(100000));
    }

    #[test]
    fn optimizer_rejects_structures_other_than_sasu() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);

        for kind in [StructureKind::Eurl, StructureKind::SoleProprietorship] {
            assert_eq!(
                comparator.optimize_net_salary(kind, &StructureInput::default()),
                Err(StructureError::UnsupportedKind(kind))
            );
        }
    }

    #[test]
    fn optimizer_beats_both_ends_of_the_salary_range() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput::default();
        let ceiling = comparator.max_net_salary(&input);

        let optimization = comparator
            .optimize_net_salary(StructureKind::Sasu, &input)
            .expect("SASU is supported");

        let at = |salary: Decimal| {
            comparator
                .compute(
                    StructureKind::Sasu,
                    &StructureInput {
                        net_salary: salary,
                        ..input.clone()
                    },
                )
                .net_income
        };

        assert!(optimization.net_salary >= Decimal::ZERO);
        assert!(optimization.net_salary <= ceiling);
        assert_eq!(optimization.net_salary, optimization.net_salary.floor());
        assert_eq!(optimization.result.net_salary, optimization.net_salary);
        assert!(optimization.result.net_income >= at(ceiling.floor()));
        assert!(optimization.result.net_income >= at(Decimal::ZERO));
        assert!(optimization.iterations < MAX_OPTIMIZER_ITERATIONS);
    }

    #[test]
    fn optimizer_with_nothing_to_pay_returns_zero_salary() {
        let (config, brackets) = fixture();
        let comparator = StructureComparator::new(&config, &brackets);
        let input = StructureInput {
            revenue: dec!(1000),
            expenses: dec!(2000),
            ..StructureInput::default()
        };

        let optimization = comparator
            .optimize_net_salary(StructureKind::Sasu, &input)
            .expect("SASU is supported");

        assert_eq!(optimization.net_salary, Decimal::ZERO);
        assert_eq!(optimization.iterations, 0);
    }

    #[test]
    fn kind_parses_labels_case_insensitively() {
        assert_eq!("sasu".parse::<StructureKind>(), Ok(StructureKind::Sasu));
        assert_eq!("EI".parse::<StructureKind>(), Ok(StructureKind::SoleProprietorship));
        assert!("sarl".parse::<StructureKind>().is_err());
    }

    #[test]
    fn input_reads_flags_from_settings() {
        let mut settings = Settings::new();
        settings.set("company.revenue", dec!(120000));
        settings.set("company.progressive_dividend_tax", false);
        settings.set("company.micro_regime", "off");

        let input = StructureInput::from_settings(&settings);

        assert_eq!(input.revenue, dec!(120000));
        assert_eq!(input.dividend_taxation, DividendTaxation::FlatTax);
        assert!(!input.micro_regime);
        assert!(input.flat_withholding);
    }
}
