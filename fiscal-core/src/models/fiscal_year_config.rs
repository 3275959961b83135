use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::settings::{FromSettings, Settings};

/// Tax-year constants shared by the structure comparison and household
/// calculators. `Default` carries the 2025 values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearConfig {
    pub tax_year: i32,

    /// Annual social-security ceiling (PASS).
    pub pass: Decimal,

    /// Computed income tax above which no decote applies.
    pub decote_ceiling: Decimal,
    pub decote_flat_rebate: Decimal,
    pub decote_rate: Decimal,

    /// Health surcharge (CSM) thresholds, as fractions of the PASS.
    pub health_dividend_threshold_ratio: Decimal,
    pub health_salary_threshold_ratio: Decimal,
    pub health_surcharge_rate: Decimal,

    pub professional_expense_deduction: Decimal,
    pub rent_abatement: Decimal,
    pub dividend_abatement: Decimal,
    pub deductible_csg_rate: Decimal,
    pub social_levy_rate: Decimal,
    pub flat_tax_rate: Decimal,

    pub corporate_reduced_rate: Decimal,
    pub corporate_reduced_ceiling: Decimal,
    pub corporate_normal_rate: Decimal,

    /// Employee contributions of an assimilated-employee president, as a
    /// fraction of net salary.
    pub employee_contribution_rate: Decimal,
    /// Employer contributions, as a fraction of gross salary.
    pub employer_contribution_rate: Decimal,
    /// Self-employed manager contributions, as a fraction of net pay.
    pub manager_contribution_rate: Decimal,
    /// Sole proprietor contributions, as a fraction of net pay.
    pub sole_proprietor_contribution_rate: Decimal,

    pub micro_revenue_ceiling: Decimal,
    pub micro_abatement: Decimal,
    /// Flat withholding (versement libératoire) on net pay.
    pub micro_flat_withholding_rate: Decimal,

    /// Share of employee contributions accruing retirement rights.
    pub salaried_retirement_share: Decimal,
    /// Share of self-employed contributions accruing retirement rights.
    pub self_employed_retirement_share: Decimal,
}

impl Default for FiscalYearConfig {
    fn default() -> Self {
        Self {
            tax_year: 2025,
            pass: dec!(47100),
            decote_ceiling: dec!(1964),
            decote_flat_rebate: dec!(889),
            decote_rate: dec!(0.4525),
            health_dividend_threshold_ratio: dec!(0.5),
            health_salary_threshold_ratio: dec!(0.2),
            health_surcharge_rate: dec!(0.065),
            professional_expense_deduction: dec!(0.10),
            rent_abatement: dec!(0.30),
            dividend_abatement: dec!(0.40),
            deductible_csg_rate: dec!(0.068),
            social_levy_rate: dec!(0.172),
            flat_tax_rate: dec!(0.30),
            corporate_reduced_rate: dec!(0.15),
            corporate_reduced_ceiling: dec!(42500),
            corporate_normal_rate: dec!(0.25),
            employee_contribution_rate: dec!(0.28),
            employer_contribution_rate: dec!(0.54),
            manager_contribution_rate: dec!(0.45),
            sole_proprietor_contribution_rate: dec!(0.44),
            micro_revenue_ceiling: dec!(77700),
            micro_abatement: dec!(0.34),
            micro_flat_withholding_rate: dec!(0.022),
            salaried_retirement_share: dec!(0.30),
            self_employed_retirement_share: dec!(0.25),
        }
    }
}

impl FiscalYearConfig {
    /// Dividends above this amount owe the health surcharge.
    pub fn health_dividend_threshold(&self) -> Decimal {
        self.pass * self.health_dividend_threshold_ratio
    }

    /// Net salaries at or above this amount are exempt from the health
    /// surcharge.
    pub fn health_salary_threshold(&self) -> Decimal {
        self.pass * self.health_salary_threshold_ratio
    }
}

impl FromSettings for FiscalYearConfig {
    fn from_settings(settings: &Settings) -> Self {
        let d = FiscalYearConfig::default();
        Self {
            tax_year: settings
                .decimal("fiscal.tax_year", Decimal::from(d.tax_year))
                .trunc()
                .to_i32()
                .unwrap_or(d.tax_year),
            pass: settings.amount("fiscal.pass", d.pass),
            decote_ceiling: settings.amount("fiscal.decote_ceiling", d.decote_ceiling),
            decote_flat_rebate: settings.amount("fiscal.decote_flat_rebate", d.decote_flat_rebate),
            decote_rate: settings.rate("fiscal.decote_rate", d.decote_rate),
            health_dividend_threshold_ratio: settings.amount(
                "fiscal.health_dividend_threshold_ratio",
                d.health_dividend_threshold_ratio,
            ),
            health_salary_threshold_ratio: settings.amount(
                "fiscal.health_salary_threshold_ratio",
                d.health_salary_threshold_ratio,
            ),
            health_surcharge_rate: settings
                .rate("fiscal.health_surcharge_rate", d.health_surcharge_rate),
            professional_expense_deduction: settings.rate(
                "fiscal.professional_expense_deduction",
                d.professional_expense_deduction,
            ),
            rent_abatement: settings.rate("fiscal.rent_abatement", d.rent_abatement),
            dividend_abatement: settings.rate("fiscal.dividend_abatement", d.dividend_abatement),
            deductible_csg_rate: settings.rate("fiscal.deductible_csg_rate", d.deductible_csg_rate),
            social_levy_rate: settings.rate("fiscal.social_levy_rate", d.social_levy_rate),
            flat_tax_rate: settings.rate("fiscal.flat_tax_rate", d.flat_tax_rate),
            corporate_reduced_rate: settings
                .rate("fiscal.corporate_reduced_rate", d.corporate_reduced_rate),
            corporate_reduced_ceiling: settings
                .amount("fiscal.corporate_reduced_ceiling", d.corporate_reduced_ceiling),
            corporate_normal_rate: settings
                .rate("fiscal.corporate_normal_rate", d.corporate_normal_rate),
            employee_contribution_rate: settings
                .rate("fiscal.employee_contribution_rate", d.employee_contribution_rate),
            employer_contribution_rate: settings
                .rate("fiscal.employer_contribution_rate", d.employer_contribution_rate),
            manager_contribution_rate: settings
                .rate("fiscal.manager_contribution_rate", d.manager_contribution_rate),
            sole_proprietor_contribution_rate: settings.rate(
                "fiscal.sole_proprietor_contribution_rate",
                d.sole_proprietor_contribution_rate,
            ),
            micro_revenue_ceiling: settings
                .amount("fiscal.micro_revenue_ceiling", d.micro_revenue_ceiling),
            micro_abatement: settings.rate("fiscal.micro_abatement", d.micro_abatement),
            micro_flat_withholding_rate: settings.rate(
                "fiscal.micro_flat_withholding_rate",
                d.micro_flat_withholding_rate,
            ),
            salaried_retirement_share: settings
                .rate("fiscal.salaried_retirement_share", d.salaried_retirement_share),
            self_employed_retirement_share: settings.rate(
                "fiscal.self_employed_retirement_share",
                d.self_employed_retirement_share,
            ),
        }
    }

    fn write_settings(
        &self,
        settings: &mut Settings,
    ) {
        settings.set("fiscal.tax_year", Decimal::from(self.tax_year));
        settings.set("fiscal.pass", self.pass);
        settings.set("fiscal.decote_ceiling", self.decote_ceiling);
        settings.set("fiscal.decote_flat_rebate", self.decote_flat_rebate);
        settings.set("fiscal.decote_rate", self.decote_rate);
        settings.set("fiscal.health_dividend_threshold_ratio", self.health_dividend_threshold_ratio);
        settings.set("fiscal.health_salary_threshold_ratio", self.health_salary_threshold_ratio);
        settings.set("fiscal.health_surcharge_rate", self.health_surcharge_rate);
        settings.set("fiscal.professional_expense_deduction", self.professional_expense_deduction);
        settings.set("fiscal.rent_abatement", self.rent_abatement);
        settings.set("fiscal.dividend_abatement", self.dividend_abatement);
        settings.set("fiscal.deductible_csg_rate", self.deductible_csg_rate);
        settings.set("fiscal.social_levy_rate", self.social_levy_rate);
        settings.set("fiscal.flat_tax_rate", self.flat_tax_rate);
        settings.set("fiscal.corporate_reduced_rate", self.corporate_reduced_rate);
        settings.set("fiscal.corporate_reduced_ceiling", self.corporate_reduced_ceiling);
        settings.set("fiscal.corporate_normal_rate", self.corporate_normal_rate);
        settings.set("fiscal.employee_contribution_rate", self.employee_contribution_rate);
        settings.set("fiscal.employer_contribution_rate", self.employer_contribution_rate);
        settings.set("fiscal.manager_contribution_rate", self.manager_contribution_rate);
        settings.set(
            "fiscal.sole_proprietor_contribution_rate",
            self.sole_proprietor_contribution_rate,
        );
        settings.set("fiscal.micro_revenue_ceiling", self.micro_revenue_ceiling);
        settings.set("fiscal.micro_abatement", self.micro_abatement);
        settings.set("fiscal.micro_flat_withholding_rate", self.micro_flat_withholding_rate);
        settings.set("fiscal.salaried_retirement_share", self.salaried_retirement_share);
        settings.set(
            "fiscal.self_employed_retirement_share",
            self.self_employed_retirement_share,
        );
    }
}
