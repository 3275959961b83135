//! Rental property projection.
//!
//! Each simulated year:
//!
//! 1. The property is worth `price × (1 + appreciation)^year`.
//! 2. Rent grows from its first-year level; vacancy is taken off.
//! 3. Charges are indexed on inflation when requested.
//! 4. The tax regime taxes rent after its own deductions.
//! 5. The loan is paid while the year is within its term.
//!
//! `cash_flow = income − charges − taxes − loan_payment` accumulates into the
//! cash balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{growth_factor, max, safe_div};
use crate::calculations::inflation::InflationAdjuster;
use crate::calculations::loan::{AmortizationYearSlice, LoanAmortizer, LoanParameters};
use crate::calculations::projection::ProjectionYearSnapshot;
use crate::calculations::projection::regime::{
    Deductibles, FlatRegime, RealRegime, SimplifiedRegime, TaxRegime, TaxRegimeStrategy,
};
use crate::models::{FromSettings, Settings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalInput {
    pub property_price: Decimal,
    pub furnishing: Decimal,
    pub personal_contribution: Decimal,
    pub loan_interest_rate: Decimal,
    pub loan_insurance_rate: Decimal,
    pub loan_term_years: u32,
    /// Bank fees paid at signing, deductible in the first year.
    pub loan_fees: Decimal,
    pub monthly_rent: Decimal,
    pub rent_growth_rate: Decimal,
    /// Share of the year the property stays empty.
    pub vacancy_rate: Decimal,
    /// Property tax, maintenance and management for the first year.
    pub annual_charges: Decimal,
    pub charges_follow_inflation: bool,
    pub appreciation_rate: Decimal,
    pub inflation_rate: Decimal,
    pub simulation_years: u32,
    pub regime: TaxRegime,
    /// Zero disables amortization of the building.
    pub asset_amortization_years: u32,
    pub furnishing_amortization_years: u32,
}

impl Default for RentalInput {
    fn default() -> Self {
        Self {
            property_price: Decimal::from(200_000),
            furnishing: Decimal::ZERO,
            personal_contribution: Decimal::from(20_000),
            loan_interest_rate: Decimal::new(35, 3),
            loan_insurance_rate: Decimal::new(3, 3),
            loan_term_years: 20,
            loan_fees: Decimal::ZERO,
            monthly_rent: Decimal::from(900),
            rent_growth_rate: Decimal::new(15, 3),
            vacancy_rate: Decimal::new(5, 2),
            annual_charges: Decimal::from(2_000),
            charges_follow_inflation: true,
            appreciation_rate: Decimal::new(2, 2),
            inflation_rate: Decimal::new(25, 3),
            simulation_years: 25,
            regime: TaxRegime::Flat(FlatRegime {
                rate: Decimal::new(30, 2),
            }),
            asset_amortization_years: 30,
            furnishing_amortization_years: 7,
        }
    }
}

impl RentalInput {
    pub fn loan(&self) -> LoanParameters {
        LoanParameters {
            principal: max(
                self.property_price + self.furnishing - self.personal_contribution,
                Decimal::ZERO,
            ),
            annual_interest_rate: self.loan_interest_rate,
            annual_insurance_rate: self.loan_insurance_rate,
            term_years: self.loan_term_years,
        }
    }

    /// Rent collected in year one, before vacancy.
    pub fn annual_rent(&self) -> Decimal {
        self.monthly_rent * Decimal::from(12)
    }
}

fn regime_from_settings(
    settings: &Settings,
    default: TaxRegime,
) -> TaxRegime {
    let rate = settings.rate("rental.tax_rate", Decimal::new(30, 2));
    match settings.text("rental.regime", default.name()).as_str() {
        "real" => TaxRegime::Real(RealRegime { rate }),
        "simplified" => TaxRegime::Simplified(SimplifiedRegime {
            abatement: settings.rate("rental.simplified_abatement", Decimal::new(30, 2)),
            rate,
        }),
        "flat" => TaxRegime::Flat(FlatRegime { rate }),
        other => {
            warn!(regime = other, "unknown rental regime, using default");
            default
        }
    }
}

fn write_regime(
    regime: &TaxRegime,
    settings: &mut Settings,
) {
    settings.set("rental.regime", regime.name());
    match regime {
        TaxRegime::Flat(flat) => settings.set("rental.tax_rate", flat.rate),
        TaxRegime::Real(real) => settings.set("rental.tax_rate", real.rate),
        TaxRegime::Simplified(simplified) => {
            settings.set("rental.tax_rate", simplified.rate);
            settings.set("rental.simplified_abatement", simplified.abatement);
        }
    }
}

impl FromSettings for RentalInput {
    fn from_settings(settings: &Settings) -> Self {
        let d = RentalInput::default();
        Self {
            property_price: settings.amount("rental.property_price", d.property_price),
            furnishing: settings.amount("rental.furnishing", d.furnishing),
            personal_contribution: settings
                .amount("rental.personal_contribution", d.personal_contribution),
            loan_interest_rate: settings.rate("rental.loan_interest_rate", d.loan_interest_rate),
            loan_insurance_rate: settings
                .rate("rental.loan_insurance_rate", d.loan_insurance_rate),
            loan_term_years: settings.years("rental.loan_term_years", d.loan_term_years),
            loan_fees: settings.amount("rental.loan_fees", d.loan_fees),
            monthly_rent: settings.amount("rental.monthly_rent", d.monthly_rent),
            rent_growth_rate: settings.signed_rate("rental.rent_growth_rate", d.rent_growth_rate),
            vacancy_rate: settings.rate("rental.vacancy_rate", d.vacancy_rate),
            annual_charges: settings.amount("rental.annual_charges", d.annual_charges),
            charges_follow_inflation: settings
                .flag("rental.charges_follow_inflation", d.charges_follow_inflation),
            appreciation_rate: settings
                .signed_rate("rental.appreciation_rate", d.appreciation_rate),
            inflation_rate: settings.signed_rate("rental.inflation_rate", d.inflation_rate),
            simulation_years: settings.years("rental.simulation_years", d.simulation_years),
            regime: regime_from_settings(settings, d.regime),
            asset_amortization_years: settings
                .years("rental.asset_amortization_years", d.asset_amortization_years),
            furnishing_amortization_years: settings.years(
                "rental.furnishing_amortization_years",
                d.furnishing_amortization_years,
            ),
        }
    }

    fn write_settings(
        &self,
        settings: &mut Settings,
    ) {
        settings.set("rental.property_price", self.property_price);
        settings.set("rental.furnishing", self.furnishing);
        settings.set("rental.personal_contribution", self.personal_contribution);
        settings.set("rental.loan_interest_rate", self.loan_interest_rate);
        settings.set("rental.loan_insurance_rate", self.loan_insurance_rate);
        settings.set("rental.loan_term_years", self.loan_term_years);
        settings.set("rental.loan_fees", self.loan_fees);
        settings.set("rental.monthly_rent", self.monthly_rent);
        settings.set("rental.rent_growth_rate", self.rent_growth_rate);
        settings.set("rental.vacancy_rate", self.vacancy_rate);
        settings.set("rental.annual_charges", self.annual_charges);
        settings.set("rental.charges_follow_inflation", self.charges_follow_inflation);
        settings.set("rental.appreciation_rate", self.appreciation_rate);
        settings.set("rental.inflation_rate", self.inflation_rate);
        settings.set("rental.simulation_years", self.simulation_years);
        write_regime(&self.regime, settings);
        settings.set("rental.asset_amortization_years", self.asset_amortization_years);
        settings.set(
            "rental.furnishing_amortization_years",
            self.furnishing_amortization_years,
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalSummary {
    pub total_income: Decimal,
    pub total_charges: Decimal,
    pub total_taxes: Decimal,
    pub total_loan_payments: Decimal,
    pub final_cash_balance: Decimal,
    pub final_total_value: Decimal,
    pub final_present_value: Decimal,
    /// First-year rent over purchase cost.
    pub gross_yield: Decimal,
    /// First-year rent after vacancy, charges and taxes over purchase cost.
    pub net_yield: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalProjection {
    pub years: Vec<ProjectionYearSnapshot>,
    pub summary: RentalSummary,
}

impl RentalProjection {
    /// Projects with the regime carried by the input.
    pub fn project(input: &RentalInput) -> Self {
        Self::project_with(input, &input.regime)
    }

    /// Projects with any tax regime.
    pub fn project_with(
        input: &RentalInput,
        regime: &dyn TaxRegimeStrategy,
    ) -> Self {
        let inflation = InflationAdjuster::new(input.inflation_rate);
        let loan = input.loan();
        let schedule = LoanAmortizer::new(loan).schedule_for(input.simulation_years);

        let asset_amortization = yearly_share(input.property_price, input.asset_amortization_years);
        let furnishing_amortization =
            yearly_share(input.furnishing, input.furnishing_amortization_years);

        let mut cash_balance = Decimal::ZERO;
        let mut years = Vec::with_capacity(input.simulation_years as usize);

        for (index, slice) in schedule.iter().enumerate() {
            let year = slice.year;
            let elapsed = index as u32;

            let asset_value = input
                .property_price
                .saturating_mul(growth_factor(input.appreciation_rate, year));
            let income = input
                .annual_rent()
                .saturating_mul(growth_factor(input.rent_growth_rate, elapsed))
                * (Decimal::ONE - input.vacancy_rate);
            let charges = if input.charges_follow_inflation {
                inflation.future_value(input.annual_charges, elapsed)
            } else {
                input.annual_charges
            };

            let mut amortization = Decimal::ZERO;
            if year <= input.asset_amortization_years {
                amortization += asset_amortization;
            }
            if year <= input.furnishing_amortization_years {
                amortization += furnishing_amortization;
            }

            let deductibles = Deductibles {
                charges,
                loan_interest: slice.interest_paid,
                loan_insurance: slice.insurance_paid,
                loan_fees: if year == 1 { input.loan_fees } else { Decimal::ZERO },
                amortization,
            };
            let taxable = regime.taxable_income(income, &deductibles);
            let taxes = regime.tax(taxable);
            let loan_payment = loan_payment(slice);

            let cash_flow = income - charges - taxes - loan_payment;
            cash_balance += cash_flow;

            years.push(
                ProjectionYearSnapshot {
                    year,
                    asset_value,
                    income,
                    charges,
                    deductions: regime.deductions(income, &deductibles),
                    taxes,
                    loan_payment,
                    cash_flow,
                    cash_balance,
                    reinvested: Decimal::ZERO,
                    remaining_loan_balance: slice.remaining_balance,
                    total_value: Decimal::ZERO,
                    present_value: Decimal::ZERO,
                }
                .valued(&inflation),
            );
        }

        let summary = summarize(input, &years);
        debug!(
            years = years.len(),
            final_value = %summary.final_total_value,
            "rental projection complete"
        );

        Self { years, summary }
    }
}

fn loan_payment(slice: &AmortizationYearSlice) -> Decimal {
    slice.total_paid()
}

fn yearly_share(
    amount: Decimal,
    years: u32,
) -> Decimal {
    if years == 0 {
        return Decimal::ZERO;
    }
    amount / Decimal::from(years)
}

fn summarize(
    input: &RentalInput,
    years: &[ProjectionYearSnapshot],
) -> RentalSummary {
    let cost = input.property_price + input.furnishing;
    let (final_cash_balance, final_total_value, final_present_value) = years
        .last()
        .map(|last| (last.cash_balance, last.total_value, last.present_value))
        .unwrap_or_default();
    let first_year_net = years
        .first()
        .map(|first| first.income - first.charges - first.taxes)
        .unwrap_or_default();

    RentalSummary {
        total_income: years.iter().map(|y| y.income).sum(),
        total_charges: years.iter().map(|y| y.charges).sum(),
        total_taxes: years.iter().map(|y| y.taxes).sum(),
        total_loan_payments: years.iter().map(|y| y.loan_payment).sum(),
        final_cash_balance,
        final_total_value,
        final_present_value,
        gross_yield: safe_div(input.annual_rent(), cost),
        net_yield: safe_div(first_year_net, cost),
    }
}
