//! Fully amortizing fixed-rate loans.
//!
//! The monthly payment follows the annuity formula
//! `P × r / (1 − (1 + r)^−n)` with `r` the monthly rate and `n` the number of
//! monthly payments. A zero rate degenerates to `P / n`. Borrower insurance
//! is charged on the original principal for the whole term.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fiscal_core::calculations::{LoanAmortizer, LoanParameters};
//!
//! let params = LoanParameters {
//!     principal: dec!(120000),
//!     annual_interest_rate: dec!(0),
//!     annual_insurance_rate: dec!(0.003),
//!     term_years: 10,
//! };
//!
//! assert_eq!(params.monthly_payment(), dec!(1000));
//! assert_eq!(params.monthly_insurance(), dec!(30));
//!
//! let schedule = LoanAmortizer::new(params).schedule();
//! assert_eq!(schedule.len(), 10);
//! assert_eq!(schedule[9].remaining_balance, dec!(0));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{growth_factor, max, safe_div};
use crate::calculations::inflation::InflationAdjuster;
use crate::models::{FromSettings, Settings};

const MONTHS_PER_YEAR: u32 = 12;

/// Terms of a fixed-rate loan. Rates are annual fractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: Decimal,
    pub annual_interest_rate: Decimal,
    pub annual_insurance_rate: Decimal,
    pub term_years: u32,
}

impl LoanParameters {
    pub fn payment_count(&self) -> u32 {
        self.term_years * MONTHS_PER_YEAR
    }

    pub fn monthly_rate(&self) -> Decimal {
        self.annual_interest_rate / Decimal::from(MONTHS_PER_YEAR)
    }

    /// Principal and interest paid each month.
    pub fn monthly_payment(&self) -> Decimal {
        let payments = self.payment_count();
        if payments == 0 || self.principal <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let rate = self.monthly_rate();
        if rate.is_zero() {
            return self.principal / Decimal::from(payments);
        }

        let discount = safe_div(Decimal::ONE, growth_factor(rate, payments));
        safe_div(self.principal * rate, Decimal::ONE - discount)
    }

    /// Insurance premium charged each month on the original principal.
    pub fn monthly_insurance(&self) -> Decimal {
        if self.payment_count() == 0 || self.principal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.principal * self.annual_insurance_rate / Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn monthly_total(&self) -> Decimal {
        self.monthly_payment() + self.monthly_insurance()
    }

    /// Payment plus insurance over a full year of the term.
    pub fn annual_payment(&self) -> Decimal {
        self.monthly_total() * Decimal::from(MONTHS_PER_YEAR)
    }
}

/// One year of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationYearSlice {
    pub year: u32,
    pub interest_paid: Decimal,
    pub principal_paid: Decimal,
    pub insurance_paid: Decimal,
    pub remaining_balance: Decimal,
}

impl AmortizationYearSlice {
    /// Everything paid to the lender during the year.
    pub fn total_paid(&self) -> Decimal {
        self.interest_paid + self.principal_paid + self.insurance_paid
    }
}

/// Builds month-by-month amortization aggregated per year.
#[derive(Debug, Clone)]
pub struct LoanAmortizer {
    params: LoanParameters,
}

impl LoanAmortizer {
    pub fn new(params: LoanParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LoanParameters {
        &self.params
    }

    /// Schedule covering exactly the loan term.
    pub fn schedule(&self) -> Vec<AmortizationYearSlice> {
        self.schedule_for(self.params.term_years)
    }

    /// Schedule covering `years`, which may run past the term. Years after
    /// the term report no payment and a zero balance.
    ///
    /// The last monthly payment of the term repays whatever balance is left,
    /// so the balance lands exactly on zero.
    pub fn schedule_for(
        &self,
        years: u32,
    ) -> Vec<AmortizationYearSlice> {
        let payment = self.params.monthly_payment();
        let insurance = self.params.monthly_insurance();
        let rate = self.params.monthly_rate();
        let last_payment = self.params.payment_count();

        let mut balance = max(self.params.principal, Decimal::ZERO);
        let mut slices = Vec::with_capacity(years as usize);

        for year in 1..=years {
            let mut slice = AmortizationYearSlice {
                year,
                interest_paid: Decimal::ZERO,
                principal_paid: Decimal::ZERO,
                insurance_paid: Decimal::ZERO,
                remaining_balance: Decimal::ZERO,
            };

            if year <= self.params.term_years {
                for month in 1..=MONTHS_PER_YEAR {
                    let payment_number = (year - 1) * MONTHS_PER_YEAR + month;
                    let interest = balance * rate;
                    let principal_portion = if payment_number == last_payment {
                        balance
                    } else {
                        payment - interest
                    };

                    balance -= principal_portion;
                    slice.interest_paid += interest;
                    slice.principal_paid += principal_portion;
                    slice.insurance_paid += insurance;
                }
                slice.remaining_balance = max(balance, Decimal::ZERO);
            }

            slices.push(slice);
        }

        slices
    }

    /// Interest paid over the whole term.
    pub fn total_interest(&self) -> Decimal {
        self.schedule().iter().map(|slice| slice.interest_paid).sum()
    }
}

/// A financed property purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPurchase {
    pub property_price: Decimal,
    pub personal_contribution: Decimal,
    pub annual_interest_rate: Decimal,
    pub annual_insurance_rate: Decimal,
    pub term_years: u32,
    pub inflation_rate: Decimal,
}

impl Default for PropertyPurchase {
    fn default() -> Self {
        Self {
            property_price: Decimal::from(200_000),
            personal_contribution: Decimal::from(20_000),
            annual_interest_rate: Decimal::new(35, 3),
            annual_insurance_rate: Decimal::new(3, 3),
            term_years: 20,
            inflation_rate: Decimal::new(25, 3),
        }
    }
}

impl PropertyPurchase {
    pub fn borrowed(&self) -> Decimal {
        max(self.property_price - self.personal_contribution, Decimal::ZERO)
    }

    pub fn loan(&self) -> LoanParameters {
        LoanParameters {
            principal: self.borrowed(),
            annual_interest_rate: self.annual_interest_rate,
            annual_insurance_rate: self.annual_insurance_rate,
            term_years: self.term_years,
        }
    }
}

impl FromSettings for PropertyPurchase {
    fn from_settings(settings: &Settings) -> Self {
        let d = PropertyPurchase::default();
        Self {
            property_price: settings.amount("loan.property_price", d.property_price),
            personal_contribution: settings
                .amount("loan.personal_contribution", d.personal_contribution),
            annual_interest_rate: settings.rate("loan.interest_rate", d.annual_interest_rate),
            annual_insurance_rate: settings.rate("loan.insurance_rate", d.annual_insurance_rate),
            term_years: settings.years("loan.term_years", d.term_years),
            inflation_rate: settings.signed_rate("loan.inflation_rate", d.inflation_rate),
        }
    }

    fn write_settings(
        &self,
        settings: &mut Settings,
    ) {
        settings.set("loan.property_price", self.property_price);
        settings.set("loan.personal_contribution", self.personal_contribution);
        settings.set("loan.interest_rate", self.annual_interest_rate);
        settings.set("loan.insurance_rate", self.annual_insurance_rate);
        settings.set("loan.term_years", self.term_years);
        settings.set("loan.inflation_rate", self.inflation_rate);
    }
}

/// Cost summary of a financed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub borrowed: Decimal,
    pub monthly_payment: Decimal,
    pub monthly_insurance: Decimal,
    pub monthly_total: Decimal,
    pub yearly_payment: Decimal,
    /// Every loan payment plus the personal contribution.
    pub total_paid: Decimal,
    /// Interest and insurance over the term.
    pub total_interest_paid: Decimal,
    /// Contribution plus each yearly payment discounted to its year.
    pub inflation_adjusted_total: Decimal,
    /// Yearly payment as a fraction of the property price.
    pub share_of_price: Decimal,
    pub schedule: Vec<AmortizationYearSlice>,
}

pub fn summarize_purchase(purchase: &PropertyPurchase) -> LoanSummary {
    let loan = purchase.loan();
    let monthly_total = loan.monthly_total();
    let yearly_payment = loan.annual_payment();
    let loan_payments = monthly_total * Decimal::from(loan.payment_count());
    let total_paid = loan_payments + purchase.personal_contribution;

    let adjuster = InflationAdjuster::new(purchase.inflation_rate);
    let inflation_adjusted_total = purchase.personal_contribution
        + adjuster.progressive_present_value(loan_payments, loan.term_years);

    debug!(
        borrowed = %loan.principal,
        %monthly_total,
        %total_paid,
        "loan summarized"
    );

    LoanSummary {
        borrowed: loan.principal,
        monthly_payment: loan.monthly_payment(),
        monthly_insurance: loan.monthly_insurance(),
        monthly_total,
        yearly_payment,
        total_paid,
        total_interest_paid: total_paid - loan.principal - purchase.personal_contribution,
        inflation_adjusted_total,
        share_of_price: safe_div(yearly_payment, purchase.property_price),
        schedule: LoanAmortizer::new(loan).schedule(),
    }
}
