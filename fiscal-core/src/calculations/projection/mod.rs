//! Year-by-year simulations of leveraged assets.
//!
//! | Projection | Asset | Income |
//! |------------|-------|--------|
//! | [`RentalProjection`] | a rented property | rent less vacancy |
//! | [`FundShareProjection`] | real-estate fund shares (SCPI), possibly split into bare ownership and usufruct | distributions less fees |
//!
//! Both produce one [`ProjectionYearSnapshot`] per simulated year. Every run
//! starts from fresh working state; nothing is shared between calls.

pub mod fund_shares;
pub mod regime;
pub mod rental;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::inflation::InflationAdjuster;

pub use fund_shares::{
    FundShareInput, FundShareProjection, FundShareSummary, InvestorEntity, OwnershipKind,
    OwnershipSegment, PersonalTaxation, ReinvestmentPolicy,
};
pub use regime::{
    Deductibles, FlatRegime, RealRegime, SimplifiedRegime, TaxRegime, TaxRegimeStrategy,
};
pub use rental::{RentalInput, RentalProjection, RentalSummary};

/// State of a projection at the end of one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionYearSnapshot {
    pub year: u32,
    pub asset_value: Decimal,
    /// Rent or fund distributions before charges.
    pub income: Decimal,
    pub charges: Decimal,
    /// Amounts the tax regime deducted from income.
    pub deductions: Decimal,
    pub taxes: Decimal,
    pub loan_payment: Decimal,
    pub cash_flow: Decimal,
    pub cash_balance: Decimal,
    /// Cash flow moved into new ownership segments this year.
    pub reinvested: Decimal,
    pub remaining_loan_balance: Decimal,
    /// `asset_value + cash_balance - remaining_loan_balance`
    pub total_value: Decimal,
    /// `total_value` discounted to year zero.
    pub present_value: Decimal,
}

impl ProjectionYearSnapshot {
    /// Fills `total_value` and `present_value` from the other fields.
    pub(crate) fn valued(
        mut self,
        inflation: &InflationAdjuster,
    ) -> Self {
        self.total_value = self.asset_value + self.cash_balance - self.remaining_loan_balance;
        self.present_value = inflation.present_value(self.total_value, self.year);
        self
    }
}
