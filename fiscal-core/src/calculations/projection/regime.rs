//! Tax regimes applied to yearly projection income.
//!
//! A regime turns the year's gross income and deductible amounts into a
//! taxable base, then a tax. Projections take any [`TaxRegimeStrategy`];
//! [`TaxRegime`] is the serializable choice read from settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::max;

/// Amounts a regime may deduct from gross income for one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deductibles {
    pub charges: Decimal,
    pub loan_interest: Decimal,
    pub loan_insurance: Decimal,
    pub loan_fees: Decimal,
    /// Accounting amortization of the asset and furnishings.
    pub amortization: Decimal,
}

impl Deductibles {
    pub fn total(&self) -> Decimal {
        self.charges + self.loan_interest + self.loan_insurance + self.loan_fees + self.amortization
    }
}

pub trait TaxRegimeStrategy {
    fn taxable_income(
        &self,
        gross_income: Decimal,
        deductibles: &Deductibles,
    ) -> Decimal;

    fn tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal;

    /// Deductible amounts this regime actually takes into account.
    fn deductions(
        &self,
        gross_income: Decimal,
        deductibles: &Deductibles,
    ) -> Decimal {
        max(gross_income - self.taxable_income(gross_income, deductibles), Decimal::ZERO)
    }
}

/// Flat percentage of gross income, nothing deducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRegime {
    pub rate: Decimal,
}

impl TaxRegimeStrategy for FlatRegime {
    fn taxable_income(
        &self,
        gross_income: Decimal,
        _deductibles: &Deductibles,
    ) -> Decimal {
        max(gross_income, Decimal::ZERO)
    }

    fn tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        taxable_income * self.rate
    }
}

/// Actual expenses: charges, loan costs and amortization are deducted. A
/// deficit is not carried forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealRegime {
    pub rate: Decimal,
}

impl TaxRegimeStrategy for RealRegime {
    fn taxable_income(
        &self,
        gross_income: Decimal,
        deductibles: &Deductibles,
    ) -> Decimal {
        max(gross_income - deductibles.total(), Decimal::ZERO)
    }

    fn tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        taxable_income * self.rate
    }
}

/// Fixed percentage abatement on gross income in place of actual expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedRegime {
    pub abatement: Decimal,
    pub rate: Decimal,
}

impl TaxRegimeStrategy for SimplifiedRegime {
    fn taxable_income(
        &self,
        gross_income: Decimal,
        _deductibles: &Deductibles,
    ) -> Decimal {
        max(gross_income * (Decimal::ONE - self.abatement), Decimal::ZERO)
    }

    fn tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        taxable_income * self.rate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum TaxRegime {
    Flat(FlatRegime),
    Real(RealRegime),
    Simplified(SimplifiedRegime),
}

impl TaxRegime {
    pub fn name(&self) -> &'static str {
        match self {
            TaxRegime::Flat(_) => "flat",
            TaxRegime::Real(_) => "real",
            TaxRegime::Simplified(_) => "simplified",
        }
    }

    fn strategy(&self) -> &dyn TaxRegimeStrategy {
        match self {
            TaxRegime::Flat(regime) => regime,
            TaxRegime::Real(regime) => regime,
            TaxRegime::Simplified(regime) => regime,
        }
    }
}

impl TaxRegimeStrategy for TaxRegime {
    fn taxable_income(
        &self,
        gross_income: Decimal,
        deductibles: &Deductibles,
    ) -> Decimal {
        self.strategy().taxable_income(gross_income, deductibles)
    }

    fn tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        self.strategy().tax(taxable_income)
    }
}
