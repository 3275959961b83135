//! Fiscal calculations: progressive income tax, loans, inflation, company
//! structures and multi-year asset projections.
//!
//! Every calculation is a pure function of its inputs; settings are read
//! once through [`crate::models::FromSettings`] before a run.

pub mod common;
pub mod income_tax;
pub mod inflation;
pub mod investment;
pub mod loan;
pub mod projection;
pub mod structures;

pub use income_tax::{
    DecoteParams, HouseholdIncome, HouseholdTaxCalculator, HouseholdTaxResult,
    ProgressiveTaxCalculator, TaxResult, progressive_tax,
};
pub use inflation::{
    InflationAdjuster, InflationHistoryError, InflationHistoryProvider, InflationObservation,
    STANDARD_WINDOWS, TrailingAverage, trailing_average, trailing_averages,
};
pub use investment::{ContributionPlan, ContributionProjection, ContributionYear};
pub use loan::{
    AmortizationYearSlice, LoanAmortizer, LoanParameters, LoanSummary, PropertyPurchase,
    summarize_purchase,
};
pub use projection::{
    FundShareInput, FundShareProjection, FundShareSummary, InvestorEntity, OwnershipKind,
    OwnershipSegment, PersonalTaxation, ProjectionYearSnapshot, ReinvestmentPolicy, RentalInput,
    RentalProjection, RentalSummary, TaxRegime,
};
pub use structures::{
    DividendTaxation, SalaryOptimization, StructureComparator, StructureError, StructureInput,
    StructureKind, StructureResult, best,
};
