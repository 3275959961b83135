use anyhow::Result;
use clap::Args;
use serde_json::Value;

use fiscal_core::calculations::{HouseholdIncome, HouseholdTaxCalculator};
use fiscal_core::{FiscalYearConfig, TaxBracket};

use crate::app::{HOUSEHOLD_BRACKETS_KEY, Session};

#[derive(Debug, Args)]
pub struct TaxArgs {
    /// Bracket schedule stored in the database; the profile's table otherwise
    #[arg(long)]
    pub schedule: Option<String>,
}

pub async fn household(
    args: &TaxArgs,
    session: &mut Session<'_>,
) -> Result<Value> {
    let config: FiscalYearConfig = session.read();
    let income: HouseholdIncome = session.read();
    let brackets = session
        .brackets(args.schedule.as_deref(), HOUSEHOLD_BRACKETS_KEY, TaxBracket::france_2023())
        .await?;

    let result = HouseholdTaxCalculator::new(&config, &brackets).calculate(&income);

    session.record(&config);
    session.record(&income);

    Ok(serde_json::to_value(&result)?)
}
