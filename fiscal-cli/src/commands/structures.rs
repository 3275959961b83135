use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};
use tracing::info;

use fiscal_core::calculations::{StructureComparator, StructureInput, StructureKind, best};
use fiscal_core::{FiscalYearConfig, TaxBracket};

use crate::app::{STRUCTURE_BRACKETS_KEY, Session};

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Bracket schedule stored in the database; the profile's table otherwise
    #[arg(long)]
    pub schedule: Option<String>,
}

#[derive(Debug, Args)]
pub struct OptimizeArgs {
    /// Structure to optimize (only `sasu` pays a salary)
    #[arg(long, default_value = "sasu")]
    pub kind: StructureKind,

    /// Bracket schedule stored in the database; the profile's table otherwise
    #[arg(long)]
    pub schedule: Option<String>,
}

pub async fn compare(
    args: &CompareArgs,
    session: &mut Session<'_>,
) -> Result<Value> {
    let config: FiscalYearConfig = session.read();
    let input: StructureInput = session.read();
    let brackets = session
        .brackets(args.schedule.as_deref(), STRUCTURE_BRACKETS_KEY, TaxBracket::france_2025())
        .await?;

    let comparator = StructureComparator::new(&config, &brackets);
    let results = comparator.compare(&input);
    let winner = best(&results).map(|result| result.kind.label());
    let max_net_salary = comparator.max_net_salary(&input);

    session.record(&config);
    session.record(&input);

    Ok(json!({
        "best": winner,
        "max_net_salary": max_net_salary,
        "structures": results,
    }))
}

pub async fn optimize(
    args: &OptimizeArgs,
    session: &mut Session<'_>,
) -> Result<Value> {
    let config: FiscalYearConfig = session.read();
    let input: StructureInput = session.read();
    let brackets = session
        .brackets(args.schedule.as_deref(), STRUCTURE_BRACKETS_KEY, TaxBracket::france_2025())
        .await?;

    let optimization =
        StructureComparator::new(&config, &brackets).optimize_net_salary(args.kind, &input)?;
    info!(
        net_salary = %optimization.net_salary,
        net_income = %optimization.result.net_income,
        iterations = optimization.iterations,
        "salary optimized"
    );

    session.record(&config);
    session.record(&StructureInput {
        net_salary: optimization.net_salary,
        ..input
    });

    Ok(serde_json::to_value(&optimization)?)
}
