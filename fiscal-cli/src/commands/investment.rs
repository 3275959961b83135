use anyhow::Result;
use serde_json::Value;

use fiscal_core::calculations::ContributionPlan;

use crate::app::Session;

pub fn contributions(session: &mut Session<'_>) -> Result<Value> {
    let plan: ContributionPlan = session.read();
    let projection = plan.project();
    session.record(&plan);

    Ok(serde_json::to_value(&projection)?)
}
