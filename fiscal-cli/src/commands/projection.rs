use anyhow::Result;
use serde_json::{Value, json};
use tracing::debug;

use fiscal_core::calculations::{
    FundShareInput, FundShareProjection, RentalInput, RentalProjection,
};

use crate::app::Session;

pub fn rental(session: &mut Session<'_>) -> Result<Value> {
    let input: RentalInput = session.read();
    let projection = RentalProjection::project(&input);
    debug!(
        regime = input.regime.name(),
        years = projection.years.len(),
        "rental projected"
    );
    session.record(&input);

    Ok(json!({
        "regime": input.regime.name(),
        "summary": projection.summary,
        "years": projection.years,
    }))
}

pub fn fund_shares(session: &mut Session<'_>) -> Result<Value> {
    let input: FundShareInput = session.read();
    let projection = FundShareProjection::project(&input);
    debug!(
        years = projection.years.len(),
        segments = projection.segments.len(),
        "fund shares projected"
    );
    session.record(&input);

    Ok(serde_json::to_value(&projection)?)
}
