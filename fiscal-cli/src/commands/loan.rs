use anyhow::Result;
use serde_json::Value;

use fiscal_core::calculations::{PropertyPurchase, summarize_purchase};

use crate::app::Session;

pub fn summary(session: &mut Session<'_>) -> Result<Value> {
    let purchase: PropertyPurchase = session.read();
    let summary = summarize_purchase(&purchase);
    session.record(&purchase);

    Ok(serde_json::to_value(&summary)?)
}
