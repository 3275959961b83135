use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Value, json};

use fiscal_core::calculations::{
    InflationHistoryProvider, trailing_average, trailing_averages,
};
use fiscal_data::FileInflationHistory;

#[derive(Debug, Args)]
pub struct InflationArgs {
    /// History file: `region,year,rate` CSV or a saved World Bank JSON export
    #[arg(long)]
    pub file: PathBuf,

    /// ISO3 region code
    #[arg(long, default_value = "FRA")]
    pub region: String,

    /// Window length in years; repeat for several. The standard set otherwise
    #[arg(long = "window")]
    pub windows: Vec<u32>,
}

fn open_history(path: &Path) -> Result<FileInflationHistory> {
    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let history = if is_json {
        FileInflationHistory::from_world_bank_json(file)
    } else {
        FileInflationHistory::from_csv(file)
    };
    history.with_context(|| format!("Failed to parse: {}", path.display()))
}

pub async fn averages(args: &InflationArgs) -> Result<Value> {
    let history = open_history(&args.file)?;
    let observations = history.fetch(&args.region).await?;

    let Some(last_year) = observations.iter().map(|obs| obs.year).max() else {
        bail!("no inflation observations for '{}'", args.region);
    };

    let averages = if args.windows.is_empty() {
        trailing_averages(&observations)
    } else {
        args.windows
            .iter()
            .map(|&window| trailing_average(&observations, window, last_year))
            .collect()
    };

    Ok(json!({
        "region": args.region.to_ascii_uppercase(),
        "last_year": last_year,
        "averages": averages,
    }))
}
