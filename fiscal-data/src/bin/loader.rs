use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fiscal_data::BracketLoader;
use fiscal_db_sqlite::SqliteRepository;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Csv,
    Json,
}

/// Load bracket schedules into the settings database.
///
/// CSV files carry `schedule,position,up_to,rate` rows and may hold several
/// schedules. JSON files hold one bracket table (`[{"upTo": .., "rate": ..}]`)
/// and need `--schedule`. Every schedule found is replaced.
#[derive(Parser, Debug)]
#[command(name = "fiscal-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Bracket file to load
    #[arg(short, long)]
    file: PathBuf,

    /// File format; inferred from the extension when omitted
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// Schedule name for a JSON bracket table
    #[arg(long)]
    schedule: Option<String>,

    /// SQLite database path, or `:memory:`
    #[arg(short, long, default_value = "fiscal.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

fn infer_format(path: &Path) -> InputFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
        _ => InputFormat::Csv,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database).await?;

    if args.migrate {
        info!("running migrations");
        repo.run_migrations().await?;
    }

    if let Some(seeds_dir) = &args.seeds {
        info!(dir = %seeds_dir.display(), "running seeds");
        repo.run_seeds(seeds_dir).await?;
    }

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let format = args.format.unwrap_or_else(|| infer_format(&args.file));
    let records = match format {
        InputFormat::Csv => BracketLoader::parse_csv(file),
        InputFormat::Json => {
            let schedule = args
                .schedule
                .as_deref()
                .context("--schedule is required for a JSON bracket table")?;
            BracketLoader::parse_json(file, schedule)
        }
    }
    .with_context(|| format!("Failed to parse: {}", args.file.display()))?;

    info!(records = records.len(), file = %args.file.display(), "parsed bracket file");

    let inserted = BracketLoader::load(&repo, &records)
        .await
        .context("Failed to load brackets into database")?;

    info!(inserted, "bracket schedules loaded");
    Ok(())
}
