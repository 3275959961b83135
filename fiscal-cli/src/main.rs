use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use fiscal_cli::app::{self, Session};
use fiscal_cli::commands::{self, Command};
use fiscal_cli::output::{self, OutputFormat};
use fiscal_core::db::DbConfig;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// French fiscal simulator.
///
/// Loads a settings profile from the configured database, runs one
/// simulation and prints the result. Values not stored in the profile fall
/// back to the engine defaults.
#[derive(Debug, Parser)]
#[command(name = "fiscal-sim", version, about)]
struct Cli {
    /// Database backend to use.
    #[arg(long, global = true, default_value = "sqlite")]
    backend: String,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `fiscal.db`) or `:memory:`.
    #[arg(long, global = true, default_value = "fiscal.db")]
    db: String,

    /// Settings profile to load.
    #[arg(long, global = true, default_value = "default")]
    profile: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Override a setting for this run, e.g. `-D company.revenue=90000`.
    #[arg(short = 'D', long = "define", global = true, value_parser = app::parse_override)]
    overrides: Vec<(String, String)>,

    /// Save the effective settings of this run to the profile.
    #[arg(long, global = true)]
    save: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info`, or `debug` with `--verbose`.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let db_config = DbConfig {
        backend: cli.backend,
        connection_string: cli.db,
    };

    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let repo = registry.create(&db_config).await?;

    let mut session = Session::open(&*repo, &cli.profile).await?;
    session.apply_overrides(&cli.overrides);

    let persists = cli.command.persists();
    let value = commands::run(cli.command, &mut session).await?;

    if cli.save || persists {
        session.save().await?;
    }

    output::print(cli.format, &value);
    Ok(())
}
