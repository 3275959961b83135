use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use fiscal_core::db::{DbConfig, RepositoryFactory};
use fiscal_core::{RepositoryError, SettingsRepository};

use crate::repository::SqliteRepository;

/// Directory holding the seed SQL files.
///
/// `FISCAL_DB_SQLITE_SEEDS_DIR` wins, then `./seeds` when it exists, then
/// the crate's own `seeds` directory.
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FISCAL_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// The `"sqlite"` backend.
///
/// ```rust,no_run
/// use fiscal_core::db::RepositoryRegistry;
/// use fiscal_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens `config.connection_string` (a file path, created when missing,
    /// or `:memory:`), migrates it and loads the bracket schedule seeds.
    /// A missing seeds directory only skips seeding.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn SettingsRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        if seeds.is_dir() {
            repo.run_seeds(&seeds)
                .await
                .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        } else {
            warn!(dir = %seeds.display(), "seeds directory not found, bracket schedules not loaded");
        }

        debug!(db = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}
