use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::warn;

use fiscal_core::{
    BracketLimit, RepositoryError, SettingValue, Settings, SettingsRepository, TaxBracket,
};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

/// Maps a bare path or `:memory:` to a sqlx URL. Full `sqlite:` URLs pass
/// through unchanged.
pub fn database_url(connection_string: &str) -> String {
    match connection_string.trim() {
        "" | ":memory:" => "sqlite::memory:".to_string(),
        url if url.starts_with("sqlite:") => url.to_string(),
        path => format!("sqlite://{}?mode=rwc", path),
    }
}

impl SqliteRepository {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let url = database_url(connection_string);
        // Each connection to an in-memory database would see its own copy.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Executes every `.sql` file in `seeds_dir`, in file-name order.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_setting(row: &sqlx::sqlite::SqliteRow) -> Result<(String, SettingValue), RepositoryError> {
    let key: String = row.try_get("key").map_err(db_error)?;
    let kind: String = row.try_get("kind").map_err(db_error)?;
    let raw: String = row.try_get("value").map_err(db_error)?;
    let value = SettingValue::from_stored(&kind, &raw).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid {} value '{}' for setting '{}'", kind, raw, key))
    })?;
    Ok((key, value))
}

fn row_to_bracket(row: &sqlx::sqlite::SqliteRow) -> Result<TaxBracket, RepositoryError> {
    let position: i64 = row.try_get("position").map_err(db_error)?;
    let id = u32::try_from(position)
        .map_err(|_| RepositoryError::Database(format!("Invalid bracket position: {}", position)))?;
    let up_to = match get_optional_decimal(row, "up_to")? {
        Some(amount) => BracketLimit::Amount(amount),
        None => BracketLimit::Unbounded,
    };
    Ok(TaxBracket::new(id, up_to, get_decimal(row, "rate")?))
}

fn stored_text(value: &SettingValue) -> String {
    match value {
        SettingValue::Number(number) => decimal_to_text(*number),
        other => other.to_string(),
    }
}

#[async_trait]
impl SettingsRepository for SqliteRepository {
    /// An unknown profile loads as empty settings. Rows that no longer parse
    /// are skipped with a warning.
    async fn load_settings(
        &self,
        profile: &str,
    ) -> Result<Settings, RepositoryError> {
        let rows = sqlx::query("SELECT key, kind, value FROM settings WHERE profile = ? ORDER BY key")
            .bind(profile)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        let mut settings = Settings::new();
        for row in &rows {
            match row_to_setting(row) {
                Ok((key, value)) => settings.set(key, value),
                Err(err) => warn!(profile, error = %err, "skipping stored setting"),
            }
        }
        Ok(settings)
    }

    async fn save_settings(
        &self,
        profile: &str,
        settings: &Settings,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM settings WHERE profile = ?")
            .bind(profile)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for (key, value) in settings.iter() {
            sqlx::query("INSERT INTO settings (profile, key, kind, value) VALUES (?, ?, ?, ?)")
                .bind(profile)
                .bind(key)
                .bind(value.kind())
                .bind(stored_text(value))
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn get_setting(
        &self,
        profile: &str,
        key: &str,
    ) -> Result<SettingValue, RepositoryError> {
        let row = sqlx::query("SELECT key, kind, value FROM settings WHERE profile = ? AND key = ?")
            .bind(profile)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_setting(&row).map(|(_, value)| value)
    }

    async fn delete_setting(
        &self,
        profile: &str,
        key: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM settings WHERE profile = ? AND key = ?")
            .bind(profile)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT DISTINCT profile FROM settings ORDER BY profile")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| row.try_get("profile").map_err(db_error))
            .collect()
    }

    async fn get_tax_brackets(
        &self,
        schedule: &str,
    ) -> Result<Vec<TaxBracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT position, up_to, rate
             FROM tax_brackets
             WHERE schedule = ?
             ORDER BY position",
        )
        .bind(schedule)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_bracket).collect()
    }

    async fn insert_tax_bracket(
        &self,
        schedule: &str,
        position: u32,
        bracket: &TaxBracket,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("INSERT OR IGNORE INTO bracket_schedule (name) VALUES (?)")
            .bind(schedule)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query("INSERT INTO tax_brackets (schedule, position, up_to, rate) VALUES (?, ?, ?, ?)")
            .bind(schedule)
            .bind(i64::from(position))
            .bind(bracket.up_to.amount().map(decimal_to_text))
            .bind(decimal_to_text(bracket.rate))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    /// Removes the schedule with its brackets. Deleting an unknown schedule
    /// is not an error.
    async fn delete_tax_brackets(
        &self,
        schedule: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM tax_brackets WHERE schedule = ?")
            .bind(schedule)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query("DELETE FROM bracket_schedule WHERE name = ?")
            .bind(schedule)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn list_bracket_schedules(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT name FROM bracket_schedule ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| row.try_get("name").map_err(db_error))
            .collect()
    }
}
