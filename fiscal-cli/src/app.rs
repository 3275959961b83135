use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use fiscal_core::db::RepositoryRegistry;
use fiscal_core::{FromSettings, SettingValue, Settings, SettingsRepository, TaxBracket};
use fiscal_db_sqlite::SqliteRepositoryFactory;

/// Bracket table used by the structure comparison and the salary optimizer.
pub const STRUCTURE_BRACKETS_KEY: &str = "fiscal.brackets";

/// Bracket table used by the household income tax.
pub const HOUSEHOLD_BRACKETS_KEY: &str = "household.brackets";

/// Registry with every backend compiled into the binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Reads a command-line value as a number, then a flag, then free text.
pub fn parse_setting_value(raw: &str) -> SettingValue {
    SettingValue::from_stored("number", raw)
        .or_else(|| SettingValue::from_stored("flag", raw))
        .unwrap_or_else(|| SettingValue::Text(raw.to_string()))
}

/// Splits a `KEY=VALUE` override. Used as a clap value parser.
pub fn parse_override(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// A settings profile loaded for one command.
///
/// Commands read their inputs from the snapshot and record the effective
/// values back; nothing reaches the repository until [`Session::save`].
pub struct Session<'a> {
    repo: &'a dyn SettingsRepository,
    profile: String,
    settings: Settings,
}

impl<'a> Session<'a> {
    pub async fn open(
        repo: &'a dyn SettingsRepository,
        profile: &str,
    ) -> Result<Self> {
        let settings = repo
            .load_settings(profile)
            .await
            .with_context(|| format!("Failed to load profile '{profile}'"))?;
        debug!(profile, entries = settings.len(), "profile loaded");

        Ok(Self {
            repo,
            profile: profile.to_string(),
            settings,
        })
    }

    pub fn repo(&self) -> &'a dyn SettingsRepository {
        self.repo
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn apply_overrides(
        &mut self,
        overrides: &[(String, String)],
    ) {
        for (key, raw) in overrides {
            let value = parse_setting_value(raw);
            debug!(key = %key, %value, "override");
            self.settings.set(key.as_str(), value);
        }
    }

    pub fn read<T: FromSettings>(&self) -> T {
        T::from_settings(&self.settings)
    }

    /// Writes the effective values of `input` into the snapshot.
    pub fn record<T: FromSettings>(
        &mut self,
        input: &T,
    ) {
        input.write_settings(&mut self.settings);
    }

    pub fn set(
        &mut self,
        key: &str,
        value: SettingValue,
    ) {
        self.settings.set(key, value);
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<SettingValue> {
        self.settings.remove(key)
    }

    /// Bracket table for a computation.
    ///
    /// A named `schedule` is read from the repository and must exist.
    /// Otherwise the table stored under `key` is used, falling back to
    /// `default`, and is recorded in the snapshot.
    pub async fn brackets(
        &mut self,
        schedule: Option<&str>,
        key: &str,
        default: Vec<TaxBracket>,
    ) -> Result<Vec<TaxBracket>> {
        match schedule {
            Some(name) => {
                let brackets = self
                    .repo
                    .get_tax_brackets(name)
                    .await
                    .with_context(|| format!("Failed to read bracket schedule '{name}'"))?;
                if brackets.is_empty() {
                    bail!("unknown bracket schedule '{name}'");
                }
                debug!(schedule = name, brackets = brackets.len(), "bracket schedule loaded");
                Ok(brackets)
            }
            None => {
                let brackets = self.settings.tax_brackets(key, default);
                self.settings.set_tax_brackets(key, &brackets);
                Ok(brackets)
            }
        }
    }

    pub async fn save(&self) -> Result<()> {
        self.repo
            .save_settings(&self.profile, &self.settings)
            .await
            .with_context(|| format!("Failed to save profile '{}'", self.profile))?;
        info!(profile = %self.profile, entries = self.settings.len(), "profile saved");
        Ok(())
    }
}
