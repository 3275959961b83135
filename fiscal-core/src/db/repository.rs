use async_trait::async_trait;
use thiserror::Error;

use crate::models::{SettingValue, Settings, TaxBracket};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for named settings profiles and bracket schedules.
///
/// The engine never writes through this trait; callers load a profile,
/// compute, then save the effective settings back.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    // Settings profiles
    async fn load_settings(
        &self,
        profile: &str,
    ) -> Result<Settings, RepositoryError>;

    /// Replaces every entry of `profile` with `settings`.
    async fn save_settings(
        &self,
        profile: &str,
        settings: &Settings,
    ) -> Result<(), RepositoryError>;

    async fn get_setting(
        &self,
        profile: &str,
        key: &str,
    ) -> Result<SettingValue, RepositoryError>;

    async fn delete_setting(
        &self,
        profile: &str,
        key: &str,
    ) -> Result<(), RepositoryError>;

    async fn list_profiles(&self) -> Result<Vec<String>, RepositoryError>;

    // Bracket schedules
    /// Brackets of `schedule` in position order.
    async fn get_tax_brackets(
        &self,
        schedule: &str,
    ) -> Result<Vec<TaxBracket>, RepositoryError>;

    async fn insert_tax_bracket(
        &self,
        schedule: &str,
        position: u32,
        bracket: &TaxBracket,
    ) -> Result<(), RepositoryError>;

    async fn delete_tax_brackets(
        &self,
        schedule: &str,
    ) -> Result<(), RepositoryError>;

    async fn list_bracket_schedules(&self) -> Result<Vec<String>, RepositoryError>;
}
