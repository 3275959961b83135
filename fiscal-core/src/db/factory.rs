use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{RepositoryError, SettingsRepository};

/// Where settings profiles are stored.
///
/// `backend` selects a registered [`RepositoryFactory`]; the factory alone
/// interprets `connection_string`.
///
/// | backend    | connection_string examples          |
/// |------------|-------------------------------------|
/// | `sqlite`   | `fiscal.db`, `:memory:`             |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

impl DbConfig {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: path.into(),
        }
    }
}

/// Opens a [`SettingsRepository`] for one storage backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Connects and prepares the schema before returning.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn SettingsRepository>, RepositoryError>;
}

/// Backend factories keyed by name. Registering a name twice keeps the
/// last factory.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Sorted backend names.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens a repository with the factory named by `config.backend`.
    ///
    /// # Errors
    /// [`RepositoryError::Configuration`] when no such factory is registered,
    /// otherwise whatever the factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn SettingsRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            )));
        };
        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
