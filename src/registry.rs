//! Lookup of explorer configurations and their datasets.
//!
//! Views receive a [`Registry`] explicitly. Entries are immutable once
//! inserted; lookups hand out cheap `Arc` clones.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::ExplorerConfig;
use crate::dataset::Dataset;
use crate::error::ConfigurationError;

fn lock_err(context: &'static str) -> ConfigurationError {
    ConfigurationError::RegistryUnavailable {
        reason: format!("poisoned lock: {context}"),
    }
}

/// A registered configuration together with its dataset.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub config: Arc<ExplorerConfig>,
    pub dataset: Arc<Dataset>,
}

/// Read access to registered datasets, keyed by configuration id.
pub trait Registry: Send + Sync {
    /// Looks up an entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::UnknownConfig` if nothing is registered
    /// under `config_id`.
    fn get(&self, config_id: &str) -> Result<RegistryEntry, ConfigurationError>;

    /// All registered ids in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::RegistryUnavailable` if the backend
    /// cannot be read.
    fn ids(&self) -> Result<Vec<String>, ConfigurationError>;
}

/// Thread-safe in-memory registry.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    entries: RwLock<BTreeMap<String, RegistryEntry>>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a configuration and its dataset.
    ///
    /// The configuration is checked against the dataset before it is stored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::DuplicateConfig` if the id is taken and
    /// any error of [`ExplorerConfig::validate_against`].
    pub fn insert(
        &self,
        config_id: impl Into<String>,
        config: ExplorerConfig,
        dataset: Dataset,
    ) -> Result<(), ConfigurationError> {
        let config_id = config_id.into();
        config.validate_against(&dataset)?;

        let mut entries = self.entries.write().map_err(|_| lock_err("registry.insert"))?;
        if entries.contains_key(&config_id) {
            return Err(ConfigurationError::DuplicateConfig { config_id });
        }
        debug!(
            config_id = %config_id,
            rows = dataset.len(),
            columns = dataset.columns().len(),
            "registered dataset"
        );
        entries.insert(
            config_id,
            RegistryEntry {
                config: Arc::new(config),
                dataset: Arc::new(dataset),
            },
        );
        Ok(())
    }

    /// Parses a JSON configuration and records, then registers them.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if either part is malformed or they do
    /// not fit together.
    pub fn insert_json(
        &self,
        config_id: impl Into<String>,
        config: &serde_json::Value,
        records: &serde_json::Value,
    ) -> Result<(), ConfigurationError> {
        let config = ExplorerConfig::from_json(config)?;
        let dataset = config.load_dataset(records)?;
        self.insert(config_id, config, dataset)
    }

    /// Number of registered entries.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::RegistryUnavailable` on a poisoned lock.
    pub fn len(&self) -> Result<usize, ConfigurationError> {
        let entries = self.entries.read().map_err(|_| lock_err("registry.len"))?;
        Ok(entries.len())
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::RegistryUnavailable` on a poisoned lock.
    pub fn is_empty(&self) -> Result<bool, ConfigurationError> {
        Ok(self.len()? == 0)
    }
}

impl Registry for InMemoryRegistry {
    fn get(&self, config_id: &str) -> Result<RegistryEntry, ConfigurationError> {
        let entries = self.entries.read().map_err(|_| lock_err("registry.get"))?;
        entries
            .get(config_id)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownConfig {
                config_id: config_id.to_string(),
            })
    }

    fn ids(&self) -> Result<Vec<String>, ConfigurationError> {
        let entries = self.entries.read().map_err(|_| lock_err("registry.ids"))?;
        Ok(entries.keys().cloned().collect())
    }
}
