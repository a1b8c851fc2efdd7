//! Adapter Registry
//!
//! Maps configured driver types to [`AdapterFactory`] implementations and builds
//! the [`TorchController`] for the configured adapter.
//!
//! ```rust,ignore
//! let registry = AdapterRegistry::with_builtin_drivers();
//! let controller = registry.build_controller(&config).await?;
//! ```

use crate::config::TorchConfig;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use torch_core::{
    AdapterFactory, BrightnessModel, FactoryRegistry, TorchAdapter, TorchController,
};

/// Failures while turning configuration into a running adapter.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No factory for the requested driver type.
    #[error("No factory registered for driver '{driver}'. Available: {available:?}")]
    UnknownDriver {
        /// Requested driver type
        driver: String,
        /// Registered driver types
        available: Vec<String>,
    },

    /// The driver rejected its settings.
    #[error("Invalid settings for driver '{driver}': {source}")]
    InvalidSettings {
        /// Driver type
        driver: String,
        /// Factory validation error
        source: anyhow::Error,
    },

    /// The driver failed to build.
    #[error("Failed to build driver '{driver}': {source}")]
    BuildFailed {
        /// Driver type
        driver: String,
        /// Factory build error
        source: anyhow::Error,
    },

    /// The configuration itself is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Summary of a registered factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryInfo {
    /// Driver type used in configuration
    pub driver_type: String,
    /// Human-readable name
    pub name: String,
    /// Fixed brightness model, `None` when it depends on the settings
    pub brightness_model: Option<BrightnessModel>,
}

/// Registry of adapter factories keyed by driver type.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: DashMap<String, Box<dyn AdapterFactory>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("factories", &self.list_factories())
            .finish()
    }
}

impl AdapterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the mock and sysfs drivers.
    pub fn with_builtin_drivers() -> Self {
        let registry = Self::new();
        torch_driver_mock::register_all(&registry);
        torch_driver_sysfs::register_all(&registry);
        registry
    }

    /// Register a factory, returning the one it replaced.
    pub fn insert_factory(&self, factory: Box<dyn AdapterFactory>) -> Option<Box<dyn AdapterFactory>> {
        let driver_type = factory.driver_type().to_string();
        tracing::info!(
            driver_type = %driver_type,
            name = %factory.name(),
            "Registering adapter factory"
        );
        self.factories.insert(driver_type, factory)
    }

    /// Whether a factory is registered for `driver_type`.
    pub fn has_factory(&self, driver_type: &str) -> bool {
        self.factories.contains_key(driver_type)
    }

    /// Registered driver types, sorted.
    pub fn list_factories(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .factories
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        types.sort();
        types
    }

    /// Factory details for introspection.
    pub fn factory_info(&self, driver_type: &str) -> Option<FactoryInfo> {
        self.factories.get(driver_type).map(|entry| FactoryInfo {
            driver_type: entry.driver_type().to_string(),
            name: entry.name().to_string(),
            brightness_model: entry.brightness_model(),
        })
    }

    /// Validate the settings and build the adapter for `driver_type`.
    pub async fn build_adapter(
        &self,
        driver_type: &str,
        settings: toml::Value,
    ) -> Result<Arc<dyn TorchAdapter>, RegistryError> {
        // Start the build while holding the entry, await it after releasing.
        let build = {
            let factory = self
                .factories
                .get(driver_type)
                .ok_or_else(|| RegistryError::UnknownDriver {
                    driver: driver_type.to_string(),
                    available: self.list_factories(),
                })?;

            factory
                .validate(&settings)
                .map_err(|source| RegistryError::InvalidSettings {
                    driver: driver_type.to_string(),
                    source,
                })?;

            factory.build(settings)
        };

        let adapter = build.await.map_err(|source| RegistryError::BuildFailed {
            driver: driver_type.to_string(),
            source,
        })?;

        tracing::info!(
            driver_type,
            adapter = adapter.adapter_type(),
            model = ?adapter.brightness_model(),
            "Adapter ready"
        );
        Ok(adapter)
    }

    /// Build the controller described by `config`.
    pub async fn build_controller(
        &self,
        config: &TorchConfig,
    ) -> Result<TorchController, RegistryError> {
        config.validate().map_err(RegistryError::Config)?;

        let adapter = self
            .build_adapter(&config.adapter.driver, config.adapter.settings.clone())
            .await?;

        Ok(TorchController::new(adapter, config.controller.clone()))
    }
}

impl FactoryRegistry for AdapterRegistry {
    fn register_factory(&self, factory: Box<dyn AdapterFactory>) {
        self.insert_factory(factory);
    }
}
