//! Adapter Factory
//!
//! Drivers implement [`AdapterFactory`] and are registered with the application's
//! adapter registry at startup. The registry picks a factory by
//! [`AdapterFactory::driver_type`] and hands it the driver's TOML settings table.
//!
//! ```rust,ignore
//! pub struct GpioTorchFactory;
//!
//! impl AdapterFactory for GpioTorchFactory {
//!     fn driver_type(&self) -> &'static str { "gpio" }
//!     fn name(&self) -> &'static str { "GPIO Flash LED" }
//!
//!     fn validate(&self, config: &toml::Value) -> anyhow::Result<()> {
//!         let table = config.as_table().ok_or_else(|| anyhow::anyhow!("expected table"))?;
//!         if !table.contains_key("pin") {
//!             anyhow::bail!("missing 'pin' field");
//!         }
//!         Ok(())
//!     }
//!
//!     fn build(&self, config: toml::Value) -> BoxFuture<'static, anyhow::Result<Arc<dyn TorchAdapter>>> {
//!         Box::pin(async move { Ok(Arc::new(GpioTorch::open(&config)?) as Arc<dyn TorchAdapter>) })
//!     }
//! }
//! ```

use crate::capabilities::{BrightnessModel, TorchAdapter};
use anyhow::Result;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Builds a [`TorchAdapter`] from driver-specific configuration.
pub trait AdapterFactory: Send + Sync {
    /// Identifier used in configuration (`adapter.driver`).
    fn driver_type(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Brightness model of the adapters this factory builds, when fixed.
    fn brightness_model(&self) -> Option<BrightnessModel> {
        None
    }

    /// Check the settings table without building anything.
    fn validate(&self, config: &toml::Value) -> Result<()>;

    /// Build the adapter.
    fn build(&self, config: toml::Value) -> BoxFuture<'static, Result<Arc<dyn TorchAdapter>>>;
}

/// Registry that accepts adapter factories.
///
/// Lets driver crates offer a `register_all` helper without depending on the
/// application's registry type.
pub trait FactoryRegistry {
    /// Register a factory, replacing any with the same driver type.
    fn register_factory(&self, factory: Box<dyn AdapterFactory>);
}
