//! torch_control
//!
//! Application layer over [`torch_core`]: layered configuration, logging setup, the
//! adapter registry, and the `torchctl` command runner.
//!
//! ```rust,no_run
//! use torch_control::{config::TorchConfig, registry::AdapterRegistry};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = TorchConfig::load()?;
//! let controller = AdapterRegistry::with_builtin_drivers()
//!     .build_controller(&config)
//!     .await?;
//!
//! controller.on().await?;
//! controller.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod logging;
pub mod registry;

pub use torch_core::{
    ControllerConfig, ErrorKind, ErrorRecord, TorchController, TorchError, TorchEvent,
    TorchSnapshot,
};
