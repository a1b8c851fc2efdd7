//! `torch-core`
//!
//! Core types and the torch controller for `torch_control`.
//!
//! Exposes a single flashlight (torch) as a small state machine with two observable
//! properties, `is_on` and an integer brightness `level` in `1..=max_level`, on top of
//! platform adapters that represent brightness in incompatible ways.
//!
//! ## Architecture
//!
//! - **[`TorchAdapter`]**: platform facade over the raw primitives (one per platform)
//! - **[`LevelScale`]**: pure mapping between public levels and native values
//! - **[`TorchController`]**: serialized operations and the single reconciliation path
//! - **[`NotificationChannel`]**: single-observer `stateChanged` / `levelChanged` slots
//! - **[`classify`]**: maps every adapter failure to one of six [`ErrorKind`]s
//!
//! ## Example
//!
//! ```rust,ignore
//! use torch_core::{ControllerConfig, TorchController};
//!
//! let controller = TorchController::new(adapter, ControllerConfig::default());
//! controller.subscribe_level_changed(|level| println!("level: {level:?}"));
//! controller.set_level(3).await?;
//! ```

pub mod capabilities;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod level;
pub mod notification;

pub use capabilities::{
    BrightnessModel, DeviceRef, HardwareCallback, HardwareEvent, HardwareReading,
    SubscriptionId, TorchAdapter,
};
pub use config::ControllerConfig;
pub use controller::{TorchController, TorchSnapshot};
pub use driver::{AdapterFactory, FactoryRegistry};
pub use error::{classify, AdapterError, ErrorKind, ErrorRecord, TorchError, TorchResult};
pub use level::{LevelError, LevelScale, NativeLevel, MAX_CONTINUOUS_LEVELS, MIN_INTENSITY};
pub use notification::{NotificationChannel, TorchEvent};
