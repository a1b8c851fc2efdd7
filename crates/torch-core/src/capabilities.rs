//! Capability Adapter
//!
//! Platform facade over the raw torch primitives. One implementation exists per
//! platform (see the `torch-driver-*` crates); the application never calls an
//! adapter directly, only through [`TorchController`](crate::controller::TorchController).
//!
//! # Contract
//!
//! - Reads (`has_flash`, `read_max_discrete_strength`, `read_thermal_ceiling`) are
//!   synchronous and side-effect free.
//! - Mutators are async and return the [`HardwareReading`] that the hardware actually
//!   applied. This is the "synchronous call result" half of reconciliation.
//! - [`TorchAdapter::on_hardware_torch_changed`] is the push half: the adapter invokes
//!   the callback whenever the hardware reports a change, including changes the
//!   controller caused itself. Adapters with no native notification synthesize one
//!   locally after each successful write.
//! - Failures are reported as [`AdapterError`]; the controller classifies them.
//!
//! # Thread Safety
//!
//! - All methods take `&self`; use interior mutability for device state.
//! - The callback may be invoked from any thread, including from inside a mutator.
//!
//! # Example
//!
//! ```rust,ignore
//! struct GpioTorch { pin: Mutex<OutputPin> }
//!
//! #[async_trait]
//! impl TorchAdapter for GpioTorch {
//!     fn adapter_type(&self) -> &'static str { "gpio" }
//!     fn brightness_model(&self) -> BrightnessModel { BrightnessModel::DiscreteNative }
//!     fn has_flash(&self) -> bool { true }
//!     fn read_max_discrete_strength(&self) -> Option<u32> { Some(1) }
//!     // ...
//! }
//! ```

use crate::error::AdapterError;
use crate::level::NativeLevel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Native brightness representation of a platform.
///
/// Detected once from the adapter and used to pick the
/// [`LevelScale`](crate::level::LevelScale) strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrightnessModel {
    /// Intensity in `0.0..=1.0`, possibly throttled by a thermal ceiling.
    Continuous,
    /// Integer hardware strength levels `1..=max`.
    DiscreteNative,
}

/// Resolved reference to the selected flash unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceRef {
    /// Platform identifier (camera id, LED name, ...)
    pub id: String,
}

impl DeviceRef {
    /// Create a device reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Power/brightness pair as reported by the hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardwareReading {
    /// Torch power state
    pub is_on: bool,
    /// Native brightness; platforms may omit it, notably when turning off
    pub level: Option<NativeLevel>,
}

impl HardwareReading {
    /// Torch on at the given native level.
    pub fn on(level: NativeLevel) -> Self {
        Self {
            is_on: true,
            level: Some(level),
        }
    }

    /// Torch off, no level payload.
    pub fn off() -> Self {
        Self {
            is_on: false,
            level: None,
        }
    }
}

/// Out-of-band notification from the hardware.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareEvent {
    /// Torch power and/or level changed.
    TorchChanged(HardwareReading),
    /// The flash unit became unavailable to this process (e.g. camera in use).
    Unavailable {
        /// Platform-provided reason
        message: String,
    },
}

/// Callback registered through [`TorchAdapter::on_hardware_torch_changed`].
pub type HardwareCallback = Arc<dyn Fn(HardwareEvent) + Send + Sync>;

/// Handle for a registered hardware callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Capability: Torch Control
///
/// Platform-specific access to a single flash unit.
#[async_trait]
pub trait TorchAdapter: Send + Sync {
    /// Short identifier of the adapter implementation.
    fn adapter_type(&self) -> &'static str;

    /// Native brightness representation.
    fn brightness_model(&self) -> BrightnessModel;

    /// Platform version, for platforms that gate features on one.
    ///
    /// `None` means the platform is unversioned and every gate passes.
    fn api_level(&self) -> Option<u32> {
        None
    }

    /// Whether a flash unit exists at all.
    fn has_flash(&self) -> bool;

    /// Hardware maximum strength level (`DiscreteNative` platforms).
    ///
    /// `Some(1)` means the unit exists but has no adjustable strength.
    fn read_max_discrete_strength(&self) -> Option<u32>;

    /// Current thermal ceiling in `0.0..=1.0` (`Continuous` platforms).
    fn read_thermal_ceiling(&self) -> Option<f64> {
        None
    }

    /// Locate the flash unit.
    ///
    /// The controller calls this lazily and caches the result until disposal.
    async fn resolve_device(&self) -> Result<DeviceRef, AdapterError>;

    /// Turn the torch on at a continuous intensity.
    async fn set_continuous_intensity(
        &self,
        device: &DeviceRef,
        intensity: f64,
    ) -> Result<HardwareReading, AdapterError>;

    /// Turn the torch on at a discrete strength level.
    async fn set_discrete_strength(
        &self,
        device: &DeviceRef,
        level: u32,
    ) -> Result<HardwareReading, AdapterError>;

    /// Turn the torch off.
    async fn set_torch_off(&self, device: &DeviceRef) -> Result<HardwareReading, AdapterError>;

    /// Register the push notification callback.
    fn on_hardware_torch_changed(
        &self,
        callback: HardwareCallback,
    ) -> Result<SubscriptionId, AdapterError>;

    /// Remove a callback registered with [`Self::on_hardware_torch_changed`].
    fn unsubscribe(&self, id: SubscriptionId);
}
