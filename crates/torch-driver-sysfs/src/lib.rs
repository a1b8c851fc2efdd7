//! Linux LED class flash driver for torch_control
//!
//! Drives a flash LED through `/sys/class/leds/<name>/brightness`. The hardware
//! maximum comes from `max_brightness`; a maximum of 1 means on/off only.
//!
//! ```toml
//! [adapter]
//! driver = "sysfs"
//!
//! [adapter.settings]
//! led_dir = "/sys/class/leds/flashlight"
//! ```

mod sysfs_torch;

pub use sysfs_torch::{SysfsTorch, SysfsTorchConfig, SysfsTorchFactory};

use torch_core::FactoryRegistry;

/// Register the sysfs factory with an adapter registry.
pub fn register_all(registry: &impl FactoryRegistry) {
    registry.register_factory(Box::new(SysfsTorchFactory));
}
