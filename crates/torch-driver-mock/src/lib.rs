//! Mock flash unit for torch_control
//!
//! Simulated torch hardware for testing without a device. All delays use
//! `tokio::time::sleep`, never `std::thread::sleep`.
//!
//! # Modes
//!
//! - `Instant`: zero delays, deterministic
//! - `Realistic`: ~20ms to resolve the device, ~15ms per torch command
//! - `Chaos`: realistic timing plus up to 10ms of seeded jitter per call
//!
//! # Factory
//!
//! ```rust,ignore
//! use torch_driver_mock::register_all;
//!
//! let registry = AdapterRegistry::new();
//! register_all(&registry);
//! ```

pub mod common;
mod mock_torch;

pub use common::{ErrorConfig, ErrorScenario, MockMode, MockRng, TimingConfig};
pub use mock_torch::{MockCall, MockTorch, MockTorchConfig, MockTorchFactory};

use torch_core::FactoryRegistry;

/// Register the mock factory with an adapter registry.
pub fn register_all(registry: &impl FactoryRegistry) {
    registry.register_factory(Box::new(MockTorchFactory));
}
