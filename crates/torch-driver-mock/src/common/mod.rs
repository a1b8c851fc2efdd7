//! Building blocks shared by the mock flash unit.
//!
//! - **mode**: how much the mock behaves like real hardware (Instant, Realistic, Chaos)
//! - **timing**: per-call latencies for the realistic modes
//! - **errors**: failure injection
//! - **rng**: seeded randomness for reproducible failures and jitter

pub mod errors;
pub mod mode;
pub mod rng;
pub mod timing;

pub use errors::{ErrorConfig, ErrorScenario};
pub use mode::MockMode;
pub use rng::MockRng;
pub use timing::TimingConfig;
