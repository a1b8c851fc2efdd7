//! Hardware-like latencies for the timed mock modes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-call latencies in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Time to open the camera/LED device
    #[serde(default)]
    pub resolve_ms: u64,
    /// Time for a torch mode or strength change to take effect
    #[serde(default)]
    pub command_ms: u64,
    /// Upper bound of random extra delay added in Chaos mode
    #[serde(default)]
    pub jitter_ms: u64,
}

impl TimingConfig {
    /// Latencies in the range seen on phone camera services.
    pub fn torch() -> Self {
        Self {
            resolve_ms: 20,
            command_ms: 15,
            jitter_ms: 10,
        }
    }

    /// Resolve latency as a [`Duration`].
    pub fn resolve(&self) -> Duration {
        Duration::from_millis(self.resolve_ms)
    }

    /// Command latency as a [`Duration`].
    pub fn command(&self) -> Duration {
        Duration::from_millis(self.command_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing_is_zero() {
        let config = TimingConfig::default();
        assert_eq!(config.resolve(), Duration::ZERO);
        assert_eq!(config.command(), Duration::ZERO);
        assert_eq!(config.jitter_ms, 0);
    }

    #[test]
    fn test_torch_timing() {
        let config = TimingConfig::torch();
        assert_eq!(config.command(), Duration::from_millis(15));
        assert_eq!(config.resolve(), Duration::from_millis(20));
    }
}
