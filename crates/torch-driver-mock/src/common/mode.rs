//! Operational modes for the mock flash unit.

use serde::{Deserialize, Serialize};

/// How closely the mock imitates a real flash unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockMode {
    /// No delays. Deterministic; use in unit tests.
    #[default]
    Instant,
    /// Every call waits for the configured [`TimingConfig`](super::TimingConfig).
    Realistic,
    /// Realistic timing plus random jitter, so concurrent callers interleave.
    Chaos,
}

impl MockMode {
    /// Whether calls should sleep at all.
    pub fn is_timed(&self) -> bool {
        !matches!(self, MockMode::Instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode() {
        assert_eq!(MockMode::default(), MockMode::Instant);
        assert!(!MockMode::Instant.is_timed());
        assert!(MockMode::Chaos.is_timed());
    }

    #[test]
    fn test_mode_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: MockMode,
        }
        let parsed: Wrapper = toml::from_str("mode = \"realistic\"").unwrap();
        assert_eq!(parsed.mode, MockMode::Realistic);
    }
}
