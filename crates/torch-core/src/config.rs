//! Controller configuration.

use crate::level::MAX_CONTINUOUS_LEVELS;
use serde::{Deserialize, Serialize};

/// Tuning for [`TorchController`](crate::controller::TorchController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Level used by `on()` when no level has been remembered yet.
    /// `None` means the current maximum level.
    #[serde(default)]
    pub default_level: Option<u32>,

    /// Size of the public scale on continuous-intensity platforms.
    #[serde(default = "default_continuous_levels")]
    pub continuous_levels: u32,

    /// Minimum platform API level for basic on/off control.
    #[serde(default = "default_min_api_level")]
    pub min_api_level: u32,

    /// Minimum platform API level for brightness control.
    #[serde(default = "default_min_brightness_api_level")]
    pub min_brightness_api_level: u32,
}

fn default_continuous_levels() -> u32 {
    MAX_CONTINUOUS_LEVELS
}

fn default_min_api_level() -> u32 {
    23
}

fn default_min_brightness_api_level() -> u32 {
    33
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_level: None,
            continuous_levels: default_continuous_levels(),
            min_api_level: default_min_api_level(),
            min_brightness_api_level: default_min_brightness_api_level(),
        }
    }
}

impl ControllerConfig {
    /// Check semantic constraints that deserialization cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if !(2..=MAX_CONTINUOUS_LEVELS).contains(&self.continuous_levels) {
            return Err(format!(
                "Invalid continuous_levels {}. Must be 2-{}",
                self.continuous_levels, MAX_CONTINUOUS_LEVELS
            ));
        }

        if self.default_level == Some(0) {
            return Err("default_level must be at least 1".to_string());
        }

        if self.min_brightness_api_level < self.min_api_level {
            return Err(format!(
                "min_brightness_api_level {} is below min_api_level {}",
                self.min_brightness_api_level, self.min_api_level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ControllerConfig::default();
        assert_eq!(config.continuous_levels, 10);
        assert_eq!(config.min_api_level, 23);
        assert_eq!(config.min_brightness_api_level, 33);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ControllerConfig = toml::from_str("default_level = 4").unwrap();
        assert_eq!(config.default_level, Some(4));
        assert_eq!(config.continuous_levels, 10);
    }

    #[test]
    fn test_validation() {
        let mut config = ControllerConfig {
            continuous_levels: 20,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("continuous_levels"));

        config.continuous_levels = 10;
        config.default_level = Some(0);
        assert!(config.validate().is_err());

        config.default_level = Some(3);
        config.min_brightness_api_level = 10;
        assert!(config.validate().is_err());
    }
}
