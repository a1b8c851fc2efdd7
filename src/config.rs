//! Configuration System using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. `config/torch.toml`
//! 3. Environment variables prefixed with `TORCH_`, nested with `__`
//!
//! # Example
//! ```no_run
//! use torch_control::config::TorchConfig;
//!
//! let config = TorchConfig::load()?;
//! println!("Adapter: {}", config.adapter.driver);
//! # Ok::<(), figment::Error>(())
//! ```
//!
//! `TORCH_CONTROLLER__DEFAULT_LEVEL=3` overrides `controller.default_level`.

use crate::logging::OutputFormat;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use torch_core::ControllerConfig;

/// Default configuration file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/torch.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TorchConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Torch controller tuning
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Which adapter to build and how
    #[serde(default)]
    pub adapter: AdapterConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: OutputFormat,
    /// Log each controller operation span as it closes, with its duration
    #[serde(default)]
    pub log_spans: bool,
    /// Include file and line numbers in log lines
    #[serde(default)]
    pub log_source_locations: bool,
    /// ANSI colors for the pretty format
    #[serde(default = "default_true")]
    pub log_color: bool,
}

/// Adapter selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Registered driver type (`mock`, `sysfs`)
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Driver-specific settings, handed to the driver factory as-is
    #[serde(default = "empty_table")]
    pub settings: toml::Value,
}

fn default_name() -> String {
    "torchctl".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_driver() -> String {
    "mock".to_string()
}

fn empty_table() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: OutputFormat::default(),
            log_spans: false,
            log_source_locations: false,
            log_color: true,
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            settings: empty_table(),
        }
    }
}

impl TorchConfig {
    /// Load configuration from `config/torch.toml` and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    /// The layered provider stack, exposed for callers that merge more sources.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(TorchConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TORCH_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.adapter.driver.trim().is_empty() {
            return Err("adapter.driver must not be empty".to_string());
        }

        if !self.adapter.settings.is_table() {
            return Err("adapter.settings must be a table".to_string());
        }

        self.controller.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = TorchConfig::load_from("missing.toml")?;
            assert_eq!(config.application.log_level, "info");
            assert_eq!(config.adapter.driver, "mock");
            assert_eq!(config.controller, ControllerConfig::default());
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "torch.toml",
                r#"
                [application]
                name = "bench"
                log_format = "json"
                log_spans = true

                [controller]
                default_level = 2

                [adapter]
                driver = "sysfs"

                [adapter.settings]
                led_dir = "/sys/class/leds/flash"
                "#,
            )?;
            jail.set_env("TORCH_CONTROLLER__DEFAULT_LEVEL", "4");
            jail.set_env("TORCH_APPLICATION__LOG_LEVEL", "debug");

            let config = TorchConfig::load_from("torch.toml")?;
            assert_eq!(config.application.name, "bench");
            assert_eq!(config.application.log_format, OutputFormat::Json);
            assert!(config.application.log_spans);
            assert!(config.application.log_color);
            assert_eq!(config.application.log_level, "debug");
            assert_eq!(config.controller.default_level, Some(4));
            assert_eq!(config.controller.continuous_levels, 10);
            assert_eq!(config.adapter.driver, "sysfs");
            assert_eq!(
                config.adapter.settings.get("led_dir").and_then(|v| v.as_str()),
                Some("/sys/class/leds/flash")
            );
            Ok(())
        });
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = TorchConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(config.validate().unwrap_err().contains("log_level"));
    }

    #[test]
    fn test_controller_rules_apply() {
        let mut config = TorchConfig::default();
        config.controller.continuous_levels = 1;
        assert!(config.validate().is_err());

        config.controller.continuous_levels = 10;
        config.controller.default_level = Some(0);
        assert!(config.validate().is_err());
    }
}
