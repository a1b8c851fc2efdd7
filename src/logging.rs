//! Log output for `torchctl` and embedders.
//!
//! Controller operations run inside `tracing` spans and hardware calls log at
//! `debug`, so `RUST_LOG=torch_core=debug` shows every adapter call. `RUST_LOG`
//! always wins over the configured level.
//!
//! # Example
//! ```no_run
//! use torch_control::{config::TorchConfig, logging};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TorchConfig::load()?;
//! logging::init_from_config(&config)?;
//! tracing::info!("torchctl started");
//! # Ok(())
//! # }
//! ```

use crate::config::TorchConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer,
};

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Multi-line, colored
    #[default]
    Pretty,
    /// Single line per event
    Compact,
    /// One JSON object per event
    Json,
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level used when `RUST_LOG` is unset
    pub level: Level,
    /// Line layout
    pub format: OutputFormat,
    /// Log the close of every controller operation span, with its duration.
    pub trace_operations: bool,
    /// Include file and line numbers
    pub source_locations: bool,
    /// Colors, Pretty only.
    pub color: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::default(),
            trace_operations: false,
            source_locations: false,
            color: true,
        }
    }
}

impl LogSettings {
    /// Settings from the `[application]` section.
    pub fn from_config(config: &TorchConfig) -> Result<Self, String> {
        let app = &config.application;
        Ok(Self {
            level: parse_log_level(&app.log_level)?,
            format: app.log_format,
            trace_operations: app.log_spans,
            source_locations: app.log_source_locations,
            color: app.log_color,
        })
    }

    /// Compact, uncolored settings at `level`.
    pub fn quiet(level: Level) -> Self {
        Self {
            level,
            format: OutputFormat::Compact,
            color: false,
            ..Self::default()
        }
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let spans = if self.trace_operations {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(spans)
            .with_file(self.source_locations)
            .with_line_number(self.source_locations);

        match self.format {
            OutputFormat::Pretty => base.pretty().with_ansi(self.color).boxed(),
            OutputFormat::Compact => base.compact().with_ansi(false).boxed(),
            OutputFormat::Json => base.json().with_ansi(false).boxed(),
        }
    }
}

/// Install the global subscriber described by the application config.
pub fn init_from_config(config: &TorchConfig) -> Result<(), String> {
    init(&LogSettings::from_config(config)?)
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(settings: &LogSettings) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str().to_lowercase()));

    tracing_subscriber::registry()
        .with(settings.fmt_layer().with_filter(filter))
        .try_init()
        .or_else(already_installed)
}

fn already_installed(err: TryInitError) -> Result<(), String> {
    if err
        .to_string()
        .contains("a global default trace dispatcher has already been set")
    {
        Ok(())
    } else {
        Err(format!("Failed to initialize logging: {err}"))
    }
}

/// Case-insensitive `trace`..`error`.
pub fn parse_log_level(level: &str) -> Result<Level, String> {
    Level::from_str(level.trim()).map_err(|_| {
        format!("Invalid log level '{level}'. Must be one of: trace, debug, info, warn, error")
    })
}
