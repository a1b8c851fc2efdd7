//! Command runner behind `torchctl`.
//!
//! A command line step is one of `on`, `off`, `toggle`, `level:<n>`, `max` or
//! `max:dynamic`. Steps run in order against one controller and stop at the first
//! failure.

use std::str::FromStr;
use thiserror::Error;
use torch_core::{TorchController, TorchResult};
use tracing::debug;

/// A single controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Turn the torch on
    On,
    /// Turn the torch off
    Off,
    /// Invert the power state
    Toggle,
    /// Set the brightness level
    Level(u32),
    /// Query the maximum level
    Max {
        /// Thermal-adjusted maximum instead of the static one
        dynamic: bool,
    },
}

/// Unparseable command step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    /// Not a known command.
    #[error("Unknown command '{0}'. Expected on, off, toggle, level:<n>, max or max:dynamic")]
    Unknown(String),

    /// `level:` without a non-negative integer.
    #[error("Invalid level in '{0}'")]
    InvalidLevel(String),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let step = s.trim().to_lowercase();
        match step.as_str() {
            "on" => return Ok(Command::On),
            "off" => return Ok(Command::Off),
            "toggle" => return Ok(Command::Toggle),
            "max" => return Ok(Command::Max { dynamic: false }),
            "max:dynamic" => return Ok(Command::Max { dynamic: true }),
            _ => {}
        }

        match step.split_once(':') {
            Some(("level", value)) => value
                .parse()
                .map(Command::Level)
                .map_err(|_| CommandParseError::InvalidLevel(s.to_string())),
            _ => Err(CommandParseError::Unknown(s.to_string())),
        }
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation completed; changes arrive through the listeners.
    Done,
    /// Answer to a `max` query (`None` when unsupported).
    MaxLevel(Option<u32>),
}

/// Run one command.
pub async fn execute(controller: &TorchController, command: Command) -> TorchResult<Outcome> {
    debug!(?command, "Executing command");
    match command {
        Command::On => controller.on().await.map(|_| Outcome::Done),
        Command::Off => controller.off().await.map(|_| Outcome::Done),
        Command::Toggle => controller.toggle().await.map(|_| Outcome::Done),
        Command::Level(level) => controller.set_level(level).await.map(|_| Outcome::Done),
        Command::Max { dynamic } => Ok(Outcome::MaxLevel(controller.get_max_level(dynamic))),
    }
}

/// Parse every step up front so a typo never leaves the torch half-driven.
pub fn parse_steps<S: AsRef<str>>(steps: &[S]) -> Result<Vec<Command>, CommandParseError> {
    steps.iter().map(|step| step.as_ref().parse()).collect()
}
