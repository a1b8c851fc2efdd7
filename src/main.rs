//! CLI Entry Point for torch_control
//!
//! Drives the configured flash unit through the torch controller and prints every
//! `stateChanged` / `levelChanged` event.
//!
//! # Usage
//!
//! ```bash
//! torchctl on
//! torchctl level 3
//! torchctl max --dynamic
//! torchctl run on level:3 toggle
//! torchctl drivers
//! torchctl --config bench.toml toggle
//! ```
//!
//! Failures print the classified error record (`{"code":..,"message":..}`) to stderr
//! and exit non-zero. The controller is always disposed before exit.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use torch_control::commands::{self, Command, Outcome};
use torch_control::config::{TorchConfig, DEFAULT_CONFIG_PATH};
use torch_control::logging;
use torch_control::registry::AdapterRegistry;
use torch_control::{TorchController, TorchError};
use torch_core::BrightnessModel;

#[derive(Parser)]
#[command(name = "torchctl")]
#[command(about = "Control the device flashlight", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn the torch on
    On,
    /// Turn the torch off
    Off,
    /// Invert the power state
    Toggle,
    /// Set the brightness level (1..=max)
    Level {
        /// Target level
        level: u32,
    },
    /// Print the maximum level
    Max {
        /// Thermal-adjusted maximum
        #[arg(long)]
        dynamic: bool,
    },
    /// Run several steps in order, e.g. `run on level:3 toggle`
    Run {
        /// Steps: on, off, toggle, level:<n>, max, max:dynamic
        #[arg(required = true)]
        steps: Vec<String>,
    },
    /// List the registered adapter drivers
    Drivers,
}

impl Commands {
    fn into_steps(self) -> Result<Vec<Command>> {
        Ok(match self {
            Commands::On => vec![Command::On],
            Commands::Off => vec![Command::Off],
            Commands::Toggle => vec![Command::Toggle],
            Commands::Level { level } => vec![Command::Level(level)],
            Commands::Max { dynamic } => vec![Command::Max { dynamic }],
            Commands::Run { steps } => commands::parse_steps(&steps)?,
            Commands::Drivers => Vec::new(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = TorchConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    logging::init_from_config(&config).map_err(anyhow::Error::msg)?;

    let registry = AdapterRegistry::with_builtin_drivers();
    if matches!(cli.command, Commands::Drivers) {
        print_drivers(&registry);
        return Ok(ExitCode::SUCCESS);
    }

    let steps = cli.command.into_steps()?;
    let controller = registry.build_controller(&config).await?;
    print_events(&controller);

    let result = run_steps(&controller, steps).await;
    controller.dispose().await;

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", wire_error(&err));
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_steps(controller: &TorchController, steps: Vec<Command>) -> Result<(), TorchError> {
    for step in steps {
        if let Outcome::MaxLevel(max) = commands::execute(controller, step).await? {
            match max {
                Some(max) => println!("maxLevel: {max}"),
                None => println!("maxLevel: null"),
            }
        }
    }
    Ok(())
}

fn print_drivers(registry: &AdapterRegistry) {
    for info in registry
        .list_factories()
        .iter()
        .filter_map(|driver| registry.factory_info(driver))
    {
        let model = match info.brightness_model {
            Some(BrightnessModel::Continuous) => "continuous",
            Some(BrightnessModel::DiscreteNative) => "discrete",
            None => "per settings",
        };
        println!("{:<8} {:<28} {model}", info.driver_type, info.name);
    }
}

fn print_events(controller: &TorchController) {
    controller.subscribe_state_changed(|is_on| println!("stateChanged: {is_on}"));
    controller.subscribe_level_changed(|level| match level {
        Some(level) => println!("levelChanged: {level}"),
        None => println!("levelChanged: null"),
    });
    controller.subscribe_error(|record| eprintln!("error: {}", record.to_wire()));
}

/// Wire form of a failure. Local argument errors have no classified kind and are
/// reported as `InvalidArgument`.
fn wire_error(err: &TorchError) -> String {
    match err.record() {
        Some(record) => record.to_wire(),
        None => serde_json::json!({
            "code": "InvalidArgument",
            "message": err.to_string(),
        })
        .to_string(),
    }
}
