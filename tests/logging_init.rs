//! Global subscriber installation. Kept in its own test binary because it sets
//! the process-wide default.

use torch_control::config::TorchConfig;
use torch_control::logging::{self, LogSettings, OutputFormat};
use tracing::Level;

#[test]
fn test_second_init_is_noop() {
    let mut config = TorchConfig::default();
    config.application.log_format = OutputFormat::Compact;
    config.application.log_color = false;

    assert!(logging::init_from_config(&config).is_ok());
    assert!(logging::init(&LogSettings::default()).is_ok());
    assert!(logging::init(&LogSettings::quiet(Level::ERROR)).is_ok());

    tracing::info!("still logging after repeated init");
}
