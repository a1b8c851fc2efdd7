//! End-to-end: configuration file → registry → controller → command steps.

use std::io::Write;
use torch_control::commands::{self, Command, Outcome};
use torch_control::config::TorchConfig;
use torch_control::registry::AdapterRegistry;
use torch_control::ErrorKind;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_steps_from_config_file() {
    let file = write_config(
        r#"
        [controller]
        default_level = 2

        [adapter]
        driver = "mock"

        [adapter.settings]
        model = "discrete_native"
        max_strength = 6
        "#,
    );

    let config = TorchConfig::load_from(file.path()).unwrap();
    let controller = AdapterRegistry::with_builtin_drivers()
        .build_controller(&config)
        .await
        .unwrap();

    let steps = commands::parse_steps(&["on", "max", "level:5", "toggle", "toggle"]).unwrap();
    let mut outcomes = Vec::new();
    for step in steps {
        outcomes.push(commands::execute(&controller, step).await.unwrap());
    }

    assert_eq!(outcomes[1], Outcome::MaxLevel(Some(6)));
    // The level set before toggling off is restored by toggling on.
    assert_eq!(controller.state().await.level, Some(5));

    controller.dispose().await;
    assert!(!controller.state().await.is_on);
}

#[tokio::test]
async fn test_default_level_used_first() {
    let file = write_config(
        r#"
        [controller]
        default_level = 2

        [adapter.settings]
        model = "discrete_native"
        max_strength = 6
        "#,
    );

    let config = TorchConfig::load_from(file.path()).unwrap();
    let controller = AdapterRegistry::with_builtin_drivers()
        .build_controller(&config)
        .await
        .unwrap();

    commands::execute(&controller, Command::On).await.unwrap();
    assert_eq!(controller.state().await.level, Some(2));
}

#[tokio::test]
async fn test_failure_carries_wire_record() {
    let file = write_config(
        r#"
        [adapter.settings]
        has_flash = false
        "#,
    );

    let config = TorchConfig::load_from(file.path()).unwrap();
    let controller = AdapterRegistry::with_builtin_drivers()
        .build_controller(&config)
        .await
        .unwrap();

    let err = commands::execute(&controller, Command::Toggle)
        .await
        .unwrap_err();
    let record = err.record().unwrap();
    assert_eq!(record.kind(), ErrorKind::NoFlashAvailable);

    let wire: serde_json::Value = serde_json::from_str(&record.to_wire()).unwrap();
    assert_eq!(wire["code"], "NoFlashAvailable");

    assert_eq!(
        commands::execute(&controller, Command::Max { dynamic: true })
            .await
            .unwrap(),
        Outcome::MaxLevel(None)
    );
}
