//! Sysfs driver against a fake LED class directory.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use torch_core::{
    AdapterFactory, ControllerConfig, ErrorKind, NativeLevel, TorchAdapter, TorchController,
};
use torch_driver_sysfs::{SysfsTorch, SysfsTorchFactory};

fn fake_led(max_brightness: u32) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("brightness"), "0\n").unwrap();
    std::fs::write(
        dir.path().join("max_brightness"),
        format!("{max_brightness}\n"),
    )
    .unwrap();
    dir
}

fn brightness(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("brightness")).unwrap()
}

#[tokio::test]
async fn test_reads_hardware_capabilities() {
    let dir = fake_led(15);
    let torch = SysfsTorch::new(dir.path());

    assert!(torch.has_flash());
    assert_eq!(torch.read_max_discrete_strength(), Some(15));
    assert_eq!(torch.read_thermal_ceiling(), None);
}

#[tokio::test]
async fn test_controller_writes_brightness() {
    let dir = fake_led(15);
    let controller = TorchController::new(
        Arc::new(SysfsTorch::new(dir.path())),
        ControllerConfig::default(),
    );

    controller.set_level(7).await.unwrap();
    assert_eq!(brightness(dir.path()), "7");
    assert_eq!(controller.state().await.level, Some(7));

    controller.off().await.unwrap();
    assert_eq!(brightness(dir.path()), "0");
    assert!(!controller.state().await.is_on);
}

#[tokio::test]
async fn test_on_off_only_led() {
    let dir = fake_led(1);
    let controller = TorchController::new(
        Arc::new(SysfsTorch::new(dir.path())),
        ControllerConfig::default(),
    );

    let err = controller.set_level(1).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::BrightnessControlNotSupported));
    assert_eq!(brightness(dir.path()), "0\n");

    controller.on().await.unwrap();
    assert_eq!(brightness(dir.path()), "1");
    assert_eq!(controller.get_max_level(false), None);
}

#[tokio::test]
async fn test_missing_device_is_no_flash() {
    let dir = tempfile::tempdir().unwrap();
    let torch = SysfsTorch::new(dir.path().join("missing"));
    assert!(!torch.has_flash());

    let controller = TorchController::new(Arc::new(torch), ControllerConfig::default());
    let err = controller.on().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NoFlashAvailable));
    assert_eq!(controller.get_max_level(true), None);
}

#[tokio::test]
async fn test_write_reports_applied_value() {
    let dir = fake_led(3);
    let torch = SysfsTorch::new(dir.path());
    let device = torch.resolve_device().await.unwrap();

    let reading = torch.set_discrete_strength(&device, 2).await.unwrap();
    assert!(reading.is_on);
    assert_eq!(reading.level, Some(NativeLevel::Strength(2)));
}

#[tokio::test]
async fn test_factory_builds_driver() {
    let dir = fake_led(5);
    let mut table = toml::map::Map::new();
    table.insert(
        "led_dir".into(),
        toml::Value::String(dir.path().display().to_string()),
    );
    let config = toml::Value::Table(table);

    let factory = SysfsTorchFactory;
    factory.validate(&config).unwrap();
    let adapter = factory.build(config).await.unwrap();
    assert_eq!(adapter.adapter_type(), "sysfs");
    assert_eq!(adapter.read_max_discrete_strength(), Some(5));
}

#[tokio::test]
async fn test_max_brightness_cached_after_resolve() {
    let dir = fake_led(15);
    let torch = SysfsTorch::new(dir.path());
    torch.resolve_device().await.unwrap();

    std::fs::write(dir.path().join("max_brightness"), "3\n").unwrap();
    assert_eq!(torch.read_max_discrete_strength(), Some(15));

    std::fs::remove_file(dir.path().join("max_brightness")).unwrap();
    assert_eq!(torch.read_max_discrete_strength(), Some(15));
    assert!(torch.has_flash());
}

#[tokio::test]
async fn test_removed_device_drops_cache() {
    let dir = fake_led(5);
    let torch = Arc::new(SysfsTorch::new(dir.path()));
    let controller = TorchController::new(torch.clone(), ControllerConfig::default());
    controller.set_level(2).await.unwrap();

    std::fs::remove_dir_all(dir.path()).unwrap();

    let err = controller.set_level(3).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NoFlashAvailable));
    assert!(!torch.has_flash());
    assert_eq!(torch.read_max_discrete_strength(), None);
    assert_eq!(controller.get_max_level(false), None);
}
