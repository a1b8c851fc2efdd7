//! Flash LED exposed through the Linux LED class.
//!
//! ```text
//! /sys/class/leds/<name>/
//! ├── brightness       # read/write, 0 = off
//! └── max_brightness   # read-only hardware maximum
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use torch_core::{
    AdapterError, AdapterFactory, BrightnessModel, DeviceRef, HardwareCallback, HardwareEvent,
    HardwareReading, NativeLevel, SubscriptionId, TorchAdapter,
};
use tracing::{debug, warn};

const BRIGHTNESS_FILE: &str = "brightness";
const MAX_BRIGHTNESS_FILE: &str = "max_brightness";

/// Configuration for [`SysfsTorch`].
#[derive(Debug, Clone, Deserialize)]
pub struct SysfsTorchConfig {
    /// LED class directory, e.g. `/sys/class/leds/flashlight`
    pub led_dir: PathBuf,
}

/// Factory for [`SysfsTorch`] instances.
pub struct SysfsTorchFactory;

impl AdapterFactory for SysfsTorchFactory {
    fn driver_type(&self) -> &'static str {
        "sysfs"
    }

    fn name(&self) -> &'static str {
        "Linux LED class flash"
    }

    fn brightness_model(&self) -> Option<BrightnessModel> {
        Some(BrightnessModel::DiscreteNative)
    }

    fn validate(&self, config: &toml::Value) -> Result<()> {
        let cfg: SysfsTorchConfig = config.clone().try_into()?;
        if cfg.led_dir.as_os_str().is_empty() {
            return Err(anyhow!("led_dir must not be empty"));
        }
        Ok(())
    }

    fn build(&self, config: toml::Value) -> BoxFuture<'static, Result<Arc<dyn TorchAdapter>>> {
        Box::pin(async move {
            let cfg: SysfsTorchConfig = config.try_into()?;
            Ok(Arc::new(SysfsTorch::new(cfg.led_dir)) as Arc<dyn TorchAdapter>)
        })
    }
}

/// Flash LED driven through sysfs attribute files.
///
/// The kernel offers no change notification for these attributes, so a
/// notification is synthesized after every successful write.
///
/// `max_brightness` is read once, at the latest by `resolve_device`, and cached
/// until a write finds the device gone.
pub struct SysfsTorch {
    led_dir: PathBuf,
    max_brightness: Mutex<Option<u32>>,
    callbacks: Mutex<HashMap<u64, HardwareCallback>>,
    next_subscription: AtomicU64,
}

impl SysfsTorch {
    /// Driver for the LED class directory `led_dir`.
    pub fn new(led_dir: impl Into<PathBuf>) -> Self {
        Self {
            led_dir: led_dir.into(),
            max_brightness: Mutex::new(None),
            callbacks: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// LED class directory.
    pub fn led_dir(&self) -> &Path {
        &self.led_dir
    }

    fn brightness_path(&self) -> PathBuf {
        self.led_dir.join(BRIGHTNESS_FILE)
    }

    fn max_brightness_path(&self) -> PathBuf {
        self.led_dir.join(MAX_BRIGHTNESS_FILE)
    }

    fn cached_max(&self) -> Option<u32> {
        *self.max_brightness.lock()
    }

    fn forget_device(&self) {
        self.max_brightness.lock().take();
    }

    /// Write a raw brightness value and read back what the kernel applied.
    async fn write_brightness(&self, value: u32) -> Result<HardwareReading, AdapterError> {
        let path = self.brightness_path();
        debug!(path = %path.display(), value, "Writing LED brightness");

        if let Err(e) = fs::write(&path, value.to_string()).await {
            let err = map_io(e);
            if matches!(err, AdapterError::NoFlash) {
                self.forget_device();
            }
            return Err(err);
        }

        let applied = match fs::read_to_string(&path).await {
            Ok(raw) => parse_value(&raw).unwrap_or(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read back LED brightness");
                value
            }
        };

        let reading = if applied == 0 {
            HardwareReading::off()
        } else {
            HardwareReading::on(NativeLevel::Strength(applied))
        };

        let callbacks: Vec<HardwareCallback> = self.callbacks.lock().values().cloned().collect();
        for callback in callbacks {
            callback(HardwareEvent::TorchChanged(reading));
        }

        Ok(reading)
    }
}

fn parse_value(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

fn map_io(err: io::Error) -> AdapterError {
    match err.kind() {
        io::ErrorKind::NotFound => AdapterError::NoFlash,
        _ => AdapterError::Io(err),
    }
}

#[async_trait]
impl TorchAdapter for SysfsTorch {
    fn adapter_type(&self) -> &'static str {
        "sysfs"
    }

    fn brightness_model(&self) -> BrightnessModel {
        BrightnessModel::DiscreteNative
    }

    fn has_flash(&self) -> bool {
        self.cached_max().is_some() || self.brightness_path().is_file()
    }

    fn read_max_discrete_strength(&self) -> Option<u32> {
        if let Some(max) = self.cached_max() {
            return Some(max);
        }

        // Cold read before the device is resolved.
        let max = std::fs::read_to_string(self.max_brightness_path())
            .ok()
            .and_then(|raw| parse_value(&raw))?;
        *self.max_brightness.lock() = Some(max);
        Some(max)
    }

    async fn resolve_device(&self) -> Result<DeviceRef, AdapterError> {
        let metadata = fs::metadata(self.brightness_path()).await.map_err(map_io)?;
        if !metadata.is_file() {
            return Err(AdapterError::NoFlash);
        }

        let max = fs::read_to_string(self.max_brightness_path())
            .await
            .map_err(map_io)?;
        let max = parse_value(&max)
            .ok_or_else(|| AdapterError::Access(format!("unreadable max_brightness: {max:?}")))?;
        *self.max_brightness.lock() = Some(max);

        let id = self
            .led_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.led_dir.display().to_string());
        Ok(DeviceRef::new(id))
    }

    async fn set_continuous_intensity(
        &self,
        _device: &DeviceRef,
        _intensity: f64,
    ) -> Result<HardwareReading, AdapterError> {
        Err(AdapterError::Access(
            "LED class devices take integer brightness values".into(),
        ))
    }

    async fn set_discrete_strength(
        &self,
        _device: &DeviceRef,
        level: u32,
    ) -> Result<HardwareReading, AdapterError> {
        if level == 0 {
            return Err(AdapterError::Access("strength 0 would turn the LED off".into()));
        }
        self.write_brightness(level).await
    }

    async fn set_torch_off(&self, _device: &DeviceRef) -> Result<HardwareReading, AdapterError> {
        self.write_brightness(0).await
    }

    fn on_hardware_torch_changed(
        &self,
        callback: HardwareCallback,
    ) -> Result<SubscriptionId, AdapterError> {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.callbacks.lock().insert(id, callback);
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.callbacks.lock().remove(&id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("255\n"), Some(255));
        assert_eq!(parse_value(" 0 "), Some(0));
        assert_eq!(parse_value("on"), None);
    }

    #[test]
    fn test_map_io() {
        assert!(matches!(
            map_io(io::Error::from(io::ErrorKind::NotFound)),
            AdapterError::NoFlash
        ));
        assert!(matches!(
            map_io(io::Error::from(io::ErrorKind::PermissionDenied)),
            AdapterError::Io(_)
        ));
    }

    #[test]
    fn test_factory_validation() {
        let factory = SysfsTorchFactory;
        let ok: toml::Value = toml::from_str("led_dir = \"/sys/class/leds/flash\"").unwrap();
        assert!(factory.validate(&ok).is_ok());

        let missing: toml::Value = toml::from_str("other = 1").unwrap();
        assert!(factory.validate(&missing).is_err());

        let empty: toml::Value = toml::from_str("led_dir = \"\"").unwrap();
        assert!(factory.validate(&empty).is_err());
    }
}
