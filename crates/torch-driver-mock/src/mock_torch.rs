//! Mock flash unit implementation.

use crate::common::{ErrorConfig, MockMode, MockRng, TimingConfig};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use torch_core::{
    AdapterError, AdapterFactory, BrightnessModel, DeviceRef, HardwareCallback, HardwareEvent,
    HardwareReading, NativeLevel, SubscriptionId, TorchAdapter,
};

// =============================================================================
// MockTorchFactory - AdapterFactory implementation
// =============================================================================

/// Configuration for the mock flash unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockTorchConfig {
    /// Native brightness representation (default: continuous)
    #[serde(default = "default_model")]
    pub model: BrightnessModel,

    /// Hardware maximum strength on discrete platforms (default: 5)
    #[serde(default = "default_max_strength")]
    pub max_strength: u32,

    /// Initial thermal ceiling on continuous platforms (default: none)
    #[serde(default)]
    pub thermal_ceiling: Option<f64>,

    /// Whether a flash unit exists (default: true)
    #[serde(default = "default_true")]
    pub has_flash: bool,

    /// Reported platform API level (default: unversioned)
    #[serde(default)]
    pub api_level: Option<u32>,

    /// Echo every successful write through the push callback, like platforms whose
    /// torch callbacks also fire for changes made by this process (default: true)
    #[serde(default = "default_true")]
    pub echo_changes: bool,

    /// Whether the camera service is reachable at start (default: true)
    #[serde(default = "default_true")]
    pub service_available: bool,

    /// Operational mode (default: instant)
    #[serde(default)]
    pub mode: MockMode,

    /// Latencies for timed modes (default: [`TimingConfig::torch`])
    #[serde(default)]
    pub timing: Option<TimingConfig>,

    /// Uniform random failure rate in `0.0..=1.0` (default: 0.0)
    #[serde(default)]
    pub failure_rate: f64,

    /// Seed for failures and jitter
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_model() -> BrightnessModel {
    BrightnessModel::Continuous
}

fn default_max_strength() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for MockTorchConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_strength: default_max_strength(),
            thermal_ceiling: None,
            has_flash: true,
            api_level: None,
            echo_changes: true,
            service_available: true,
            mode: MockMode::default(),
            timing: None,
            failure_rate: 0.0,
            seed: None,
        }
    }
}

impl MockTorchConfig {
    /// Discrete unit with the given hardware maximum.
    pub fn discrete(max_strength: u32) -> Self {
        Self {
            model: BrightnessModel::DiscreteNative,
            max_strength,
            ..Default::default()
        }
    }

    /// Continuous unit with an optional thermal ceiling.
    pub fn continuous(thermal_ceiling: Option<f64>) -> Self {
        Self {
            model: BrightnessModel::Continuous,
            thermal_ceiling,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.model == BrightnessModel::DiscreteNative && self.max_strength == 0 {
            return Err(anyhow!("max_strength must be at least 1"));
        }

        if let Some(ceiling) = self.thermal_ceiling {
            if !(0.0..=1.0).contains(&ceiling) {
                return Err(anyhow!(
                    "thermal_ceiling {ceiling} out of range (0.0-1.0)"
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(anyhow!(
                "failure_rate {} out of range (0.0-1.0)",
                self.failure_rate
            ));
        }

        Ok(())
    }
}

/// Factory for [`MockTorch`] instances.
pub struct MockTorchFactory;

impl AdapterFactory for MockTorchFactory {
    fn driver_type(&self) -> &'static str {
        "mock"
    }

    fn name(&self) -> &'static str {
        "Mock Flash Unit"
    }

    fn validate(&self, config: &toml::Value) -> Result<()> {
        let cfg: MockTorchConfig = config.clone().try_into()?;
        cfg.validate()
    }

    fn build(&self, config: toml::Value) -> BoxFuture<'static, Result<Arc<dyn TorchAdapter>>> {
        Box::pin(async move {
            let cfg: MockTorchConfig = config.try_into()?;
            cfg.validate()?;

            Ok(Arc::new(MockTorch::with_config(cfg)) as Arc<dyn TorchAdapter>)
        })
    }
}

// =============================================================================
// MockTorch - Simulated flash unit
// =============================================================================

/// Hardware call recorded by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `resolve_device`
    ResolveDevice,
    /// `set_continuous_intensity`
    SetIntensity(f64),
    /// `set_discrete_strength`
    SetStrength(u32),
    /// `set_torch_off`
    SetOff,
}

#[derive(Debug)]
struct TorchHardware {
    is_on: bool,
    level: Option<NativeLevel>,
    thermal_ceiling: Option<f64>,
    service_available: bool,
}

/// Simulated flash unit.
///
/// Behaves like either platform family depending on
/// [`MockTorchConfig::model`]:
///
/// - `Continuous`: accepts intensities, clamps them to the current thermal ceiling
/// - `DiscreteNative`: accepts strengths in `1..=max_strength`
///
/// Records every hardware call and the highest number of calls that were ever in
/// flight at once, and can simulate changes made by other applications.
///
/// # Example
///
/// ```rust,ignore
/// let torch = Arc::new(MockTorch::with_config(MockTorchConfig::discrete(5)));
/// let controller = TorchController::new(torch.clone(), ControllerConfig::default());
///
/// controller.set_level(3).await?;
/// assert_eq!(torch.calls().last(), Some(&MockCall::SetStrength(3)));
/// ```
pub struct MockTorch {
    config: MockTorchConfig,
    timing: TimingConfig,
    error_config: ErrorConfig,
    rng: MockRng,
    hardware: Mutex<TorchHardware>,
    calls: Mutex<Vec<MockCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    callbacks: Mutex<HashMap<u64, HardwareCallback>>,
    next_subscription: AtomicU64,
}

/// Tracks one in-flight hardware call.
struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(torch: &'a MockTorch) -> Self {
        let now = torch.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        torch.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self {
            counter: &torch.in_flight,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for MockTorch {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTorch {
    /// Continuous unit with default settings.
    pub fn new() -> Self {
        Self::with_config(MockTorchConfig::default())
    }

    /// Create a mock from configuration.
    pub fn with_config(config: MockTorchConfig) -> Self {
        let timing = match (config.timing, config.mode) {
            (Some(timing), _) => timing,
            (None, MockMode::Instant) => TimingConfig::default(),
            (None, _) => TimingConfig::torch(),
        };

        let error_config = if config.failure_rate > 0.0 {
            ErrorConfig::random_failures_seeded(config.failure_rate, config.seed)
        } else {
            ErrorConfig::none()
        };

        Self {
            hardware: Mutex::new(TorchHardware {
                is_on: false,
                level: None,
                thermal_ceiling: config.thermal_ceiling,
                service_available: config.service_available,
            }),
            rng: MockRng::new(config.seed),
            timing,
            error_config,
            config,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            callbacks: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Replace the failure injection settings.
    pub fn with_error_config(mut self, error_config: ErrorConfig) -> Self {
        self.error_config = error_config;
        self
    }

    /// Replace the latencies used in timed modes.
    pub fn with_timing(mut self, mode: MockMode, timing: TimingConfig) -> Self {
        self.config.mode = mode;
        self.timing = timing;
        self
    }

    /// Configuration in effect.
    pub fn config(&self) -> &MockTorchConfig {
        &self.config
    }

    /// Every hardware call so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Forget the recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Highest number of hardware calls ever in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// What the hardware is doing right now.
    pub fn reading(&self) -> HardwareReading {
        let hw = self.hardware.lock();
        HardwareReading {
            is_on: hw.is_on,
            level: hw.level,
        }
    }

    /// Number of registered push callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Change the thermal ceiling, as a heating device would.
    pub fn set_thermal_ceiling(&self, ceiling: Option<f64>) {
        tracing::debug!(?ceiling, "MockTorch: thermal ceiling changed");
        self.hardware.lock().thermal_ceiling = ceiling;
    }

    /// Simulate another application changing the torch.
    ///
    /// Always notifies subscribers, regardless of `echo_changes`.
    pub fn simulate_external_change(&self, is_on: bool, level: Option<NativeLevel>) {
        let reading = {
            let mut hw = self.hardware.lock();
            hw.is_on = is_on;
            hw.level = if is_on { level } else { None };
            HardwareReading {
                is_on,
                level: hw.level,
            }
        };
        tracing::debug!(?reading, "MockTorch: external change");
        self.emit(HardwareEvent::TorchChanged(reading));
    }

    /// Simulate the camera being claimed by another application.
    ///
    /// The torch goes dark and every call fails until [`Self::restore_service`].
    pub fn simulate_unavailable(&self, message: impl Into<String>) {
        {
            let mut hw = self.hardware.lock();
            hw.service_available = false;
            hw.is_on = false;
            hw.level = None;
        }
        self.emit(HardwareEvent::Unavailable {
            message: message.into(),
        });
    }

    /// Make the camera service reachable again.
    pub fn restore_service(&self) {
        self.hardware.lock().service_available = true;
    }

    fn emit(&self, event: HardwareEvent) {
        let callbacks: Vec<HardwareCallback> = self.callbacks.lock().values().cloned().collect();
        for callback in callbacks {
            callback(event.clone());
        }
    }

    async fn latency(&self, base: std::time::Duration) {
        if !self.config.mode.is_timed() {
            return;
        }
        let jitter = if self.config.mode == MockMode::Chaos {
            self.rng.jitter(self.timing.jitter_ms)
        } else {
            std::time::Duration::ZERO
        };
        sleep(base + jitter).await;
    }

    fn check_service(&self) -> Result<(), AdapterError> {
        if self.hardware.lock().service_available {
            Ok(())
        } else {
            Err(AdapterError::ServiceUnavailable(
                "camera service unavailable".into(),
            ))
        }
    }

    /// Shared body of the three mutators.
    async fn write(
        &self,
        operation: &'static str,
        call: MockCall,
        is_on: bool,
        level: Option<NativeLevel>,
    ) -> Result<HardwareReading, AdapterError> {
        let _in_flight = InFlight::enter(self);
        self.calls.lock().push(call);

        self.latency(self.timing.command()).await;
        self.check_service()?;
        self.error_config.check_operation(operation)?;

        let reading = {
            let mut hw = self.hardware.lock();
            let level = match level {
                Some(NativeLevel::Intensity(value)) => {
                    let ceiling = hw.thermal_ceiling.unwrap_or(1.0).min(1.0);
                    Some(NativeLevel::Intensity(value.min(ceiling)))
                }
                other => other,
            };
            hw.is_on = is_on;
            hw.level = level;
            HardwareReading { is_on, level }
        };

        tracing::debug!(?reading, "MockTorch: applied");

        if self.config.echo_changes {
            self.emit(HardwareEvent::TorchChanged(reading));
        }

        Ok(reading)
    }
}

#[async_trait]
impl TorchAdapter for MockTorch {
    fn adapter_type(&self) -> &'static str {
        "mock"
    }

    fn brightness_model(&self) -> BrightnessModel {
        self.config.model
    }

    fn api_level(&self) -> Option<u32> {
        self.config.api_level
    }

    fn has_flash(&self) -> bool {
        self.config.has_flash
    }

    fn read_max_discrete_strength(&self) -> Option<u32> {
        match self.config.model {
            BrightnessModel::DiscreteNative => Some(self.config.max_strength),
            BrightnessModel::Continuous => None,
        }
    }

    fn read_thermal_ceiling(&self) -> Option<f64> {
        match self.config.model {
            BrightnessModel::Continuous => self.hardware.lock().thermal_ceiling,
            BrightnessModel::DiscreteNative => None,
        }
    }

    async fn resolve_device(&self) -> Result<DeviceRef, AdapterError> {
        let _in_flight = InFlight::enter(self);
        self.calls.lock().push(MockCall::ResolveDevice);

        self.latency(self.timing.resolve()).await;
        self.check_service()?;
        if !self.config.has_flash {
            return Err(AdapterError::NoFlash);
        }
        self.error_config.check_operation("resolve_device")?;

        Ok(DeviceRef::new("mock-torch-0"))
    }

    async fn set_continuous_intensity(
        &self,
        _device: &DeviceRef,
        intensity: f64,
    ) -> Result<HardwareReading, AdapterError> {
        if self.config.model != BrightnessModel::Continuous {
            return Err(AdapterError::Access(
                "continuous intensity not supported by this unit".into(),
            ));
        }
        if !intensity.is_finite() || intensity <= 0.0 || intensity > 1.0 {
            return Err(AdapterError::Access(format!(
                "intensity {intensity} out of range (0.0-1.0]"
            )));
        }

        self.write(
            "set_intensity",
            MockCall::SetIntensity(intensity),
            true,
            Some(NativeLevel::Intensity(intensity)),
        )
        .await
    }

    async fn set_discrete_strength(
        &self,
        _device: &DeviceRef,
        level: u32,
    ) -> Result<HardwareReading, AdapterError> {
        if self.config.model != BrightnessModel::DiscreteNative {
            return Err(AdapterError::Access(
                "discrete strength not supported by this unit".into(),
            ));
        }
        if level < 1 || level > self.config.max_strength {
            return Err(AdapterError::Access(format!(
                "strength {level} out of range (1-{})",
                self.config.max_strength
            )));
        }

        self.write(
            "set_strength",
            MockCall::SetStrength(level),
            true,
            Some(NativeLevel::Strength(level)),
        )
        .await
    }

    async fn set_torch_off(&self, _device: &DeviceRef) -> Result<HardwareReading, AdapterError> {
        self.write("set_off", MockCall::SetOff, false, None).await
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
