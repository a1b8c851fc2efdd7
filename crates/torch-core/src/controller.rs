//! Torch Controller
//!
//! Owns the single authoritative torch state and is the only component that drives
//! the [`TorchAdapter`].
//!
//! # State Machine
//!
//! ```text
//!            on() / set_level(l)
//!    ┌─────┐ ─────────────────────▶ ┌───────────┐
//!    │ Off │                        │ On(level) │ ──┐ set_level(l')
//!    └─────┘ ◀───────────────────── └───────────┘ ◀─┘
//!                   off()
//! ```
//!
//! `toggle()` is `off()` when on and `on()` when off.
//!
//! # Serialization
//!
//! Every mutating operation (`on`, `off`, `toggle`, `set_level`, `dispose`) holds the
//! state lock for its whole duration, including the adapter call. The lock is a
//! `tokio::sync::Mutex`, which grants access in FIFO order, so concurrent callers
//! queue behind each other and at most one hardware call is in flight.
//!
//! # Reconciliation
//!
//! Hardware readings arrive from two places: the return value of an adapter call and
//! the adapter's push callback. Both go through one entry point,
//! `Inner::reconcile`, which updates the authoritative state and decides which
//! notifications to fire:
//!
//! 1. `StateChanged(is_on)` iff the power state differs from the authoritative one.
//! 2. `LevelChanged(level)` iff the level differs from the last notified level. A
//!    reading with `is_on == false` always means `level == None`, even when the
//!    hardware event carries no level.
//!
//! Push events are queued in an inbox and applied between operations: at the start of
//! each operation, right after each adapter call, and by a background task when the
//! controller is idle. The background task takes its turn in the same FIFO queue, so
//! an event is never applied in the middle of an operation.

use crate::capabilities::{
    BrightnessModel, DeviceRef, HardwareEvent, HardwareReading, SubscriptionId, TorchAdapter,
};
use crate::config::ControllerConfig;
use crate::error::{classify, AdapterError, ErrorKind, ErrorRecord, TorchError, TorchResult};
use crate::level::{LevelScale, NativeLevel};
use crate::notification::{NotificationChannel, TorchEvent};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Point-in-time view of the authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorchSnapshot {
    /// Power state
    pub is_on: bool,
    /// Current level; `Some` exactly when `is_on`
    pub level: Option<u32>,
}

#[derive(Debug, Default)]
struct TorchState {
    is_on: bool,
    current_level: Option<u32>,
    /// Level the torch was last on at; reused by `on()`.
    remembered_level: Option<u32>,
    last_notified_level: Option<u32>,
    device: Option<DeviceRef>,
    subscription: Option<SubscriptionId>,
}

/// Queue between the adapter's push callback and the controller.
#[derive(Default)]
struct HardwareInbox {
    pending: Mutex<VecDeque<HardwareEvent>>,
    wake: Notify,
}

impl HardwareInbox {
    fn push(&self, event: HardwareEvent) {
        self.pending.lock().push_back(event);
        self.wake.notify_one();
    }

    fn take(&self) -> Vec<HardwareEvent> {
        self.pending.lock().drain(..).collect()
    }

    fn clear(&self) {
        self.pending.lock().clear();
    }
}

struct Inner {
    adapter: Arc<dyn TorchAdapter>,
    model: BrightnessModel,
    config: ControllerConfig,
    state: AsyncMutex<TorchState>,
    inbox: Arc<HardwareInbox>,
    channel: NotificationChannel,
}

/// Unified torch control surface.
///
/// # Example
///
/// ```rust,ignore
/// let controller = TorchController::new(adapter, ControllerConfig::default());
/// controller.subscribe_state_changed(|on| println!("torch on: {on}"));
///
/// controller.on().await?;
/// controller.set_level(3).await?;
/// controller.off().await?;
/// controller.dispose().await;
/// ```
pub struct TorchController {
    inner: Arc<Inner>,
    reconciler: JoinHandle<()>,
}

impl std::fmt::Debug for TorchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TorchController")
            .field("adapter", &self.inner.adapter.adapter_type())
            .field("model", &self.inner.model)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl TorchController {
    /// Create a controller for the given adapter.
    ///
    /// The brightness strategy is chosen here from the adapter's
    /// [`BrightnessModel`]. Hardware is not touched until the first operation.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime; the idle-time reconciler is
    /// spawned onto it.
    pub fn new(adapter: Arc<dyn TorchAdapter>, config: ControllerConfig) -> Self {
        let model = adapter.brightness_model();
        let inbox = Arc::new(HardwareInbox::default());

        info!(
            adapter = adapter.adapter_type(),
            ?model,
            "Creating torch controller"
        );

        let inner = Arc::new(Inner {
            adapter,
            model,
            config,
            state: AsyncMutex::new(TorchState::default()),
            inbox: inbox.clone(),
            channel: NotificationChannel::new(),
        });

        let reconciler = tokio::spawn(run_reconciler(Arc::downgrade(&inner), inbox));

        Self { inner, reconciler }
    }

    /// The adapter this controller drives.
    pub fn adapter(&self) -> &Arc<dyn TorchAdapter> {
        &self.inner.adapter
    }

    /// The configuration in effect.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Turn the torch on at the remembered level, the configured default, or the
    /// maximum level, in that order. No-op when already on.
    #[instrument(skip(self))]
    pub async fn on(&self) -> TorchResult<()> {
        let mut state = self.inner.lock_state().await;
        self.inner.turn_on(&mut state).await
    }

    /// Turn the torch off.
    ///
    /// The adapter's off primitive is always called, even when the controller
    /// already believes the torch is off, so the hardware is resynchronised after
    /// external control. Notifications fire only if the state actually changes.
    #[instrument(skip(self))]
    pub async fn off(&self) -> TorchResult<()> {
        let mut state = self.inner.lock_state().await;
        self.inner.turn_off(&mut state).await
    }

    /// Invert the power state.
    #[instrument(skip(self))]
    pub async fn toggle(&self) -> TorchResult<()> {
        let mut state = self.inner.lock_state().await;
        if state.is_on {
            self.inner.turn_off(&mut state).await
        } else {
            self.inner.turn_on(&mut state).await
        }
    }

    /// Set the brightness level, turning the torch on if needed.
    ///
    /// Fails without touching the hardware when the unit has no brightness control,
    /// the platform is too old, or `level` is outside `1..=max_level`.
    #[instrument(skip(self))]
    pub async fn set_level(&self, level: u32) -> TorchResult<()> {
        let mut state = self.inner.lock_state().await;
        self.inner.apply_level(&mut state, level).await
    }

    /// Maximum selectable level.
    ///
    /// With `dynamic`, returns the thermal-adjusted maximum
    /// `round(min(ceiling, 1.0) * max_level)`. Returns `None` when there is no flash,
    /// and, for the static query on discrete platforms, when brightness control is
    /// unsupported. Does not wait for in-flight operations.
    pub fn get_max_level(&self, dynamic: bool) -> Option<u32> {
        let scale = self.inner.scale().ok()?;
        if dynamic {
            return Some(scale.dynamic_max_level());
        }

        if self.inner.model == BrightnessModel::DiscreteNative
            && (!scale.supports_brightness()
                || self
                    .inner
                    .check_api_level(self.inner.config.min_brightness_api_level)
                    .is_err())
        {
            return None;
        }

        Some(scale.max_level())
    }

    /// Read the authoritative state, after any queued operations.
    pub async fn state(&self) -> TorchSnapshot {
        let state = self.inner.lock_state().await;
        TorchSnapshot {
            is_on: state.is_on,
            level: state.current_level,
        }
    }

    /// Turn the torch off if it is on, then release the device handle and the
    /// hardware subscription.
    ///
    /// Queued like any other mutating operation. Failures are logged, never
    /// returned; the controller always ends up Off. Safe to call more than once,
    /// and the controller re-resolves the device if used again afterwards.
    #[instrument(skip(self))]
    pub async fn dispose(&self) {
        let mut state = self.inner.lock_state().await;
        self.inner.dispose(&mut state).await;
    }

    /// The notification channel.
    pub fn notifications(&self) -> &NotificationChannel {
        &self.inner.channel
    }

    /// Register the `stateChanged` listener, replacing any previous one.
    pub fn subscribe_state_changed<F>(&self, listener: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.channel.subscribe_state_changed(listener);
    }

    /// Clear the `stateChanged` listener.
    pub fn unsubscribe_state_changed(&self) {
        self.inner.channel.unsubscribe_state_changed();
    }

    /// Register the `levelChanged` listener, replacing any previous one.
    pub fn subscribe_level_changed<F>(&self, listener: F)
    where
        F: Fn(Option<u32>) + Send + Sync + 'static,
    {
        self.inner.channel.subscribe_level_changed(listener);
    }

    /// Clear the `levelChanged` listener.
    pub fn unsubscribe_level_changed(&self) {
        self.inner.channel.unsubscribe_level_changed();
    }

    /// Register the out-of-band error listener, replacing any previous one.
    pub fn subscribe_error<F>(&self, listener: F)
    where
        F: Fn(&ErrorRecord) + Send + Sync + 'static,
    {
        self.inner.channel.subscribe_error(listener);
    }

    /// Clear the error listener.
    pub fn unsubscribe_error(&self) {
        self.inner.channel.unsubscribe_error();
    }
}

impl Drop for TorchController {
    fn drop(&mut self) {
        self.reconciler.abort();
    }
}

/// Applies push events that arrive while no operation is running.
async fn run_reconciler(inner: Weak<Inner>, inbox: Arc<HardwareInbox>) {
    loop {
        inbox.wake.notified().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let mut state = inner.state.lock().await;
        inner.drain_inbox(&mut state);
    }
}

impl Inner {
    /// Take the state lock and apply any pending hardware events.
    async fn lock_state(&self) -> MutexGuard<'_, TorchState> {
        let mut state = self.state.lock().await;
        self.drain_inbox(&mut state);
        state
    }

    fn drain_inbox(&self, state: &mut TorchState) {
        for event in self.inbox.take() {
            match event {
                HardwareEvent::TorchChanged(reading) => {
                    debug!(?reading, "Hardware torch notification");
                    self.reconcile(state, reading, None);
                }
                HardwareEvent::Unavailable { message } => {
                    warn!(%message, "Flash unit became unavailable");
                    let record = ErrorRecord::new(ErrorKind::CameraServiceUnavailable, message);
                    self.reconcile(state, HardwareReading::off(), Some(record));
                }
            }
        }
    }

    /// Single reconciliation entry point for call results and push events.
    fn reconcile(&self, state: &mut TorchState, reading: HardwareReading, error: Option<ErrorRecord>) {
        let level = if reading.is_on {
            let reported = match (reading.level, self.scale()) {
                (Some(native), Ok(scale)) => Some(scale.from_native(native)),
                _ => None,
            };
            Some(
                reported
                    .or(state.current_level)
                    .or(state.remembered_level)
                    .unwrap_or_else(|| self.fallback_level()),
            )
        } else {
            None
        };

        let mut events = Vec::with_capacity(3);

        if reading.is_on != state.is_on {
            info!(is_on = reading.is_on, "Torch state changed");
            events.push(TorchEvent::StateChanged(reading.is_on));
        }

        state.is_on = reading.is_on;
        state.current_level = level;
        if level.is_some() {
            state.remembered_level = level;
        }

        if level != state.last_notified_level {
            debug!(?level, previous = ?state.last_notified_level, "Torch level changed");
            events.push(TorchEvent::LevelChanged(level));
            state.last_notified_level = level;
        }

        if let Some(record) = error {
            events.push(TorchEvent::Error(record));
        }

        self.channel.deliver(&events);
    }

    fn fallback_level(&self) -> u32 {
        self.config
            .default_level
            .or_else(|| self.scale().ok().map(|scale| scale.max_level()))
            .unwrap_or(1)
    }

    /// Level strategy for the current hardware readings.
    fn scale(&self) -> Result<LevelScale, ErrorRecord> {
        if !self.adapter.has_flash() {
            return Err(classify(&AdapterError::NoFlash));
        }

        Ok(match self.model {
            BrightnessModel::Continuous => LevelScale::continuous(
                self.config.continuous_levels,
                self.adapter.read_thermal_ceiling(),
            ),
            BrightnessModel::DiscreteNative => {
                LevelScale::discrete(self.adapter.read_max_discrete_strength().unwrap_or(1))
            }
        })
    }

    fn check_api_level(&self, required: u32) -> Result<(), ErrorRecord> {
        match self.adapter.api_level() {
            Some(actual) if actual < required => {
                Err(classify(&AdapterError::ApiLevelTooLow { actual, required }))
            }
            _ => Ok(()),
        }
    }

    fn fail(&self, err: AdapterError) -> TorchError {
        let record = classify(&err);
        warn!(
            adapter = self.adapter.adapter_type(),
            kind = %record.kind(),
            error = %err,
            "Torch hardware call failed"
        );
        TorchError::Hardware(record)
    }

    /// Resolve and cache the device handle, registering the push callback once.
    async fn ensure_resolved(&self, state: &mut TorchState) -> TorchResult<DeviceRef> {
        if let Some(device) = &state.device {
            return Ok(device.clone());
        }

        if !self.adapter.has_flash() {
            return Err(self.fail(AdapterError::NoFlash));
        }

        let device = self
            .adapter
            .resolve_device()
            .await
            .map_err(|e| self.fail(e))?;

        if state.subscription.is_none() {
            let inbox = self.inbox.clone();
            let id = self
                .adapter
                .on_hardware_torch_changed(Arc::new(move |event| inbox.push(event)))
                .map_err(|e| self.fail(e))?;
            state.subscription = Some(id);
        }

        debug!(device = %device.id, "Resolved flash unit");
        state.device = Some(device.clone());
        Ok(device)
    }

    async fn drive(&self, state: &mut TorchState, native: NativeLevel) -> TorchResult<()> {
        let device = self.ensure_resolved(state).await?;

        debug!(device = %device.id, ?native, "Driving torch");
        let reading = match native {
            NativeLevel::Intensity(value) => {
                self.adapter.set_continuous_intensity(&device, value).await
            }
            NativeLevel::Strength(level) => self.adapter.set_discrete_strength(&device, level).await,
        }
        .map_err(|e| self.fail(e))?;

        self.reconcile(state, reading, None);
        self.drain_inbox(state);
        Ok(())
    }

    async fn turn_on(&self, state: &mut TorchState) -> TorchResult<()> {
        self.check_api_level(self.config.min_api_level)?;

        if state.is_on {
            debug!(level = ?state.current_level, "Torch already on");
            return Ok(());
        }

        let scale = self.scale()?;
        let level = state
            .remembered_level
            .or(self.config.default_level)
            .unwrap_or_else(|| scale.max_level())
            .clamp(1, scale.max_level());

        let native = scale.to_native(level)?;
        self.drive(state, native).await
    }

    async fn turn_off(&self, state: &mut TorchState) -> TorchResult<()> {
        self.check_api_level(self.config.min_api_level)?;

        let device = self.ensure_resolved(state).await?;

        debug!(device = %device.id, "Turning torch off");
        let reading = self
            .adapter
            .set_torch_off(&device)
            .await
            .map_err(|e| self.fail(e))?;

        self.reconcile(state, reading, None);
        self.drain_inbox(state);
        Ok(())
    }

    async fn apply_level(&self, state: &mut TorchState, level: u32) -> TorchResult<()> {
        let scale = self.scale()?;

        if !scale.supports_brightness() {
            return Err(classify(&AdapterError::BrightnessUnsupported {
                max: scale.max_level(),
            })
            .into());
        }

        self.check_api_level(self.config.min_brightness_api_level)?;

        let native = scale.to_native(level)?;
        self.drive(state, native).await
    }

    async fn dispose(&self, state: &mut TorchState) {
        if state.is_on {
            if let Err(err) = self.turn_off(state).await {
                warn!(error = %err, "Failed to turn torch off during dispose");
                self.reconcile(state, HardwareReading::off(), err.record().cloned());
            }
        }

        if let Some(id) = state.subscription.take() {
            self.adapter.unsubscribe(id);
        }

        self.inbox.clear();
        state.device = None;
        state.remembered_level = None;
        state.last_notified_level = None;

        info!(adapter = self.adapter.adapter_type(), "Torch controller disposed");
    }
}
