//! Notification Channel
//!
//! Single-observer slots for `stateChanged`, `levelChanged` and out-of-band
//! errors. Registering a listener replaces the previous one; there is no fan-out.
//!
//! Delivery is synchronous: the controller calls [`NotificationChannel::deliver`]
//! from inside the serialized operation that caused the change, with the events of
//! one transition in order (`StateChanged` before `LevelChanged`). Listeners are
//! cloned out of their slot before being invoked, so a listener may replace or
//! clear any slot from inside its own callback.

use crate::error::ErrorRecord;
use parking_lot::RwLock;
use std::sync::Arc;

/// `stateChanged` listener.
pub type StateListener = Arc<dyn Fn(bool) + Send + Sync>;

/// `levelChanged` listener; `None` means the torch is off.
pub type LevelListener = Arc<dyn Fn(Option<u32>) + Send + Sync>;

/// Out-of-band error listener.
pub type ErrorListener = Arc<dyn Fn(&ErrorRecord) + Send + Sync>;

/// Observable change produced by reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum TorchEvent {
    /// Power state changed.
    StateChanged(bool),
    /// Level changed (`None` when turned off).
    LevelChanged(Option<u32>),
    /// A failure that did not originate from a caller's request.
    Error(ErrorRecord),
}

/// Holder of the three listener slots.
#[derive(Default)]
pub struct NotificationChannel {
    state: RwLock<Option<StateListener>>,
    level: RwLock<Option<LevelListener>>,
    error: RwLock<Option<ErrorListener>>,
}

impl std::fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("state", &self.state.read().is_some())
            .field("level", &self.level.read().is_some())
            .field("error", &self.error.read().is_some())
            .finish()
    }
}

impl NotificationChannel {
    /// Create a channel with empty slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `stateChanged` listener, replacing any previous one.
    pub fn subscribe_state_changed<F>(&self, listener: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        *self.state.write() = Some(Arc::new(listener));
    }

    /// Clear the `stateChanged` listener.
    pub fn unsubscribe_state_changed(&self) {
        *self.state.write() = None;
    }

    /// Register the `levelChanged` listener, replacing any previous one.
    pub fn subscribe_level_changed<F>(&self, listener: F)
    where
        F: Fn(Option<u32>) + Send + Sync + 'static,
    {
        *self.level.write() = Some(Arc::new(listener));
    }

    /// Clear the `levelChanged` listener.
    pub fn unsubscribe_level_changed(&self) {
        *self.level.write() = None;
    }

    /// Register the error listener, replacing any previous one.
    pub fn subscribe_error<F>(&self, listener: F)
    where
        F: Fn(&ErrorRecord) + Send + Sync + 'static,
    {
        *self.error.write() = Some(Arc::new(listener));
    }

    /// Clear the error listener.
    pub fn unsubscribe_error(&self) {
        *self.error.write() = None;
    }

    /// Deliver events in order to whichever listeners are registered.
    pub fn deliver(&self, events: &[TorchEvent]) {
        for event in events {
            match event {
                TorchEvent::StateChanged(is_on) => {
                    let listener = self.state.read().clone();
                    if let Some(listener) = listener {
                        listener(*is_on);
                    }
                }
                TorchEvent::LevelChanged(level) => {
                    let listener = self.level.read().clone();
                    if let Some(listener) = listener {
                        listener(*level);
                    }
                }
                TorchEvent::Error(record) => {
                    let listener = self.error.read().clone();
                    if let Some(listener) = listener {
                        listener(record);
                    }
                }
            }
        }
    }
}
