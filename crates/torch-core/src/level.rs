//! Level Normalizer
//!
//! Pure mapping between the public discrete brightness scale `1..=max_level` and
//! the adapter's native representation. Two strategies exist, selected once from
//! the adapter's [`BrightnessModel`](crate::capabilities::BrightnessModel):
//!
//! | Scale | `to_native(L)` | `from_native(v)` |
//! |-------|----------------|------------------|
//! | `Continuous` | `clamp(L / max, 0.1, min(ceiling, 1.0))` | `round(v * max)` |
//! | `Discrete` | `clamp(L, 1, max)` | `clamp(v, 1, max)` |
//!
//! The 0.1 floor keeps a lit torch from ever being driven with a literal zero
//! intensity. For the continuous scale this floor equals one step of a ten-step
//! scale, so `max_level` must not exceed [`MAX_CONTINUOUS_LEVELS`] for the
//! round trip `from_native(to_native(L)) == L` to hold.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest continuous intensity used while the torch is on.
pub const MIN_INTENSITY: f64 = 0.1;

/// Largest continuous scale for which the intensity floor preserves round trips.
pub const MAX_CONTINUOUS_LEVELS: u32 = 10;

/// Brightness in the adapter's own representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NativeLevel {
    /// Continuous intensity in `0.0..=1.0`
    Intensity(f64),
    /// Hardware strength level, `1..=max`
    Strength(u32),
}

/// Normalizer failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelError {
    /// Level outside `1..=max_level`.
    #[error("Level {level} out of range 1..={max_level}")]
    OutOfRange {
        /// Requested level
        level: u32,
        /// Scale maximum
        max_level: u32,
    },
}

/// Strategy for converting between public levels and native values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelScale {
    /// Native values are intensities in `[MIN_INTENSITY, min(thermal_ceiling, 1.0)]`.
    Continuous {
        /// Public scale maximum
        max_level: u32,
        /// Hardware-reported ceiling (1.0 when unthrottled)
        thermal_ceiling: f64,
    },
    /// Native values are hardware strength levels passed through directly.
    Discrete {
        /// Hardware-reported maximum strength
        max_level: u32,
    },
}

impl LevelScale {
    /// Continuous scale. A missing, non-finite or non-positive ceiling means 1.0.
    pub fn continuous(max_level: u32, thermal_ceiling: Option<f64>) -> Self {
        let thermal_ceiling = match thermal_ceiling {
            Some(c) if c.is_finite() && c > 0.0 => c.min(1.0),
            _ => 1.0,
        };
        Self::Continuous {
            max_level: max_level.max(1),
            thermal_ceiling,
        }
    }

    /// Discrete scale bounded by the hardware maximum.
    pub fn discrete(max_level: u32) -> Self {
        Self::Discrete {
            max_level: max_level.max(1),
        }
    }

    /// Maximum public level.
    pub fn max_level(&self) -> u32 {
        match *self {
            Self::Continuous { max_level, .. } | Self::Discrete { max_level } => max_level,
        }
    }

    /// Thermal ceiling in effect (always 1.0 for discrete scales).
    pub fn thermal_ceiling(&self) -> f64 {
        match *self {
            Self::Continuous {
                thermal_ceiling, ..
            } => thermal_ceiling,
            Self::Discrete { .. } => 1.0,
        }
    }

    /// Whether levels other than "full" can be selected.
    pub fn supports_brightness(&self) -> bool {
        self.max_level() > 1
    }

    /// Convert a public level to the native value.
    pub fn to_native(&self, level: u32) -> Result<NativeLevel, LevelError> {
        let max_level = self.max_level();
        if level < 1 || level > max_level {
            return Err(LevelError::OutOfRange { level, max_level });
        }

        Ok(match *self {
            Self::Continuous {
                max_level,
                thermal_ceiling,
            } => {
                // Ceiling may sit below the floor on a hot device; the floor wins.
                let upper = thermal_ceiling.min(1.0).max(MIN_INTENSITY);
                let fraction = f64::from(level) / f64::from(max_level);
                NativeLevel::Intensity(fraction.clamp(MIN_INTENSITY, upper))
            }
            Self::Discrete { max_level } => NativeLevel::Strength(level.clamp(1, max_level)),
        })
    }

    /// Convert a native value to the nearest public level.
    ///
    /// Either native representation is accepted; intensities are scaled by
    /// `max_level`, strengths are clamped. The result is always in `1..=max_level`.
    pub fn from_native(&self, native: NativeLevel) -> u32 {
        let max_level = self.max_level();
        match native {
            NativeLevel::Intensity(value) => {
                let value = if value.is_finite() { value } else { 1.0 };
                let scaled = (value.clamp(0.0, 1.0) * f64::from(max_level)).round();
                // Clamped into [0, max_level] above, so the cast is exact.
                (scaled as u32).clamp(1, max_level)
            }
            NativeLevel::Strength(strength) => strength.clamp(1, max_level),
        }
    }

    /// Highest level currently reachable under the thermal ceiling.
    pub fn dynamic_max_level(&self) -> u32 {
        let scaled = (self.thermal_ceiling().min(1.0) * f64::from(self.max_level())).round();
        (scaled as u32).clamp(1, self.max_level())
    }
}
