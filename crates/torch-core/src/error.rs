//! Error types and the error classifier.
//!
//! Every failure that can reach the application is one of two things:
//!
//! - **`TorchError::InvalidArgument`**: a local validation failure (an out-of-range
//!   `set_level` argument). Detected before any hardware call and never crosses the
//!   hardware boundary.
//! - **`TorchError::Hardware`**: a classified [`ErrorRecord`] produced by [`classify`]
//!   at the point where an adapter failure is observed.
//!
//! Adapters report native failures as [`AdapterError`]. The controller never hands an
//! `AdapterError` to the application; it always runs it through [`classify`] first so
//! every failure path ends in exactly one of the six [`ErrorKind`]s.
//!
//! ## Wire Format
//!
//! [`ErrorRecord`] serializes as `{ "code": "<ErrorKind>", "message": "<text>" }`.
//! [`ErrorRecord::from_wire`] accepts any string and degrades to
//! [`ErrorKind::Unknown`] when the payload does not have that shape.

use crate::level::LevelError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Error Kinds
// =============================================================================

/// Classified failure category.
///
/// The string form (see [`ErrorKind::code`]) is the `code` field of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No camera/flash service is reachable.
    CameraServiceUnavailable,
    /// Platform version is below what the requested operation needs.
    ApiLevelTooLow,
    /// No device with flash hardware was found.
    NoFlashAvailable,
    /// Hardware reports a maximum discrete level of 1 or less.
    BrightnessControlNotSupported,
    /// A hardware call raised a low-level access failure.
    AccessFailed,
    /// Anything unrecognized, including malformed error payloads.
    Unknown,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::CameraServiceUnavailable,
        ErrorKind::ApiLevelTooLow,
        ErrorKind::NoFlashAvailable,
        ErrorKind::BrightnessControlNotSupported,
        ErrorKind::AccessFailed,
        ErrorKind::Unknown,
    ];

    /// Wire code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::CameraServiceUnavailable => "CameraServiceUnavailable",
            ErrorKind::ApiLevelTooLow => "ApiLevelTooLow",
            ErrorKind::NoFlashAvailable => "NoFlashAvailable",
            ErrorKind::BrightnessControlNotSupported => "BrightnessControlNotSupported",
            ErrorKind::AccessFailed => "AccessFailed",
            ErrorKind::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ErrorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorKind::ALL
            .into_iter()
            .find(|kind| kind.code() == s)
            .ok_or(())
    }
}

// =============================================================================
// ErrorRecord
// =============================================================================

/// Immutable, transport-safe description of a classified failure.
///
/// Constructed once at the failure site. Fields are private so a record can be
/// read but never altered after construction.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {message}")]
pub struct ErrorRecord {
    #[serde(rename = "code")]
    kind: ErrorKind,
    message: String,
}

/// Loose wire shape: any `code` string is accepted, unknown codes map to `Unknown`.
#[derive(Deserialize)]
struct WireRecord {
    code: String,
    message: String,
}

impl ErrorRecord {
    /// Create a new record.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The classified kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Serialize to the `{ "code", "message" }` wire shape.
    pub fn to_wire(&self) -> String {
        // Two string fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"code\":\"{}\",\"message\":{:?}}}",
                self.kind.code(),
                self.message
            )
        })
    }

    /// Parse an error string received across the collaborator boundary.
    ///
    /// Never fails: a payload that is not `{ "code": string, "message": string }`
    /// becomes an `Unknown` record carrying the raw text, and a well-formed payload
    /// with an unrecognized code becomes `Unknown` with the payload's message.
    pub fn from_wire(raw: &str) -> Self {
        match serde_json::from_str::<WireRecord>(raw) {
            Ok(wire) => {
                let kind = wire.code.parse().unwrap_or(ErrorKind::Unknown);
                Self::new(kind, wire.message)
            }
            Err(_) => Self::new(ErrorKind::Unknown, raw),
        }
    }
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Native failure reported by a capability adapter.
///
/// This is the adapter-facing vocabulary. The application only ever sees these
/// after [`classify`] has turned them into an [`ErrorRecord`].
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The camera/flash service could not be reached.
    #[error("Camera service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The platform is too old for the requested primitive.
    #[error("Platform API level {actual} is below the required {required}")]
    ApiLevelTooLow {
        /// Level reported by the platform
        actual: u32,
        /// Level the primitive needs
        required: u32,
    },

    /// No device with a flash unit exists.
    #[error("No flash unit found")]
    NoFlash,

    /// The flash unit has no adjustable strength.
    #[error("Brightness control not supported (max strength {max})")]
    BrightnessUnsupported {
        /// Hardware-reported maximum strength
        max: u32,
    },

    /// The hardware call was refused or failed at a low level.
    #[error("Hardware access failed: {0}")]
    Access(String),

    /// I/O failure talking to the device.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error payload received as a string from a foreign boundary.
    #[error("{0}")]
    Wire(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Map an adapter failure to its classified record.
///
/// This is the single place where error kinds are assigned.
pub fn classify(err: &AdapterError) -> ErrorRecord {
    let kind = match err {
        AdapterError::ServiceUnavailable(_) => ErrorKind::CameraServiceUnavailable,
        AdapterError::ApiLevelTooLow { .. } => ErrorKind::ApiLevelTooLow,
        AdapterError::NoFlash => ErrorKind::NoFlashAvailable,
        AdapterError::BrightnessUnsupported { .. } => ErrorKind::BrightnessControlNotSupported,
        AdapterError::Access(_) | AdapterError::Io(_) => ErrorKind::AccessFailed,
        AdapterError::Wire(raw) => return ErrorRecord::from_wire(raw),
        AdapterError::Other(_) => ErrorKind::Unknown,
    };
    ErrorRecord::new(kind, err.to_string())
}

// =============================================================================
// Controller Errors
// =============================================================================

/// Error returned by every controller operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TorchError {
    /// Requested level is outside `1..=max_level`.
    #[error("Invalid level {level}: must be within 1..={max_level}")]
    InvalidArgument {
        /// Requested level
        level: u32,
        /// Current maximum level
        max_level: u32,
    },

    /// Classified hardware/platform failure.
    #[error(transparent)]
    Hardware(#[from] ErrorRecord),
}

impl TorchError {
    /// Classified kind, or `None` for local validation failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            TorchError::InvalidArgument { .. } => None,
            TorchError::Hardware(record) => Some(record.kind()),
        }
    }

    /// The classified record, if this is a hardware failure.
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            TorchError::InvalidArgument { .. } => None,
            TorchError::Hardware(record) => Some(record),
        }
    }
}

impl From<AdapterError> for TorchError {
    fn from(err: AdapterError) -> Self {
        TorchError::Hardware(classify(&err))
    }
}

impl From<LevelError> for TorchError {
    fn from(err: LevelError) -> Self {
        match err {
            LevelError::OutOfRange { level, max_level } => {
                TorchError::InvalidArgument { level, max_level }
            }
        }
    }
}

/// Convenience alias for controller results.
pub type TorchResult<T> = std::result::Result<T, TorchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_round_trips_through_code() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.code().parse::<ErrorKind>(), Ok(kind));
        }
        assert!("NotAKind".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn test_classify_table() {
        let cases = [
            (
                AdapterError::ServiceUnavailable("no camera manager".into()),
                ErrorKind::CameraServiceUnavailable,
            ),
            (
                AdapterError::ApiLevelTooLow {
                    actual: 21,
                    required: 23,
                },
                ErrorKind::ApiLevelTooLow,
            ),
            (AdapterError::NoFlash, ErrorKind::NoFlashAvailable),
            (
                AdapterError::BrightnessUnsupported { max: 1 },
                ErrorKind::BrightnessControlNotSupported,
            ),
            (
                AdapterError::Access("CAMERA_IN_USE".into()),
                ErrorKind::AccessFailed,
            ),
            (
                AdapterError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied)),
                ErrorKind::AccessFailed,
            ),
            (
                AdapterError::Other(anyhow::anyhow!("something odd")),
                ErrorKind::Unknown,
            ),
        ];

        for (err, expected) in cases {
            let record = classify(&err);
            assert_eq!(record.kind(), expected, "wrong kind for {err}");
            assert!(!record.message().is_empty());
        }
    }

    #[test]
    fn test_wire_shape() {
        let record = ErrorRecord::new(ErrorKind::NoFlashAvailable, "no flash");
        let value: serde_json::Value = serde_json::from_str(&record.to_wire()).unwrap();
        assert_eq!(value["code"], "NoFlashAvailable");
        assert_eq!(value["message"], "no flash");
        assert_eq!(ErrorRecord::from_wire(&record.to_wire()), record);
    }

    #[test]
    fn test_malformed_wire_is_unknown() {
        let record = ErrorRecord::from_wire("Camera exploded");
        assert_eq!(record.kind(), ErrorKind::Unknown);
        assert_eq!(record.message(), "Camera exploded");

        let record = ErrorRecord::from_wire(r#"{"code":"E_WEIRD","message":"huh"}"#);
        assert_eq!(record.kind(), ErrorKind::Unknown);
        assert_eq!(record.message(), "huh");

        let record = ErrorRecord::from_wire(r#"{"code":42}"#);
        assert_eq!(record.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_wire_adapter_error_is_parsed() {
        let err = AdapterError::Wire(r#"{"code":"AccessFailed","message":"denied"}"#.into());
        let record = classify(&err);
        assert_eq!(record.kind(), ErrorKind::AccessFailed);
        assert_eq!(record.message(), "denied");
    }

    #[test]
    fn test_torch_error_kind() {
        let err = TorchError::InvalidArgument {
            level: 0,
            max_level: 10,
        };
        assert_eq!(err.kind(), None);
        assert!(err.to_string().contains("1..=10"));

        let err: TorchError = AdapterError::NoFlash.into();
        assert_eq!(err.kind(), Some(ErrorKind::NoFlashAvailable));
    }
}
