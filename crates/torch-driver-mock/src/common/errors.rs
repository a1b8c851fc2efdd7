//! Failure injection for the mock flash unit.
//!
//! Failures are raised as [`AdapterError`]s so they travel through the controller's
//! classifier exactly like real platform failures.

use super::rng::MockRng;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use torch_core::AdapterError;

/// Scripted failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorScenario {
    /// `operation` succeeds `count` times, then fails with an access error.
    FailAfterN {
        /// Operation name (`resolve_device`, `set_intensity`, `set_strength`, `set_off`)
        operation: &'static str,
        /// Successful calls before the first failure
        count: u32,
    },
    /// Every call to `operation` fails with an access error.
    AccessFault {
        /// Operation name
        operation: &'static str,
    },
    /// The first call to any operation loses the camera service; every later call
    /// fails as well until [`ErrorConfig::reset`].
    ServiceLoss,
}

#[derive(Debug, Default)]
struct ErrorState {
    operation_counts: HashMap<&'static str, u32>,
    service_lost: bool,
}

/// Failure injection settings. Clones share scenario state.
#[derive(Clone, Debug)]
pub struct ErrorConfig {
    failure_rates: Arc<HashMap<&'static str, f64>>,
    scenarios: Arc<Vec<ErrorScenario>>,
    rng: Arc<MockRng>,
    state: Arc<Mutex<ErrorState>>,
}

impl ErrorConfig {
    fn build(
        failure_rates: HashMap<&'static str, f64>,
        scenarios: Vec<ErrorScenario>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            failure_rates: Arc::new(failure_rates),
            scenarios: Arc::new(scenarios),
            rng: Arc::new(MockRng::new(seed)),
            state: Arc::new(Mutex::new(ErrorState::default())),
        }
    }

    /// No injected failures.
    pub fn none() -> Self {
        Self::build(HashMap::new(), Vec::new(), None)
    }

    /// Every operation fails with probability `rate`, drawn from a seeded RNG.
    pub fn random_failures_seeded(rate: f64, seed: Option<u64>) -> Self {
        Self::build(HashMap::from([("*", rate)]), Vec::new(), seed)
    }

    /// Per-operation failure rates. `"*"` applies to operations not listed.
    pub fn with_rates(rates: HashMap<&'static str, f64>) -> Self {
        Self::build(rates, Vec::new(), None)
    }

    /// A single scripted failure.
    pub fn scenario(scenario: ErrorScenario) -> Self {
        Self::scenarios(vec![scenario])
    }

    /// Several scripted failures, checked in order.
    pub fn scenarios(scenarios: Vec<ErrorScenario>) -> Self {
        Self::build(HashMap::new(), scenarios, None)
    }

    /// Check whether `operation` should fail right now.
    pub fn check_operation(&self, operation: &'static str) -> Result<(), AdapterError> {
        let mut state = self.state.lock();

        if state.service_lost {
            return Err(AdapterError::ServiceUnavailable(
                "camera service connection lost".into(),
            ));
        }

        for scenario in self.scenarios.iter() {
            match scenario {
                ErrorScenario::FailAfterN {
                    operation: op,
                    count,
                } if *op == operation => {
                    let calls = state.operation_counts.entry(operation).or_insert(0);
                    *calls += 1;
                    if *calls > *count {
                        return Err(AdapterError::Access(format!(
                            "injected failure on '{operation}' after {count} calls"
                        )));
                    }
                }
                ErrorScenario::AccessFault { operation: op } if *op == operation => {
                    return Err(AdapterError::Access(format!(
                        "CAMERA_ERROR during '{operation}'"
                    )));
                }
                ErrorScenario::ServiceLoss => {
                    state.service_lost = true;
                    return Err(AdapterError::ServiceUnavailable(
                        "camera service connection lost".into(),
                    ));
                }
                _ => {}
            }
        }

        let rate = self
            .failure_rates
            .get(operation)
            .or_else(|| self.failure_rates.get("*"))
            .copied()
            .unwrap_or(0.0);

        if self.rng.should_fail(rate) {
            return Err(AdapterError::Access(format!(
                "random failure on '{operation}'"
            )));
        }

        Ok(())
    }

    /// Clear counters and restore a lost service.
    pub fn reset(&self) {
        *self.state.lock() = ErrorState::default();
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torch_core::{classify, ErrorKind};

    #[test]
    fn test_no_errors() {
        let config = ErrorConfig::default();
        for _ in 0..100 {
            assert!(config.check_operation("set_strength").is_ok());
        }
    }

    #[test]
    fn test_random_failures() {
        let config = ErrorConfig::random_failures_seeded(0.5, Some(42));
        let failures = (0..1000)
            .filter(|_| config.check_operation("set_off").is_err())
            .count();
        assert!(failures > 400 && failures < 600, "Got {failures} failures");
    }

    #[test]
    fn test_fail_after_n_then_reset() {
        let config = ErrorConfig::scenario(ErrorScenario::FailAfterN {
            operation: "set_strength",
            count: 2,
        });

        assert!(config.check_operation("set_strength").is_ok());
        assert!(config.check_operation("set_strength").is_ok());
        let err = config.check_operation("set_strength").unwrap_err();
        assert_eq!(classify(&err).kind(), ErrorKind::AccessFailed);

        // Other operations are unaffected.
        assert!(config.check_operation("set_off").is_ok());

        config.reset();
        assert!(config.check_operation("set_strength").is_ok());
    }

    #[test]
    fn test_access_fault() {
        let config = ErrorConfig::scenario(ErrorScenario::AccessFault {
            operation: "set_off",
        });
        assert!(config.check_operation("set_off").is_err());
        assert!(config.check_operation("set_off").is_err());
        assert!(config.check_operation("set_intensity").is_ok());
    }

    #[test]
    fn test_service_loss_is_sticky() {
        let config = ErrorConfig::scenario(ErrorScenario::ServiceLoss);

        let err = config.check_operation("resolve_device").unwrap_err();
        assert_eq!(classify(&err).kind(), ErrorKind::CameraServiceUnavailable);

        let err = config.check_operation("set_off").unwrap_err();
        assert_eq!(classify(&err).kind(), ErrorKind::CameraServiceUnavailable);
    }

    #[test]
    fn test_custom_rates() {
        let config = ErrorConfig::with_rates(HashMap::from([
            ("set_intensity", 1.0),
            ("set_off", 0.0),
        ]));
        for _ in 0..10 {
            assert!(config.check_operation("set_intensity").is_err());
            assert!(config.check_operation("set_off").is_ok());
        }
    }
}
