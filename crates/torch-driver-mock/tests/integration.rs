//! Integration tests: the mock flash unit driven through the controller.

use std::sync::Arc;
use torch_core::{ControllerConfig, ErrorKind, TorchController};
use torch_driver_mock::*;

/// Chaos timing forces interleaving, yet the controller never overlaps calls.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_chaos_mode_calls_never_overlap() {
    let torch = Arc::new(MockTorch::with_config(MockTorchConfig {
        mode: MockMode::Chaos,
        seed: Some(9),
        timing: Some(TimingConfig {
            resolve_ms: 2,
            command_ms: 3,
            jitter_ms: 5,
        }),
        ..MockTorchConfig::discrete(4)
    }));
    let controller = Arc::new(TorchController::new(
        torch.clone(),
        ControllerConfig::default(),
    ));

    let mut tasks = Vec::new();
    for i in 0..12u32 {
        let controller = controller.clone();
        tasks.push(tokio::spawn(async move {
            if i % 3 == 0 {
                controller.set_level(i % 4 + 1).await
            } else {
                controller.toggle().await
            }
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(torch.max_in_flight(), 1);

    let snapshot = controller.state().await;
    assert_eq!(snapshot.is_on, torch.reading().is_on);
    assert_eq!(snapshot.is_on, snapshot.level.is_some());
}

/// Random failures surface as classified `AccessFailed` errors.
#[tokio::test]
async fn test_random_failures_are_classified() {
    let torch = Arc::new(MockTorch::with_config(MockTorchConfig {
        failure_rate: 1.0,
        seed: Some(1),
        ..MockTorchConfig::continuous(None)
    }));
    let controller = TorchController::new(torch, ControllerConfig::default());

    let err = controller.on().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AccessFailed));
    assert!(!controller.state().await.is_on);
}

/// A lost camera service is reported on every later call.
#[tokio::test]
async fn test_service_loss_scenario() {
    let torch = Arc::new(
        MockTorch::with_config(MockTorchConfig::discrete(5))
            .with_error_config(ErrorConfig::scenario(ErrorScenario::ServiceLoss)),
    );
    let controller = TorchController::new(torch, ControllerConfig::default());

    for _ in 0..2 {
        let err = controller.toggle().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::CameraServiceUnavailable));
    }
}

/// The registry helper hands out the mock factory.
#[test]
fn test_register_all() {
    struct Names(parking_lot::Mutex<Vec<&'static str>>);

    impl torch_core::FactoryRegistry for Names {
        fn register_factory(&self, factory: Box<dyn torch_core::AdapterFactory>) {
            self.0.lock().push(factory.driver_type());
        }
    }

    let names = Names(parking_lot::Mutex::new(Vec::new()));
    register_all(&names);
    assert_eq!(*names.0.lock(), vec!["mock"]);
}
