//! Device controller integration tests

use std::sync::Arc;

use neeo_cli::plugins::StaticModuleLoader;
use neeo_cli::{BrainDescriptor, DeviceController, Error, SdkOptions};

mod common;
use common::{FakeServer, ServerCall, exporting, install_driver, scanner};

fn brain(host: &str, port: u16) -> BrainDescriptor {
    BrainDescriptor {
        name: None,
        host: host.to_string(),
        port,
    }
}

fn controller_with_one_driver(
    root: &std::path::Path,
    server: Arc<FakeServer>,
) -> DeviceController {
    let entry = install_driver(root, "neeo-driver-a", "a.js");
    let loader = StaticModuleLoader::new().with(entry, exporting(&["lamp", "tv"]));
    DeviceController::new(scanner(root, loader), server)
}

#[tokio::test]
async fn start_with_configured_brain_applies_defaults() {
    let root = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeServer::default());
    let controller = controller_with_one_driver(root.path(), server.clone());

    let options = SdkOptions {
        brain_host: Some("10.0.0.1".to_string()),
        ..SdkOptions::default()
    };
    let session = controller.start_devices(&options).await.unwrap();

    assert_eq!(session.config.brain, brain("10.0.0.1", 3000));
    assert_eq!(session.config.port, 6336);
    assert_eq!(session.config.name, "default");
    assert_eq!(session.config.devices.len(), 2);
    assert!(session.diagnostics.is_empty());

    assert_eq!(
        server.calls(),
        vec![ServerCall::Start {
            port: 6336,
            name: "default".to_string(),
            brain: brain("10.0.0.1", 3000),
            devices: 2,
        }]
    );
    assert!(controller.is_active().await);
}

#[tokio::test]
async fn start_without_brain_host_discovers_one() {
    let root = tempfile::tempdir().unwrap();
    let discovered = BrainDescriptor {
        name: Some("NEEO-living-room".to_string()),
        host: "10.0.0.50".to_string(),
        port: 3000,
    };
    let server = Arc::new(FakeServer::discovering(discovered.clone()));
    let controller = controller_with_one_driver(root.path(), server.clone());

    let options = SdkOptions {
        server_name: Some("den".to_string()),
        server_port: Some(7000),
        ..SdkOptions::default()
    };
    let session = controller.start_devices(&options).await.unwrap();

    assert_eq!(session.config.brain, discovered);
    assert_eq!(session.config.name, "den");
    assert_eq!(session.config.port, 7000);
    assert_eq!(server.calls()[0], ServerCall::Discover);
}

#[tokio::test]
async fn discovery_failure_aborts_start() {
    let root = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeServer::default());
    let controller = controller_with_one_driver(root.path(), server.clone());

    let err = controller
        .start_devices(&SdkOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Discovery(_)));
    assert!(!controller.is_active().await);
    assert!(
        !server
            .calls()
            .iter()
            .any(|call| matches!(call, ServerCall::Start { .. }))
    );
}

#[tokio::test]
async fn no_devices_does_not_start_the_server() {
    let root = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeServer::default());
    let controller =
        DeviceController::new(scanner(root.path(), StaticModuleLoader::new()), server.clone());

    let options = SdkOptions {
        brain_host: Some("10.0.0.1".to_string()),
        ..SdkOptions::default()
    };
    let err = controller.start_devices(&options).await.unwrap_err();

    assert!(matches!(err, Error::NoDevicesFound));
    assert!(server.calls().is_empty());
    assert!(!controller.is_active().await);
}

#[tokio::test]
async fn stop_without_start_is_a_noop() {
    let root = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeServer::default());
    let controller = controller_with_one_driver(root.path(), server.clone());

    controller.stop_active().await.unwrap();
    assert!(server.calls().is_empty());
}

#[tokio::test]
async fn stop_after_start_stops_the_same_server() {
    let root = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeServer::default());
    let controller = controller_with_one_driver(root.path(), server.clone());

    let options = SdkOptions {
        brain_host: Some("10.0.0.1".to_string()),
        server_port: Some(6400),
        ..SdkOptions::default()
    };
    let session = controller.start_devices(&options).await.unwrap();
    controller.stop_devices(session).await.unwrap();

    assert!(!controller.is_active().await);
    assert_eq!(server.calls().last(), Some(&ServerCall::Stop { port: 6400 }));

    controller.stop_active().await.unwrap();
    assert_eq!(server.calls().len(), 2);
}

#[tokio::test]
async fn stop_active_uses_the_remembered_session() {
    let root = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeServer::default());
    let controller = controller_with_one_driver(root.path(), server.clone());

    let options = SdkOptions {
        brain_host: Some("10.0.0.1".to_string()),
        ..SdkOptions::default()
    };
    controller.start_devices(&options).await.unwrap();
    controller.stop_active().await.unwrap();

    assert_eq!(server.calls().last(), Some(&ServerCall::Stop { port: 6336 }));
    assert!(!controller.is_active().await);
}

#[tokio::test]
async fn stopping_another_session_keeps_the_active_one() {
    let root = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeServer::default());
    let controller = controller_with_one_driver(root.path(), server.clone());

    let options = SdkOptions {
        brain_host: Some("10.0.0.1".to_string()),
        ..SdkOptions::default()
    };
    let session = controller.start_devices(&options).await.unwrap();

    let mut other = session.clone();
    other.config.port = 7100;
    controller.stop_devices(other).await.unwrap();

    assert!(controller.is_active().await);
    assert_eq!(server.calls().last(), Some(&ServerCall::Stop { port: 7100 }));

    controller.stop_active().await.unwrap();
    assert!(!controller.is_active().await);
    assert_eq!(server.calls().last(), Some(&ServerCall::Stop { port: 6336 }));
}
