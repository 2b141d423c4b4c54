//! Local HTTP device server
//!
//! Builds every device once at start and serves the resulting catalog:
//! - `GET /health`
//! - `GET /devices`

use std::sync::Arc;

use async_trait::async_trait;
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use super::{BrainDescriptor, DeviceServer, ServerConfig};
use crate::discovery::BrainBrowser;
use crate::{Error, Result};

/// A built device as served to clients
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    /// Module that exported the device
    pub module: String,
    /// Device name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Output of the device's build capability
    pub definition: serde_json::Value,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    name: String,
    brain: BrainDescriptor,
    devices: usize,
}

struct CatalogState {
    name: String,
    brain: BrainDescriptor,
    devices: Vec<CatalogEntry>,
}

struct RunningServer {
    port: u16,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

/// Device server listening on a local TCP port
pub struct LocalDeviceServer {
    browser: BrainBrowser,
    running: Mutex<Option<RunningServer>>,
}

impl Default for LocalDeviceServer {
    fn default() -> Self {
        Self::new(BrainBrowser::default())
    }
}

impl LocalDeviceServer {
    /// Create a server that discovers Brains with `browser`
    #[must_use]
    pub fn new(browser: BrainBrowser) -> Self {
        Self {
            browser,
            running: Mutex::new(None),
        }
    }

    /// Whether a server is currently running
    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

#[async_trait]
impl DeviceServer for LocalDeviceServer {
    async fn discover_one(&self) -> Result<BrainDescriptor> {
        self.browser.discover_one().await
    }

    async fn start(&self, config: &ServerConfig) -> Result<()> {
        let mut running = self.running.lock().await;
        if let Some(server) = running.as_ref() {
            return Err(Error::RemoteServer(format!(
                "server already running on port {}",
                server.port
            )));
        }

        // Build every device before binding
        let devices = build_catalog(config).await?;

        // Bind
        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .map_err(|e| {
                Error::RemoteServer(format!("failed to bind port {}: {e}", config.port))
            })?;
        let port = listener.local_addr().map_or(config.port, |addr| addr.port());

        let router = catalog_router(Arc::new(CatalogState {
            name: config.name.clone(),
            brain: config.brain.clone(),
            devices,
        }));

        // Serve until stop() fires the shutdown channel
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .map_err(|e| Error::RemoteServer(format!("device server error: {e}")))
        });

        tracing::info!(
            port,
            name = %config.name,
            adapter_address = ?config.adapter_address,
            base_url = ?config.base_url,
            devices = config.devices.len(),
            "device server listening"
        );

        *running = Some(RunningServer {
            port,
            shutdown,
            task,
        });

        Ok(())
    }

    async fn stop(&self, config: &ServerConfig) -> Result<()> {
        let Some(server) = self.running.lock().await.take() else {
            tracing::debug!(name = %config.name, "device server not running");
            return Ok(());
        };

        // Signal shutdown and wait for in-flight requests
        let _ = server.shutdown.send(());
        server
            .task
            .await
            .map_err(|e| Error::RemoteServer(format!("device server task failed: {e}")))??;

        tracing::info!(port = server.port, name = %config.name, "device server stopped");
        Ok(())
    }
}

async fn build_catalog(config: &ServerConfig) -> Result<Vec<CatalogEntry>> {
    let mut entries = Vec::with_capacity(config.devices.len());

    for device in &config.devices {
        let definition = device.build().await.map_err(|e| {
            Error::RemoteServer(format!(
                "failed to build device {} from {}: {e}",
                device.name.as_deref().unwrap_or("<unnamed>"),
                device.module
            ))
        })?;

        entries.push(CatalogEntry {
            module: device.module.clone(),
            name: device.name.clone(),
            manufacturer: device.manufacturer.clone(),
            definition,
        });
    }

    Ok(entries)
}

fn catalog_router(state: Arc<CatalogState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/devices", get(devices))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<Arc<CatalogState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        name: state.name.clone(),
        brain: state.brain.clone(),
        devices: state.devices.len(),
    })
}

async fn devices(State(state): State<Arc<CatalogState>>) -> Json<Vec<CatalogEntry>> {
    Json(state.devices.clone())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::plugins::{DeviceCandidate, ValidatedDevice};

    fn device(name: &str) -> ValidatedDevice {
        let built = json!({ "adapterName": name });
        ValidatedDevice::decode(
            "neeo-test",
            DeviceCandidate::with_build_fn(json!({ "name": name }), move || Ok(built.clone())),
        )
        .unwrap()
    }

    fn config(devices: Vec<ValidatedDevice>) -> ServerConfig {
        ServerConfig {
            brain: BrainDescriptor {
                name: None,
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            port: 0,
            name: "default".to_string(),
            adapter_address: None,
            base_url: None,
            devices,
        }
    }

    #[tokio::test]
    async fn devices_endpoint_lists_built_devices() {
        let cfg = config(vec![device("lamp"), device("tv")]);
        let router = catalog_router(Arc::new(CatalogState {
            name: cfg.name.clone(),
            brain: cfg.brain.clone(),
            devices: build_catalog(&cfg).await.unwrap(),
        }));

        let response = router
            .oneshot(Request::builder().uri("/devices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json[0]["definition"]["adapterName"], "lamp");
        assert_eq!(json[1]["name"], "tv");
    }

    #[tokio::test]
    async fn health_reports_device_count() {
        let cfg = config(vec![device("lamp")]);
        let router = catalog_router(Arc::new(CatalogState {
            name: cfg.name.clone(),
            brain: cfg.brain.clone(),
            devices: build_catalog(&cfg).await.unwrap(),
        }));

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["devices"], 1);
    }

    #[tokio::test]
    async fn failing_build_is_remote_server_error() {
        let broken = ValidatedDevice::decode(
            "neeo-broken",
            DeviceCandidate::with_build_fn(json!({"name": "x"}), || {
                Err(Error::Validation("no buttons".to_string()))
            }),
        )
        .unwrap();

        let err = build_catalog(&config(vec![broken])).await.unwrap_err();
        assert!(matches!(err, Error::RemoteServer(_)));
        assert!(err.to_string().contains("neeo-broken"));
    }

    #[tokio::test]
    async fn non_object_definition_fails_start() {
        let odd = ValidatedDevice::decode(
            "neeo-odd",
            DeviceCandidate::with_build_fn(json!({"name": "odd"}), || Ok(json!("lamp"))),
        )
        .unwrap();

        let server = LocalDeviceServer::default();
        let err = server.start(&config(vec![odd])).await.unwrap_err();
        assert!(matches!(err, Error::RemoteServer(_)));
        assert!(err.to_string().contains("expected an object"), "{err}");
        assert!(!server.is_running().await);
    }

    #[tokio::test]
    async fn start_then_stop() {
        let server = LocalDeviceServer::default();
        let cfg = config(vec![device("lamp")]);

        server.start(&cfg).await.unwrap();
        assert!(server.is_running().await);

        let again = server.start(&cfg).await.unwrap_err();
        assert!(matches!(again, Error::RemoteServer(_)));

        server.stop(&cfg).await.unwrap();
        assert!(!server.is_running().await);
    }

    #[tokio::test]
    async fn stop_without_start_is_noop() {
        let server = LocalDeviceServer::default();
        server.stop(&config(Vec::new())).await.unwrap();
        assert!(!server.is_running().await);
    }
}
