//! Device controller: composes the driver scan with the device server
//!
//! `start_devices` returns a `DeviceSession` that must be handed back to
//! `stop_devices`. The controller also remembers the last started session so
//! a signal handler can stop it without holding the handle (`stop_active`).
//! That slot is empty before the first start and cleared on every stop.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::{DEFAULT_BRAIN_PORT, DEFAULT_SERVER_NAME, DEFAULT_SERVER_PORT, SdkOptions};
use crate::plugins::{Diagnostic, DriverScanner, ScanReport, ValidatedDevice};
use crate::server::{BrainDescriptor, DeviceServer, ServerConfig};
use crate::{Error, Result};

/// A running device server started by `DeviceController::start_devices`
#[derive(Debug, Clone)]
pub struct DeviceSession {
    /// Configuration the server was started with
    pub config: ServerConfig,
    /// Diagnostics from the scan that produced the devices
    pub diagnostics: Vec<Diagnostic>,
}

/// Starts and stops the device server for the drivers found by a scan
pub struct DeviceController {
    scanner: DriverScanner,
    server: Arc<dyn DeviceServer>,
    active: Mutex<Option<ServerConfig>>,
}

impl DeviceController {
    /// Create a controller
    #[must_use]
    pub fn new(scanner: DriverScanner, server: Arc<dyn DeviceServer>) -> Self {
        Self {
            scanner,
            server,
            active: Mutex::new(None),
        }
    }

    /// Scan for drivers, pick a Brain and start the device server
    ///
    /// # Errors
    ///
    /// Returns `Error::NoDevicesFound` if the scan yields no device,
    /// `Error::Discovery` if no Brain is configured or found, and
    /// `Error::RemoteServer` if the server fails to start
    pub async fn start_devices(&self, options: &SdkOptions) -> Result<DeviceSession> {
        let (report, brain) = tokio::join!(self.load_devices(), self.brain(options));
        let report = report?;
        let brain = brain?;

        tracing::info!(
            brain = brain.name.as_deref().unwrap_or("unknown"),
            host = %brain.host,
            "start server, connect to NEEO Brain"
        );

        let config = server_config(brain, options, report.devices);
        self.server.start(&config).await?;
        *self.active.lock().await = Some(config.clone());

        tracing::info!("your devices are now ready to use in the NEEO app");

        Ok(DeviceSession {
            config,
            diagnostics: report.diagnostics,
        })
    }

    /// Stop the server of `session`
    ///
    /// # Errors
    ///
    /// Returns `Error::RemoteServer` if the server fails to stop
    pub async fn stop_devices(&self, session: DeviceSession) -> Result<()> {
        {
            let mut active = self.active.lock().await;
            if active
                .as_ref()
                .is_some_and(|config| same_server(config, &session.config))
            {
                active.take();
            }
        }
        self.server.stop(&session.config).await
    }

    /// Stop the most recently started server, if any
    ///
    /// # Errors
    ///
    /// Returns `Error::RemoteServer` if the server fails to stop
    pub async fn stop_active(&self) -> Result<()> {
        let Some(config) = self.active.lock().await.take() else {
            tracing::debug!("no active device server to stop");
            return Ok(());
        };
        self.server.stop(&config).await
    }

    /// Whether a started server has not been stopped yet
    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    async fn load_devices(&self) -> Result<ScanReport> {
        let report = self.scanner.scan().await?;

        tracing::debug!(count = report.devices.len(), "found devices");
        if report.is_empty() {
            return Err(Error::NoDevicesFound);
        }

        Ok(report)
    }

    async fn brain(&self, options: &SdkOptions) -> Result<BrainDescriptor> {
        if let Some(brain) = configured_brain(options) {
            return Ok(brain);
        }

        tracing::info!("no Brain address configured, attempting to discover one");
        let brain = self.server.discover_one().await?;
        tracing::info!(
            brain = brain.name.as_deref().unwrap_or("unknown"),
            host = %brain.host,
            "Brain discovered"
        );
        Ok(brain)
    }
}

impl std::fmt::Debug for DeviceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("scanner", &self.scanner)
            .finish_non_exhaustive()
    }
}

/// Whether two configurations describe the same running server
fn same_server(a: &ServerConfig, b: &ServerConfig) -> bool {
    a.port == b.port && a.name == b.name && a.brain == b.brain
}

/// Brain taken from the options, when a host is configured
#[must_use]
pub fn configured_brain(options: &SdkOptions) -> Option<BrainDescriptor> {
    let host = options.brain_host.as_deref().filter(|host| !host.is_empty())?;
    Some(BrainDescriptor {
        name: None,
        host: host.to_string(),
        port: options.brain_port.unwrap_or(DEFAULT_BRAIN_PORT),
    })
}

/// Device server configuration with defaults applied
#[must_use]
pub fn server_config(
    brain: BrainDescriptor,
    options: &SdkOptions,
    devices: Vec<ValidatedDevice>,
) -> ServerConfig {
    ServerConfig {
        brain,
        port: options.server_port.unwrap_or(DEFAULT_SERVER_PORT),
        name: options
            .server_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
        adapter_address: options.server_ip.clone(),
        base_url: options.server_base_url.clone(),
        devices,
    }
}
