//! Device server collaborator
//!
//! The device server exposes loaded drivers to a NEEO Brain. The controller
//! only depends on the `DeviceServer` trait; `LocalDeviceServer` is the
//! implementation used by the command line.

mod local;

use async_trait::async_trait;
use serde::Serialize;

pub use local::LocalDeviceServer;

use crate::Result;
use crate::plugins::ValidatedDevice;

/// A Brain the device server connects to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrainDescriptor {
    /// Brain name, when discovered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Host or IP address
    pub host: String,
    /// API port
    pub port: u16,
}

/// Everything needed to start (and later stop) a device server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Brain to connect to
    pub brain: BrainDescriptor,
    /// Local port to listen on
    pub port: u16,
    /// Server name announced to the Brain
    pub name: String,
    /// Address the Brain should use to reach this server
    pub adapter_address: Option<String>,
    /// Base URL override
    pub base_url: Option<String>,
    /// Devices to serve
    pub devices: Vec<ValidatedDevice>,
}

/// Remote device server operations
#[async_trait]
pub trait DeviceServer: Send + Sync {
    /// Find one Brain on the network
    ///
    /// # Errors
    ///
    /// Returns `Error::Discovery` if no Brain is found
    async fn discover_one(&self) -> Result<BrainDescriptor>;

    /// Start serving the configured devices
    ///
    /// # Errors
    ///
    /// Returns `Error::RemoteServer` if the server cannot be started
    async fn start(&self, config: &ServerConfig) -> Result<()>;

    /// Stop a server previously started with `config`
    ///
    /// Stopping a server that was never started is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::RemoteServer` if the server fails to shut down
    async fn stop(&self, config: &ServerConfig) -> Result<()>;
}
