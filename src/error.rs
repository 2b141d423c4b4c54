//! Error types for the NEEO driver host

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for driver host operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while discovering, loading or serving drivers
#[derive(Debug, Error)]
pub enum Error {
    /// Path or file absent
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File content is not valid JSON
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Package manifest exists but has no usable `main` entry
    #[error("package.json missing main script: {}", .0.display())]
    ManifestIncomplete(PathBuf),

    /// Plugin code failed while executing
    #[error("could not load devices in file {}: {reason}", path.display())]
    LoadExecution { path: PathBuf, reason: String },

    /// A built device definition failed structural validation
    #[error("invalid device: {0}")]
    Validation(String),

    /// The scan finished without a single valid device
    #[error(
        "No devices found! Make sure you expose devices in the \"devices\" directory \
         or install external drivers through npm."
    )]
    NoDevicesFound,

    /// Failure reported by the device server
    #[error("device server error: {0}")]
    RemoteServer(String),

    /// Brain discovery failure
    #[error("discovery error: {0}")]
    Discovery(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
