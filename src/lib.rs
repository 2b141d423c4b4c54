//! NEEO driver host - discover, load and serve NEEO driver plugins
//!
//! This library provides the core functionality of the `neeo-cli` tool:
//! - Driver discovery in a project's `node_modules`
//! - Entry point resolution (manifest `main`, legacy `devices/index.js`)
//! - Plugin loading and structural validation of exported devices
//! - Device server lifecycle against a NEEO Brain
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 DeviceController                     │
//! │      start_devices  │  stop_devices  │  session      │
//! └──────────┬──────────────────────────────┬───────────┘
//!            │                              │
//! ┌──────────▼───────────────┐  ┌───────────▼───────────┐
//! │       DriverScanner       │  │     DeviceServer       │
//! │ filter → resolve → load   │  │  mDNS discovery, HTTP  │
//! │ → validate → aggregate    │  │                        │
//! └───────────────────────────┘  └────────────────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod plugins;
pub mod server;

pub use config::{SdkOptions, load_sdk_options};
pub use controller::{DeviceController, DeviceSession};
pub use discovery::BrainBrowser;
pub use error::{Error, Result};
pub use plugins::{
    DeviceCandidate, Diagnostic, DriverScanner, EntryOrigin, LoadedPlugin, ModuleLoader,
    ScanReport, Severity, ValidatedDevice, scan,
};
pub use server::{BrainDescriptor, DeviceServer, LocalDeviceServer, ServerConfig};
