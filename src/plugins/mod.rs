//! Driver plugin discovery and loading
//!
//! Drivers are installed packages whose name starts with `neeo-` or `neeo_`.
//! Each one is resolved to an entry point (manifest `main`, else the legacy
//! `devices/index.js`), executed, and its exported devices validated before
//! they are handed to the device server.

pub mod device;
pub mod diagnostics;
pub mod discovery;
pub mod filter;
pub mod fs;
pub mod loader;
pub mod manifest;
pub mod process;
pub mod resolver;

pub use device::{BuildDevice, DeviceCandidate, Rejection, ValidatedDevice};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use discovery::{DriverScanner, ScanReport, scan};
pub use filter::{DENY_LIST, DRIVER_PREFIXES, classify};
pub use fs::{Filesystem, LocalFilesystem};
pub use loader::{LoadedPlugin, ModuleLoader, ProcessModuleLoader, StaticModuleLoader};
pub use manifest::{PackageManifest, declared_path, legacy_path};
pub use resolver::{EntryOrigin, Resolution, ResolvedPath, resolve_driver};
