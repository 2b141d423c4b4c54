//! Plugin loading: executes a resolved entry point and extracts its devices

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::device::{BuildDevice, DeviceCandidate, Rejection, ValidatedDevice};
use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::process::{DEFAULT_TIMEOUT, run_entry_point};
use super::resolver::ResolvedPath;
use crate::{Error, Result};

/// Export field holding the device list
pub const DEVICES_FIELD: &str = "devices";

/// The result of executing a plugin's entry point
#[derive(Debug, Clone, Default)]
pub struct LoadedPlugin {
    /// Declared devices, possibly malformed
    pub devices: Vec<DeviceCandidate>,
}

impl LoadedPlugin {
    /// Plugin exporting the given candidates
    #[must_use]
    pub const fn new(devices: Vec<DeviceCandidate>) -> Self {
        Self { devices }
    }
}

/// Capability that executes plugin code
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Execute the entry point and collect its declared devices
    ///
    /// # Errors
    ///
    /// Returns `Error::LoadExecution` if the plugin fails while loading
    async fn load(&self, entry: &ResolvedPath) -> Result<LoadedPlugin>;
}

/// Loads plugins by running their entry point as a subprocess
#[derive(Debug, Clone)]
pub struct ProcessModuleLoader {
    timeout: Duration,
}

impl Default for ProcessModuleLoader {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ProcessModuleLoader {
    /// Create a loader with a per-invocation timeout
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ModuleLoader for ProcessModuleLoader {
    async fn load(&self, entry: &ResolvedPath) -> Result<LoadedPlugin> {
        tracing::debug!(path = %entry.path.display(), "try to load driver");

        let export = run_entry_point(&entry.path, &["describe"], self.timeout).await?;
        if !export.is_object() {
            return Err(Error::LoadExecution {
                path: entry.path.clone(),
                reason: format!("export is not an object: {export}"),
            });
        }

        let devices = declared_devices(export)
            .into_iter()
            .map(|value| {
                let build = value
                    .get("build")
                    .and_then(Value::as_str)
                    .map(|adapter| -> Arc<dyn BuildDevice> {
                        Arc::new(ProcessBuild {
                            entry: entry.path.clone(),
                            adapter: adapter.to_string(),
                            timeout: self.timeout,
                        })
                    });
                DeviceCandidate { value, build }
            })
            .collect();

        Ok(LoadedPlugin::new(devices))
    }
}

/// Build capability backed by `<entry> build <adapter>`
struct ProcessBuild {
    entry: PathBuf,
    adapter: String,
    timeout: Duration,
}

#[async_trait]
impl BuildDevice for ProcessBuild {
    async fn build(&self) -> Result<Value> {
        run_entry_point(&self.entry, &["build", self.adapter.as_str()], self.timeout).await
    }
}

/// Split an export's `devices` field into individual candidates
///
/// A missing or `null` field yields nothing; a non-list value is a single
/// candidate.
#[must_use]
pub fn declared_devices(mut export: Value) -> Vec<Value> {
    match export.get_mut(DEVICES_FIELD).map(Value::take) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(single) => vec![single],
    }
}

type PluginFactory = Box<dyn Fn() -> Result<LoadedPlugin> + Send + Sync>;

/// In-process loader for drivers compiled into the host
///
/// Entry points are looked up by exact path; an unregistered path fails like
/// a missing module would.
#[derive(Default)]
pub struct StaticModuleLoader {
    factories: HashMap<PathBuf, PluginFactory>,
}

impl StaticModuleLoader {
    /// Create an empty loader
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the plugin served at `entry`
    #[must_use]
    pub fn with<F>(mut self, entry: impl Into<PathBuf>, factory: F) -> Self
    where
        F: Fn() -> Result<LoadedPlugin> + Send + Sync + 'static,
    {
        self.register(entry, factory);
        self
    }

    /// Register the plugin served at `entry`
    pub fn register<F>(&mut self, entry: impl Into<PathBuf>, factory: F)
    where
        F: Fn() -> Result<LoadedPlugin> + Send + Sync + 'static,
    {
        self.factories.insert(entry.into(), Box::new(factory));
    }

    /// Number of registered entry points
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(&self, entry: &ResolvedPath) -> Result<LoadedPlugin> {
        let factory = self
            .factories
            .get(&entry.path)
            .ok_or_else(|| Error::LoadExecution {
                path: entry.path.clone(),
                reason: "Cannot find module".to_string(),
            })?;

        factory()
    }
}

/// Outcome of loading and validating one plugin
#[derive(Debug, Default)]
pub struct PluginDevices {
    /// Accepted devices, in declaration order
    pub devices: Vec<ValidatedDevice>,
    /// Load failure or per-device rejections
    pub diagnostics: Vec<Diagnostic>,
}

/// Load one plugin and validate each of its declared devices
///
/// Never fails: a load error becomes a single diagnostic with zero devices,
/// and each rejected device becomes its own diagnostic.
pub async fn load_plugin(loader: &dyn ModuleLoader, entry: &ResolvedPath) -> PluginDevices {
    let plugin = match loader.load(entry).await {
        Ok(plugin) => plugin,
        Err(e) => {
            let reason = match e {
                Error::LoadExecution { reason, .. } => reason,
                other => other.to_string(),
            };
            return PluginDevices {
                devices: Vec::new(),
                diagnostics: vec![Diagnostic::error(
                    &entry.module,
                    DiagnosticKind::LoadFailed {
                        path: entry.path.clone(),
                    },
                    format!(
                        "could not load devices in file {}: {reason}",
                        entry.path.display()
                    ),
                )],
            };
        }
    };

    let mut result = PluginDevices::default();
    for candidate in plugin.devices {
        match ValidatedDevice::decode(&entry.module, candidate) {
            Ok(device) => result.devices.push(device),
            Err(rejection) => result
                .diagnostics
                .push(rejection_diagnostic(&entry.module, &entry.path, rejection)),
        }
    }

    result
}

fn rejection_diagnostic(module: &str, path: &Path, rejection: Rejection) -> Diagnostic {
    let message = format!("invalid device in {}: {rejection}", path.display());
    let kind = match rejection {
        Rejection::NestedSequence { value } => DiagnosticKind::NestedSequence { value },
        Rejection::MissingBuild { value } => DiagnosticKind::MissingBuild { value },
    };
    Diagnostic::error(module, kind, message)
}
