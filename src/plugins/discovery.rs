//! Driver discovery - scan a module directory for NEEO drivers
//!
//! Pipeline: list entries → classify by prefix → resolve entry points
//! (concurrently) → load and validate each plugin → flatten.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::diagnostics::Diagnostic;
use super::device::ValidatedDevice;
use super::filter::{DENY_LIST, DRIVER_PREFIXES, classify};
use super::fs::{Filesystem, LocalFilesystem};
use super::loader::{ModuleLoader, ProcessModuleLoader, load_plugin};
use super::resolver::resolve_all;
use crate::Result;

/// Everything one scan produced
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Accepted devices, in candidate order then declaration order
    pub devices: Vec<ValidatedDevice>,
    /// Warnings and errors collected along the way
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanReport {
    /// Whether no device was accepted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Warnings only
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    /// Errors only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

/// Scan `root` for driver modules and collect their validated devices
///
/// Per-candidate and per-device failures are recorded as diagnostics and
/// never abort the scan.
///
/// # Errors
///
/// Returns `Error::NotFound` if `root` itself cannot be listed
pub async fn scan<S>(
    fs: &dyn Filesystem,
    loader: &dyn ModuleLoader,
    root: &Path,
    allowed_prefixes: &[S],
    deny_list: &[S],
) -> Result<ScanReport>
where
    S: AsRef<str>,
{
    let entries = fs.list_entries(root).await?;
    let candidates = classify(&entries, allowed_prefixes, deny_list);
    tracing::debug!(
        root = %root.display(),
        entries = entries.len(),
        candidates = candidates.len(),
        "classified module directory"
    );

    let resolutions = resolve_all(fs, root, &candidates).await;

    let mut report = ScanReport::default();
    for resolution in resolutions {
        report.diagnostics.extend(resolution.diagnostics);

        let Some(entry) = resolution.entry else {
            continue;
        };

        let loaded = load_plugin(loader, &entry).await;
        tracing::debug!(
            module = %entry.module,
            origin = %entry.origin,
            devices = loaded.devices.len(),
            "loaded driver"
        );
        report.devices.extend(loaded.devices);
        report.diagnostics.extend(loaded.diagnostics);
    }

    for device in &report.devices {
        tracing::debug!(
            module = %device.module,
            manufacturer = device.manufacturer.as_deref().unwrap_or("-"),
            name = device.name.as_deref().unwrap_or("-"),
            "found device"
        );
    }

    Ok(report)
}

/// Scanner preconfigured with the NEEO driver naming rules
#[derive(Clone)]
pub struct DriverScanner {
    root: PathBuf,
    fs: Arc<dyn Filesystem>,
    loader: Arc<dyn ModuleLoader>,
    allowed_prefixes: Vec<String>,
    deny_list: Vec<String>,
}

impl DriverScanner {
    /// Scanner over `root` using the local disk and subprocess loading
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_parts(
            root,
            Arc::new(LocalFilesystem),
            Arc::new(ProcessModuleLoader::default()),
        )
    }

    /// Scanner with explicit filesystem and loader capabilities
    #[must_use]
    pub fn with_parts(
        root: impl Into<PathBuf>,
        fs: Arc<dyn Filesystem>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        Self {
            root: root.into(),
            fs,
            loader,
            allowed_prefixes: DRIVER_PREFIXES.iter().map(ToString::to_string).collect(),
            deny_list: DENY_LIST.iter().map(ToString::to_string).collect(),
        }
    }

    /// Replace the module loader
    #[must_use]
    pub fn loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Module directory being scanned
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one scan
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the module directory does not exist
    pub async fn scan(&self) -> Result<ScanReport> {
        scan(
            self.fs.as_ref(),
            self.loader.as_ref(),
            &self.root,
            &self.allowed_prefixes,
            &self.deny_list,
        )
        .await
    }
}

impl std::fmt::Debug for DriverScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverScanner")
            .field("root", &self.root)
            .field("allowed_prefixes", &self.allowed_prefixes)
            .field("deny_list", &self.deny_list)
            .finish_non_exhaustive()
    }
}
