//! Package manifest (`package.json`) and entry point locations

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use super::fs::Filesystem;
use crate::{Error, Result};

/// Manifest file name inside every package directory
pub const MANIFEST_FILE: &str = "package.json";

/// Conventional entry point used by drivers without a `main` field
pub const LEGACY_ENTRY: [&str; 2] = ["devices", "index.js"];

/// Subset of `package.json` the driver host cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,
    /// Package version
    #[serde(default)]
    pub version: Option<String>,
    /// Entry point relative to the package root
    #[serde(default)]
    pub main: Option<String>,
}

impl PackageManifest {
    /// The `main` entry, if present and non-empty
    #[must_use]
    pub fn main_entry(&self) -> Option<&str> {
        self.main.as_deref().filter(|main| !main.is_empty())
    }
}

/// Entry point declared by the module's manifest
///
/// # Errors
///
/// Returns `Error::NotFound` or `Error::Parse` when the manifest cannot be
/// read, and `Error::ManifestIncomplete` when it has no `main`
pub async fn declared_path(fs: &dyn Filesystem, root: &Path, module: &str) -> Result<PathBuf> {
    let base = root.join(module);
    let manifest_path = base.join(MANIFEST_FILE);

    let value = fs.read_json(&manifest_path).await?;
    let manifest: PackageManifest =
        serde_json::from_value(value).map_err(|source| Error::Parse {
            path: manifest_path.clone(),
            source,
        })?;

    match manifest.main_entry() {
        Some(main) => Ok(join_within(&base, main)),
        None => {
            tracing::debug!(module, "main property missing from package.json");
            Err(Error::ManifestIncomplete(manifest_path))
        }
    }
}

/// Join `main` onto the package directory, keeping absolute paths inside it
fn join_within(base: &Path, main: &str) -> PathBuf {
    Path::new(main)
        .components()
        .filter(|part| matches!(part, Component::Normal(_) | Component::ParentDir))
        .fold(base.to_path_buf(), |path, part| path.join(part))
}

/// Conventional `devices/index.js` entry point of the module
#[must_use]
pub fn legacy_path(root: &Path, module: &str) -> PathBuf {
    LEGACY_ENTRY
        .iter()
        .fold(root.join(module), |path, part| path.join(part))
}
