//! Driver entry point resolution
//!
//! Each candidate is resolved independently: the manifest's `main` entry is
//! tried first, then the conventional `devices/index.js`. A failure in one
//! candidate never affects another.

use std::fmt;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde::Serialize;

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::fs::Filesystem;
use super::manifest::{declared_path, legacy_path};
use crate::Error;

/// Where an entry point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    /// Manifest `main` field
    Declared,
    /// Conventional `devices/index.js`, deprecated
    Legacy,
}

impl fmt::Display for EntryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "declared"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// An existing, loadable entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Module the entry point belongs to
    pub module: String,
    /// Absolute path to the entry point
    pub path: PathBuf,
    /// How it was found
    pub origin: EntryOrigin,
}

/// Result of resolving one candidate
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Candidate module name
    pub module: String,
    /// Chosen entry point, if any
    pub entry: Option<ResolvedPath>,
    /// Deprecation warning or resolution error
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve the entry point of a single candidate
pub async fn resolve_driver(fs: &dyn Filesystem, root: &Path, module: &str) -> Resolution {
    // Manifest `main` first
    let (declared, cause) = match declared_path(fs, root, module).await {
        Ok(path) => {
            if fs.is_file(&path).await {
                return Resolution::found(module, path, EntryOrigin::Declared, Vec::new());
            }
            if fs.exists(&path).await {
                tracing::debug!(module, path = %path.display(), "declared entry point is not a file");
            } else {
                tracing::debug!(module, path = %path.display(), "declared entry point does not exist");
            }
            (Some(path.clone()), Error::NotFound(path))
        }
        Err(e) => {
            tracing::debug!(module, error = %e, "declared entry point unavailable");
            (None, e)
        }
    };

    // Then the conventional location, with a deprecation warning
    let legacy = legacy_path(root, module);
    if fs.is_file(&legacy).await {
        tracing::debug!(module, path = %legacy.display(), "using legacy path");
        let warning = Diagnostic::warning(
            module,
            DiagnosticKind::LegacyEntryPoint {
                path: legacy.clone(),
            },
            format!("loading driver from legacy devices/index.js for {module}"),
        );
        return Resolution::found(module, legacy, EntryOrigin::Legacy, vec![warning]);
    }

    // Neither resolved: drop the candidate
    let error = Diagnostic::error(
        module,
        DiagnosticKind::Unresolvable {
            declared,
            legacy: legacy.clone(),
        },
        format!(
            "no entry point for {module}: {cause}; legacy {} does not exist",
            legacy.display()
        ),
    );

    Resolution {
        module: module.to_string(),
        entry: None,
        diagnostics: vec![error],
    }
}

impl Resolution {
    fn found(module: &str, path: PathBuf, origin: EntryOrigin, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            module: module.to_string(),
            entry: Some(ResolvedPath {
                module: module.to_string(),
                path,
                origin,
            }),
            diagnostics,
        }
    }
}

/// Resolve all candidates concurrently, keeping candidate order
pub async fn resolve_all(fs: &dyn Filesystem, root: &Path, modules: &[String]) -> Vec<Resolution> {
    join_all(
        modules
            .iter()
            .map(|module| resolve_driver(fs, root, module)),
    )
    .await
}
