//! Filesystem capability used by the driver scan
//!
//! Kept behind a trait so the scan never touches `std::fs` directly and
//! alternative layouts (overlays, in-memory trees) can be plugged in.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{Error, Result};

/// Read-only view of the module directory tree
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// List the entry names of a directory, sorted by name
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the directory does not exist
    async fn list_entries(&self, path: &Path) -> Result<Vec<String>>;

    /// Read and parse a JSON file
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the file is absent, `Error::Parse` if it
    /// is not valid JSON
    async fn read_json(&self, path: &Path) -> Result<serde_json::Value>;

    /// Whether something exists at the path
    async fn exists(&self, path: &Path) -> bool;

    /// Whether the path is a regular file (symlinks followed)
    ///
    /// Entry points must pass this check; a directory is never loadable.
    async fn is_file(&self, path: &Path) -> bool;
}

/// `Filesystem` backed by the local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn list_entries(&self, path: &Path) -> Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| not_found_or_io(path, e))?;

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        Ok(names)
    }

    async fn read_json(&self, path: &Path) -> Result<serde_json::Value> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| not_found_or_io(path, e))?;

        serde_json::from_str(&content).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_file(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .is_ok_and(|metadata| metadata.is_file())
    }
}

fn not_found_or_io(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::NotFound {
        Error::NotFound(PathBuf::from(path))
    } else {
        Error::Io(e)
    }
}
