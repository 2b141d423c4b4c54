//! Project manifest options
//!
//! Reads the `neeoSdkOptions` object from `<project>/package.json`. All
//! fields are optional; a missing or unreadable manifest yields no options.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Manifest key holding the SDK options
pub const OPTIONS_KEY: &str = "neeoSdkOptions";

/// `neeoSdkOptions` schema
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOptions {
    /// Device server name announced to the Brain
    pub server_name: Option<String>,

    /// Device server port
    pub server_port: Option<PortValue>,

    /// Address the Brain should use to reach the device server
    pub server_ip: Option<String>,

    /// Base URL override for the device server
    #[serde(rename = "serverBaseURL")]
    pub server_base_url: Option<String>,

    /// Brain host
    pub brain_host: Option<String>,

    /// Brain port
    pub brain_port: Option<PortValue>,
}

/// Port as written in JSON: either `6336` or `"6336"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u64),
    Text(String),
}

/// Load the options from the project manifest in `project_dir`
///
/// Returns `ProjectOptions::default()` if the manifest doesn't exist, can't
/// be parsed, or has no options object.
pub fn load_project_options(project_dir: &Path) -> ProjectOptions {
    let path = manifest_path(project_dir);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "failed to load package.json");
            return ProjectOptions::default();
        }
    };

    let mut manifest: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "failed to parse package.json");
            return ProjectOptions::default();
        }
    };

    let Some(options) = manifest.get_mut(OPTIONS_KEY).map(serde_json::Value::take) else {
        return ProjectOptions::default();
    };

    match serde_json::from_value(options) {
        Ok(options) => {
            tracing::debug!(path = %path.display(), "loaded sdk options from package.json");
            options
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "invalid {OPTIONS_KEY} in package.json, ignoring"
            );
            ProjectOptions::default()
        }
    }
}

/// Return the project manifest path: `<project>/package.json`
#[must_use]
pub fn manifest_path(project_dir: &Path) -> PathBuf {
    project_dir.join("package.json")
}
