//! Configuration management for the driver host
//!
//! Options come from the project manifest and are overridden by environment
//! variables (env > package.json > unset). Defaults are applied only when the
//! device server configuration is built.

pub mod file;

use std::path::Path;

use serde::Serialize;

use self::file::{PortValue, load_project_options};
use crate::{Error, Result};

/// Device server port used when none is configured
pub const DEFAULT_SERVER_PORT: u16 = 6336;

/// Device server name used when none is configured
pub const DEFAULT_SERVER_NAME: &str = "default";

/// Brain API port used when only a host is configured
pub const DEFAULT_BRAIN_PORT: u16 = 3000;

pub const ENV_SERVER_NAME: &str = "NEEO_SERVER_NAME";
pub const ENV_SERVER_PORT: &str = "NEEO_SERVER_PORT";
pub const ENV_SERVER_IP: &str = "NEEO_SERVER_IP";
pub const ENV_SERVER_BASE_URL: &str = "NEEO_SERVER_BASEURL";
pub const ENV_BRAIN_HOST: &str = "NEEO_HOST_IP";
pub const ENV_BRAIN_PORT: &str = "NEEO_HOST_PORT";

/// Older brain host variable, consulted last
pub const ENV_LEGACY_BRAIN_HOST: &str = "BRAINIP";

/// Flat SDK options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkOptions {
    /// Device server name
    pub server_name: Option<String>,

    /// Device server port
    pub server_port: Option<u16>,

    /// Address advertised for the device server
    pub server_ip: Option<String>,

    /// Base URL override for the device server
    #[serde(rename = "serverBaseURL")]
    pub server_base_url: Option<String>,

    /// Brain host; discovery is used when unset
    pub brain_host: Option<String>,

    /// Brain port
    pub brain_port: Option<u16>,
}

impl SdkOptions {
    /// Load options for the project in `project_dir`
    ///
    /// `env` looks up an environment variable; empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a port is not a valid port number
    pub fn load<F>(project_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|value| !value.is_empty());
        let project = load_project_options(project_dir);

        let server_port = match env(ENV_SERVER_PORT) {
            Some(value) => Some(parse_port(ENV_SERVER_PORT, &value)?),
            None => project
                .server_port
                .map(|port| port_from_value("serverPort", &port))
                .transpose()?,
        };

        let brain_port = match env(ENV_BRAIN_PORT) {
            Some(value) => Some(parse_port(ENV_BRAIN_PORT, &value)?),
            None => project
                .brain_port
                .map(|port| port_from_value("brainPort", &port))
                .transpose()?,
        };

        let brain_host = env(ENV_BRAIN_HOST)
            .or_else(|| project.brain_host.filter(|host| !host.is_empty()))
            .or_else(|| env(ENV_LEGACY_BRAIN_HOST));

        Ok(Self {
            server_name: env(ENV_SERVER_NAME).or(project.server_name),
            server_port,
            server_ip: env(ENV_SERVER_IP).or(project.server_ip),
            server_base_url: env(ENV_SERVER_BASE_URL).or(project.server_base_url),
            brain_host,
            brain_port,
        })
    }
}

/// Load options for `project_dir` using the process environment
///
/// # Errors
///
/// Returns `Error::Config` if a configured port is invalid
pub fn load_sdk_options(project_dir: &Path) -> Result<SdkOptions> {
    SdkOptions::load(project_dir, |key| std::env::var(key).ok())
}

fn port_from_value(key: &str, value: &PortValue) -> Result<u16> {
    match value {
        PortValue::Number(n) => u16::try_from(*n)
            .map_err(|_| Error::Config(format!("{key} out of range: {n}"))),
        PortValue::Text(text) => parse_port(key, text),
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} is not a valid port: {value:?}")))
}
