//! Shared test utilities

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use neeo_cli::plugins::{DeviceCandidate, LocalFilesystem, StaticModuleLoader};
use neeo_cli::{
    BrainDescriptor, DeviceServer, DriverScanner, Error, LoadedPlugin, Result, ServerConfig,
};
use serde_json::json;

/// Write a driver package with a manifest `main` and an empty entry file
pub fn install_driver(root: &Path, module: &str, main: &str) -> PathBuf {
    let dir = root.join(module);
    std::fs::create_dir_all(&dir).expect("failed to create driver dir");
    std::fs::write(
        dir.join("package.json"),
        json!({ "name": module, "main": main }).to_string(),
    )
    .expect("failed to write manifest");

    let entry = dir.join(main);
    if let Some(parent) = entry.parent() {
        std::fs::create_dir_all(parent).expect("failed to create entry dir");
    }
    std::fs::write(&entry, "").expect("failed to write entry point");
    entry
}

/// Write a driver that only ships the legacy `devices/index.js`
pub fn install_legacy_driver(root: &Path, module: &str) -> PathBuf {
    let dir = root.join(module);
    std::fs::create_dir_all(dir.join("devices")).expect("failed to create driver dir");
    std::fs::write(dir.join("package.json"), json!({ "name": module }).to_string())
        .expect("failed to write manifest");

    let entry = dir.join("devices").join("index.js");
    std::fs::write(&entry, "").expect("failed to write entry point");
    entry
}

/// Write a package that is not a driver
pub fn install_package(root: &Path, module: &str) {
    let dir = root.join(module);
    std::fs::create_dir_all(&dir).expect("failed to create package dir");
    std::fs::write(
        dir.join("package.json"),
        json!({ "name": module, "main": "index.js" }).to_string(),
    )
    .expect("failed to write manifest");
    std::fs::write(dir.join("index.js"), "").expect("failed to write entry point");
}

/// A candidate with a working `build`
pub fn device(name: &str) -> DeviceCandidate {
    let built = json!({ "adapterName": name });
    DeviceCandidate::with_build_fn(
        json!({ "name": name, "manufacturer": "NEEO" }),
        move || Ok(built.clone()),
    )
}

/// Plugin factory exporting the named devices
pub fn exporting(names: &'static [&'static str]) -> impl Fn() -> Result<LoadedPlugin> + Send + Sync {
    move || Ok(LoadedPlugin::new(names.iter().map(|name| device(name)).collect()))
}

/// Scanner over `root` with an in-process loader
pub fn scanner(root: &Path, loader: StaticModuleLoader) -> DriverScanner {
    DriverScanner::with_parts(root, Arc::new(LocalFilesystem), Arc::new(loader))
}

/// Device server call, as recorded by `FakeServer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCall {
    Discover,
    Start { port: u16, name: String, brain: BrainDescriptor, devices: usize },
    Stop { port: u16 },
}

/// Device server that records calls instead of serving
#[derive(Debug, Default)]
pub struct FakeServer {
    pub calls: Mutex<Vec<ServerCall>>,
    pub discovered: Option<BrainDescriptor>,
}

impl FakeServer {
    /// Server whose discovery finds `brain`
    pub fn discovering(brain: BrainDescriptor) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            discovered: Some(brain),
        }
    }

    /// Calls recorded so far
    pub fn calls(&self) -> Vec<ServerCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    fn record(&self, call: ServerCall) {
        self.calls.lock().expect("calls lock poisoned").push(call);
    }
}

#[async_trait]
impl DeviceServer for FakeServer {
    async fn discover_one(&self) -> Result<BrainDescriptor> {
        self.record(ServerCall::Discover);
        self.discovered
            .clone()
            .ok_or_else(|| Error::Discovery("no NEEO Brain found".to_string()))
    }

    async fn start(&self, config: &ServerConfig) -> Result<()> {
        self.record(ServerCall::Start {
            port: config.port,
            name: config.name.clone(),
            brain: config.brain.clone(),
            devices: config.devices.len(),
        });
        Ok(())
    }

    async fn stop(&self, config: &ServerConfig) -> Result<()> {
        self.record(ServerCall::Stop { port: config.port });
        Ok(())
    }
}
