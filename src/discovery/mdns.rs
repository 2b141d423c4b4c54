//! mDNS Brain discovery
//!
//! Browses the local network for NEEO Brains using mDNS (multicast DNS) and
//! returns the first one that resolves.
//!
//! Service type: `_neeo._tcp.local.`
//! Instance name: the Brain's name (e.g. `NEEO-1a2b3c4d`)

use std::time::{Duration, Instant};

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};

use crate::server::BrainDescriptor;
use crate::{Error, Result};

/// mDNS service type announced by NEEO Brains
pub const SERVICE_TYPE: &str = "_neeo._tcp.local.";

/// How long to browse before giving up
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// mDNS browser for NEEO Brains
pub struct BrainBrowser {
    timeout: Duration,
}

impl Default for BrainBrowser {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_TIMEOUT)
    }
}

impl BrainBrowser {
    /// Create a browser that gives up after `timeout`
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Find the first Brain on the local network
    ///
    /// # Errors
    ///
    /// Returns `Error::Discovery` if the mDNS daemon cannot be created or no
    /// Brain answers before the timeout
    pub async fn discover_one(&self) -> Result<BrainDescriptor> {
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || browse_blocking(timeout))
            .await
            .map_err(|e| Error::Discovery(format!("discovery task failed: {e}")))?
    }
}

fn browse_blocking(timeout: Duration) -> Result<BrainDescriptor> {
    let daemon = ServiceDaemon::new()
        .map_err(|e| Error::Discovery(format!("failed to create mDNS daemon: {e}")))?;

    let receiver = daemon
        .browse(SERVICE_TYPE)
        .map_err(|e| Error::Discovery(format!("failed to browse {SERVICE_TYPE}: {e}")))?;

    let deadline = Instant::now() + timeout;
    let mut found = None;

    while found.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        match receiver.recv_timeout(remaining) {
            Ok(ServiceEvent::ServiceResolved(info)) => {
                found = brain_from_service(&info);
                if found.is_none() {
                    tracing::debug!(service = info.get_fullname(), "resolved service has no address");
                }
            }
            Ok(event) => tracing::trace!(?event, "mDNS event"),
            Err(_) => break,
        }
    }

    if let Err(e) = daemon.stop_browse(SERVICE_TYPE) {
        tracing::trace!(error = %e, "failed to stop mDNS browse");
    }
    if let Err(e) = daemon.shutdown() {
        tracing::trace!(error = %e, "mDNS daemon shutdown error (expected on normal exit)");
    }

    found.ok_or_else(|| {
        Error::Discovery(format!("no NEEO Brain found within {}s", timeout.as_secs()))
    })
}

fn brain_from_service(info: &ServiceInfo) -> Option<BrainDescriptor> {
    let host = info.get_addresses().iter().next()?.to_string();
    Some(BrainDescriptor {
        name: Some(instance_name(info.get_fullname()).to_string()),
        host,
        port: info.get_port(),
    })
}

/// Instance part of a full service name (`NEEO-1234._neeo._tcp.local.` → `NEEO-1234`)
fn instance_name(fullname: &str) -> &str {
    fullname
        .strip_suffix(SERVICE_TYPE)
        .map_or(fullname, |name| name.trim_end_matches('.'))
}
