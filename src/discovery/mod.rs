//! Brain discovery using mDNS/DNS-SD
//!
//! Used when no Brain host is configured, so drivers can be started without
//! manual network setup

pub mod mdns;

pub use mdns::BrainBrowser;
