//! Board discovery: enumeration, probing, reconciliation, scheduling.
//!
//! The discovery pipeline runs independently of the configuration lifecycle:
//!
//! 1. [`enumerate::DeviceEnumerator`] takes a one-shot snapshot of the host's
//!    serial devices, filters them by USB signature, and probes each port's
//!    availability.
//! 2. [`reconcile::Reconciler`] diffs the snapshot against the retained
//!    device set and produces discrete connect/disconnect events plus one
//!    aggregate list-changed notification per cycle.
//! 3. [`service::DiscoveryService`] drives the two on a fixed interval while
//!    monitoring is active, supports on-demand refresh, and manages the one
//!    active board connection.
//!
//! Device identity across cycles is the port name. External readers only
//! ever see cloned snapshots of the retained set.

pub mod enumerate;
pub mod probe;
pub mod reconcile;
pub mod service;

pub use enumerate::{DeviceEnumerator, HostPort, PortSource, UsbInfo};
#[cfg(feature = "serial")]
pub use enumerate::SystemPortSource;
pub use probe::PortProber;
#[cfg(feature = "serial")]
pub use probe::SerialProber;
pub use reconcile::{DiscoveryEvent, Reconciler};
pub use service::DiscoveryService;

use crate::board::BoardKind;

/// Availability of a discovered port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    /// The port opened and closed cleanly; nothing is using it.
    Available,
    /// Another process holds the port.
    Busy,
    /// The port could not be opened for some other reason.
    Error,
    /// This application holds the port open. Applies to at most one device.
    Connected,
}

impl PortStatus {
    /// Human-readable status label.
    pub fn label(&self) -> &'static str {
        match self {
            PortStatus::Available => "Available",
            PortStatus::Busy => "Port Busy",
            PortStatus::Error => "Error",
            PortStatus::Connected => "Connected",
        }
    }
}

/// A host-visible serial device that survived signature filtering.
///
/// Rebuilt from scratch every scan cycle. The reconciler mutates `status` in
/// place on a retained instance when that is the only field that changed,
/// so observers keep a stable view of the device across cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDevice {
    /// Port name, the device's identity across cycles.
    pub port_name: String,
    pub board_kind: BoardKind,
    pub status: PortStatus,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Free-text description from the USB descriptor, when present.
    pub description: Option<String>,
    /// Failure detail for `Busy`/`Error` statuses.
    pub error: Option<String>,
}

impl DiscoveredDevice {
    /// Status string for list views: the error detail when present,
    /// otherwise the status label.
    pub fn status_text(&self) -> String {
        match (&self.status, &self.error) {
            (PortStatus::Error, Some(detail)) => detail.clone(),
            (status, _) => status.label().to_string(),
        }
    }
}
