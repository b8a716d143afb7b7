//! Port availability probing.
//!
//! A probe answers one question: can this port be opened right now? It does
//! a momentary open and drops the handle on every exit path. The probe
//! handle is never the one used for an application connection; see
//! `service` for connection management.

use super::PortStatus;

/// Baud rate used for probe opens. Nothing is transmitted, so the value only
/// needs to be one the driver accepts.
#[cfg(feature = "serial")]
const PROBE_BAUD: u32 = 9600;

#[cfg(feature = "serial")]
const PROBE_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(250);

/// Availability classification for a named port.
///
/// Implementations must not retain the port: the handle is opened and closed
/// within the call. Access-denied maps to [`PortStatus::Busy`], any other
/// failure to [`PortStatus::Error`], success to [`PortStatus::Available`].
pub trait PortProber: Send + Sync {
    /// Classify `port_name` without holding it open.
    fn probe(&self, port_name: &str) -> PortStatus;
}

/// Prober backed by the host serial driver.
#[cfg(feature = "serial")]
#[derive(Debug, Default)]
pub struct SerialProber;

#[cfg(feature = "serial")]
impl PortProber for SerialProber {
    fn probe(&self, port_name: &str) -> PortStatus {
        match serialport::new(port_name, PROBE_BAUD)
            .timeout(PROBE_TIMEOUT)
            .open()
        {
            // Dropping the handle closes the port.
            Ok(_port) => PortStatus::Available,
            Err(err) => {
                let status = match err.kind() {
                    serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                        PortStatus::Busy
                    }
                    _ => PortStatus::Error,
                };
                tracing::debug!(port = port_name, %err, status = status.label(), "probe failed");
                status
            }
        }
    }
}
