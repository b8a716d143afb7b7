//! One-shot enumeration of candidate boards.
//!
//! A scan walks the host's serial device list, keeps only USB devices whose
//! (vendor id, product id) pair survives signature filtering, classifies the
//! board kind, and probes each accepted port's availability. The result is a
//! snapshot; callers treat it as a set keyed by port name, and ordering
//! carries no meaning.
//!
//! The host listing sits behind [`PortSource`] so tests can script arbitrary
//! device populations without hardware.

use super::probe::PortProber;
use super::DiscoveredDevice;
use crate::board;
use crate::error::AppResult;

/// USB metadata of a host serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbInfo {
    pub vid: u16,
    pub pid: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// One entry of the host's serial device list. Non-USB ports (PCI,
/// Bluetooth) report no `usb` metadata and are rejected by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    pub name: String,
    pub usb: Option<UsbInfo>,
}

/// Source of the host's serial device list.
pub trait PortSource: Send + Sync {
    /// List the serial-capable devices currently visible to the host.
    fn list_ports(&self) -> AppResult<Vec<HostPort>>;
}

/// Port source backed by the host serial driver.
#[cfg(feature = "serial")]
#[derive(Debug, Default)]
pub struct SystemPortSource;

#[cfg(feature = "serial")]
impl PortSource for SystemPortSource {
    fn list_ports(&self) -> AppResult<Vec<HostPort>> {
        let ports = serialport::available_ports()
            .map_err(|err| crate::error::PanelError::Port(err.to_string()))?;
        Ok(ports
            .into_iter()
            .map(|info| {
                let usb = match info.port_type {
                    serialport::SerialPortType::UsbPort(usb) => Some(UsbInfo {
                        vid: usb.vid,
                        pid: usb.pid,
                        manufacturer: usb.manufacturer,
                        product: usb.product,
                    }),
                    _ => None,
                };
                HostPort {
                    name: info.port_name,
                    usb,
                }
            })
            .collect())
    }
}

/// Scans the host for candidate boards.
pub struct DeviceEnumerator {
    source: Box<dyn PortSource>,
    prober: Box<dyn PortProber>,
}

impl DeviceEnumerator {
    /// Enumerator over explicit source and prober implementations.
    pub fn new(source: Box<dyn PortSource>, prober: Box<dyn PortProber>) -> Self {
        Self { source, prober }
    }

    /// Enumerator backed by the host serial driver.
    #[cfg(feature = "serial")]
    pub fn system() -> Self {
        Self::new(
            Box::new(SystemPortSource),
            Box::new(super::probe::SerialProber),
        )
    }

    /// Take one snapshot of the candidate boards visible right now.
    ///
    /// Devices without USB metadata are skipped, as are devices whose vendor
    /// survives neither the signature table nor the accepted-vendor list.
    /// Each accepted device is probed for availability; the probe's own
    /// failure shows up as the device's status, never as a scan error.
    pub fn scan(&self) -> AppResult<Vec<DiscoveredDevice>> {
        let mut devices = Vec::new();

        for port in self.source.list_ports()? {
            let Some(usb) = port.usb else {
                tracing::debug!(port = %port.name, "skipping non-USB port");
                continue;
            };
            let Some(board_kind) = board::classify(usb.vid, usb.pid) else {
                tracing::debug!(
                    port = %port.name,
                    vid = usb.vid,
                    pid = usb.pid,
                    "skipping unrecognized device"
                );
                continue;
            };

            let status = self.prober.probe(&port.name);
            devices.push(DiscoveredDevice {
                port_name: port.name,
                board_kind,
                status,
                vendor_id: usb.vid,
                product_id: usb.pid,
                description: usb.product.or(usb.manufacturer),
                error: None,
            });
        }

        Ok(devices)
    }
}
