//! Discovery scheduling and board connection management.
//!
//! [`DiscoveryService`] drives the enumerate-then-reconcile cycle on a fixed
//! interval while monitoring is active, and exposes the same cycle as an
//! on-demand refresh. Cycles are serialized through the reconciler's async
//! mutex: a scheduled tick that finds a cycle still in flight is skipped
//! rather than overlapped, while an explicit refresh waits its turn.
//!
//! Cycle failures (the host enumeration erroring, the scan task dying) are
//! logged and count as no-change cycles; nothing stops the scheduler except
//! [`DiscoveryService::stop`].
//!
//! The service also owns the one active board connection. The connection
//! handle is opened fresh and is never the handle probes use. While a
//! connection is held, its port reports [`PortStatus::Connected`] in every
//! snapshot (a fresh probe of a port we hold would read as busy).

use super::enumerate::DeviceEnumerator;
use super::reconcile::{DiscoveryEvent, Reconciler};
use super::DiscoveredDevice;
#[cfg(any(feature = "serial", test))]
use super::PortStatus;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[cfg(feature = "serial")]
use crate::error::{AppResult, PanelError};

/// Fixed period between scheduled reconciliation cycles.
pub const SCAN_INTERVAL: Duration = Duration::from_secs(2);

const EVENT_CAPACITY: usize = 64;

#[cfg(feature = "serial")]
struct ActiveConnection {
    port_name: String,
    /// Held open for the lifetime of the connection; dropping it closes
    /// the port.
    _handle: Box<dyn serialport::SerialPort>,
}

struct ServiceInner {
    enumerator: DeviceEnumerator,
    /// Guards the retained set; doubles as the cycle lock.
    reconciler: tokio::sync::Mutex<Reconciler>,
    events: broadcast::Sender<DiscoveryEvent>,
    monitor: Mutex<Option<tokio::task::JoinHandle<()>>>,
    #[cfg(feature = "serial")]
    active: Mutex<Option<ActiveConnection>>,
}

/// Periodic board discovery plus the active connection.
///
/// Constructed once at composition time and shared by handle; there is no
/// ambient global instance. All methods that touch the retained set are
/// async because they queue behind the cycle lock.
pub struct DiscoveryService {
    inner: Arc<ServiceInner>,
}

impl DiscoveryService {
    /// Service over an explicit enumerator (tests inject scripted sources).
    pub fn new(enumerator: DeviceEnumerator) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ServiceInner {
                enumerator,
                reconciler: tokio::sync::Mutex::new(Reconciler::new()),
                events,
                monitor: Mutex::new(None),
                #[cfg(feature = "serial")]
                active: Mutex::new(None),
            }),
        }
    }

    /// Service backed by the host serial driver.
    #[cfg(feature = "serial")]
    pub fn with_system_ports() -> Self {
        Self::new(DeviceEnumerator::system())
    }

    /// Subscribe to discovery notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.inner.events.subscribe()
    }

    /// Cloned snapshot of the currently retained device list.
    pub async fn devices(&self) -> Vec<DiscoveredDevice> {
        self.inner.reconciler.lock().await.snapshot()
    }

    /// True while the periodic monitor is running.
    pub fn is_monitoring(&self) -> bool {
        self.inner.monitor.lock().is_some()
    }

    /// Start periodic monitoring. The first cycle runs immediately, then
    /// every [`SCAN_INTERVAL`]. A no-op when already monitoring. Must be
    /// called within a Tokio runtime.
    pub fn start(&self) {
        let mut monitor = self.inner.monitor.lock();
        if monitor.is_some() {
            return;
        }
        tracing::info!("board monitoring started");
        let inner = Arc::clone(&self.inner);
        *monitor = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SCAN_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // A cycle still in flight means this tick is dropped, not
                // queued: the retained set is not safe for overlapped cycles.
                match inner.reconciler.try_lock() {
                    Ok(mut reconciler) => run_cycle(&inner, &mut reconciler).await,
                    Err(_) => {
                        tracing::debug!("discovery cycle still in flight, skipping tick");
                    }
                }
            }
        }));
    }

    /// Stop periodic monitoring. A no-op when not monitoring.
    pub fn stop(&self) {
        if let Some(task) = self.inner.monitor.lock().take() {
            task.abort();
            tracing::info!("board monitoring stopped");
        }
    }

    /// Run one reconciliation cycle now, with the same semantics as a
    /// scheduled tick. Waits for any in-flight cycle to finish first.
    pub async fn refresh_now(&self) {
        let mut reconciler = self.inner.reconciler.lock().await;
        run_cycle(&self.inner, &mut reconciler).await;
    }

    /// The port of the actively connected board, if any.
    #[cfg(feature = "serial")]
    pub fn active_port(&self) -> Option<String> {
        self.inner
            .active
            .lock()
            .as_ref()
            .map(|conn| conn.port_name.clone())
    }

    /// Open `port_name` as the active board connection (8N1, no flow
    /// control), replacing any previous connection. On success the retained
    /// device reports [`PortStatus::Connected`] until `disconnect`.
    #[cfg(feature = "serial")]
    pub async fn connect(&self, port_name: &str, baud_rate: u32) -> AppResult<()> {
        let name = port_name.to_string();
        let opened = tokio::task::spawn_blocking(move || {
            serialport::new(&name, baud_rate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .flow_control(serialport::FlowControl::None)
                .timeout(Duration::from_millis(1000))
                .open()
        })
        .await
        .map_err(|err| PanelError::Port(err.to_string()))?;

        match opened {
            Ok(handle) => {
                *self.inner.active.lock() = Some(ActiveConnection {
                    port_name: port_name.to_string(),
                    _handle: handle,
                });
                tracing::info!(port = port_name, baud = baud_rate, "board connected");
                self.mark_and_notify(port_name, PortStatus::Connected, None)
                    .await;
                Ok(())
            }
            Err(err) => {
                let denied = matches!(
                    err.kind(),
                    serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied)
                );
                let status = if denied {
                    PortStatus::Busy
                } else {
                    PortStatus::Error
                };
                tracing::warn!(port = port_name, %err, "board connection failed");
                self.mark_and_notify(port_name, status, Some(err.to_string()))
                    .await;
                if denied {
                    Err(PanelError::PortUnavailable)
                } else {
                    Err(PanelError::Port(err.to_string()))
                }
            }
        }
    }

    /// Close the active connection, if any, releasing the port.
    #[cfg(feature = "serial")]
    pub async fn disconnect(&self) {
        let previous = self.inner.active.lock().take();
        if let Some(connection) = previous {
            tracing::info!(port = %connection.port_name, "board disconnected by user");
            // The handle drops here, closing the port.
            self.mark_and_notify(&connection.port_name, PortStatus::Available, None)
                .await;
        }
    }

    /// Placeholder test action: verifies a connection is open but sends
    /// nothing over the wire, since no firmware protocol is implemented.
    #[cfg(feature = "serial")]
    pub fn send_test_input(&self) -> AppResult<()> {
        match self.inner.active.lock().as_ref() {
            Some(connection) => {
                tracing::info!(port = %connection.port_name, "test input requested; protocol not implemented, nothing sent");
                Ok(())
            }
            None => Err(PanelError::NotConnected),
        }
    }

    #[cfg(feature = "serial")]
    async fn mark_and_notify(&self, port_name: &str, status: PortStatus, error: Option<String>) {
        let mut reconciler = self.inner.reconciler.lock().await;
        if reconciler.mark_status(port_name, status, error) {
            let _ = self
                .inner
                .events
                .send(DiscoveryEvent::Changed(reconciler.snapshot()));
        }
    }
}

impl Drop for DiscoveryService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One enumerate-then-reconcile pass. The caller holds the cycle lock.
async fn run_cycle(inner: &Arc<ServiceInner>, reconciler: &mut Reconciler) {
    let scan_inner = Arc::clone(inner);
    let scanned = tokio::task::spawn_blocking(move || scan_inner.enumerator.scan()).await;

    #[allow(unused_mut)]
    let mut snapshot = match scanned {
        Ok(Ok(devices)) => devices,
        Ok(Err(err)) => {
            // Equivalent to a no-change cycle; the scheduler keeps running.
            tracing::warn!(%err, "discovery cycle failed");
            return;
        }
        Err(err) => {
            tracing::warn!(%err, "discovery scan task failed");
            return;
        }
    };

    // The port we hold open would probe as busy; it is connected, not
    // contended, so stamp it before diffing.
    #[cfg(feature = "serial")]
    if let Some(connection) = inner.active.lock().as_ref() {
        for device in &mut snapshot {
            if device.port_name == connection.port_name {
                device.status = PortStatus::Connected;
            }
        }
    }

    for event in reconciler.reconcile(snapshot) {
        let _ = inner.events.send(event);
    }
}
