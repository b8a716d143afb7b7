//! Snapshot reconciliation and discovery events.
//!
//! The reconciler is the exclusive owner of the retained device set. Each
//! cycle it diffs a fresh enumeration snapshot against that set, keyed by
//! port name, and emits:
//!
//! - one `Connected`/`Disconnected` event per appearing/vanishing device,
//! - at most one aggregate `Changed` event per cycle, carrying a cloned
//!   snapshot, iff anything changed at all.
//!
//! A device present in both sets whose status alone differs is updated in
//! place on the retained instance. That feeds the aggregate notification but
//! deliberately not the discrete events, so observers can distinguish a
//! coarse list refresh from an actual plug/unplug.

use super::{DiscoveredDevice, PortStatus};

/// A discrete or aggregate discovery notification.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryEvent {
    /// A device appeared on a port not seen in the previous cycle.
    Connected(DiscoveredDevice),
    /// A previously seen port vanished.
    Disconnected(DiscoveredDevice),
    /// Something changed this cycle; carries the full retained snapshot.
    Changed(Vec<DiscoveredDevice>),
}

/// Owns the retained device set and diffs snapshots against it.
#[derive(Debug, Default)]
pub struct Reconciler {
    retained: Vec<DiscoveredDevice>,
}

impl Reconciler {
    /// An empty reconciler; the first non-empty snapshot connects everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cloned snapshot of the retained set. The retained instances are
    /// never handed out directly.
    pub fn snapshot(&self) -> Vec<DiscoveredDevice> {
        self.retained.clone()
    }

    /// Diff `current` against the retained set and return the events of this
    /// cycle, ending with the aggregate `Changed` when anything moved.
    pub fn reconcile(&mut self, current: Vec<DiscoveredDevice>) -> Vec<DiscoveryEvent> {
        let mut events = Vec::new();
        let mut changed = false;

        // Vanished ports first.
        let mut kept = Vec::with_capacity(self.retained.len());
        for device in self.retained.drain(..) {
            if current.iter().any(|c| c.port_name == device.port_name) {
                kept.push(device);
            } else {
                tracing::info!(port = %device.port_name, "board disconnected");
                changed = true;
                events.push(DiscoveryEvent::Disconnected(device));
            }
        }
        self.retained = kept;

        // New ports and in-place status deltas.
        for device in current {
            match self
                .retained
                .iter_mut()
                .find(|r| r.port_name == device.port_name)
            {
                Some(existing) => {
                    if existing.status != device.status {
                        existing.status = device.status;
                        changed = true;
                    }
                }
                None => {
                    tracing::info!(
                        port = %device.port_name,
                        board = device.board_kind.label(),
                        "board connected"
                    );
                    self.retained.push(device.clone());
                    changed = true;
                    events.push(DiscoveryEvent::Connected(device));
                }
            }
        }

        if changed {
            events.push(DiscoveryEvent::Changed(self.snapshot()));
        }
        events
    }

    /// Force the status of a retained device, recording `error` detail.
    /// Used by connection management; returns false when the port is not in
    /// the retained set.
    pub fn mark_status(
        &mut self,
        port_name: &str,
        status: PortStatus,
        error: Option<String>,
    ) -> bool {
        match self.retained.iter_mut().find(|d| d.port_name == port_name) {
            Some(device) => {
                device.status = status;
                device.error = error;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardKind;

    fn device(port: &str, status: PortStatus) -> DiscoveredDevice {
        DiscoveredDevice {
            port_name: port.to_string(),
            board_kind: BoardKind::ProMicro,
            status,
            vendor_id: 0x2341,
            product_id: 0x8036,
            description: None,
            error: None,
        }
    }

    #[test]
    fn first_snapshot_connects_every_device() {
        let mut reconciler = Reconciler::new();
        let events = reconciler.reconcile(vec![
            device("COM3", PortStatus::Available),
            device("COM4", PortStatus::Busy),
        ]);

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], DiscoveryEvent::Connected(d) if d.port_name == "COM3"));
        assert!(matches!(&events[1], DiscoveryEvent::Connected(d) if d.port_name == "COM4"));
        assert!(matches!(&events[2], DiscoveryEvent::Changed(list) if list.len() == 2));
    }

    #[test]
    fn identical_snapshot_is_a_silent_cycle() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(vec![device("COM3", PortStatus::Available)]);
        let events = reconciler.reconcile(vec![device("COM3", PortStatus::Available)]);
        assert!(events.is_empty());
    }

    #[test]
    fn overlap_produces_exactly_one_disconnect_one_connect_one_changed() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(vec![
            device("A", PortStatus::Available),
            device("B", PortStatus::Available),
        ]);

        let events = reconciler.reconcile(vec![
            device("B", PortStatus::Available),
            device("C", PortStatus::Available),
        ]);

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], DiscoveryEvent::Disconnected(d) if d.port_name == "A"));
        assert!(matches!(&events[1], DiscoveryEvent::Connected(d) if d.port_name == "C"));
        match &events[2] {
            DiscoveryEvent::Changed(list) => {
                let ports: Vec<&str> = list.iter().map(|d| d.port_name.as_str()).collect();
                assert_eq!(ports, vec!["B", "C"]);
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn status_delta_updates_in_place_without_discrete_events() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(vec![device("COM3", PortStatus::Available)]);

        // Keep a marker on the retained instance to prove it survives.
        reconciler.retained[0].description = Some("marker".to_string());

        let events = reconciler.reconcile(vec![device("COM3", PortStatus::Busy)]);
        assert_eq!(events.len(), 1);
        match &events[0] {
            DiscoveryEvent::Changed(list) => {
                assert_eq!(list[0].status, PortStatus::Busy);
                assert_eq!(list[0].description.as_deref(), Some("marker"));
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_returns_clones() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(vec![device("COM3", PortStatus::Available)]);

        let mut snapshot = reconciler.snapshot();
        snapshot[0].status = PortStatus::Error;
        assert_eq!(reconciler.snapshot()[0].status, PortStatus::Available);
    }

    #[test]
    fn mark_status_targets_retained_devices_only() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(vec![device("COM3", PortStatus::Available)]);

        assert!(reconciler.mark_status("COM3", PortStatus::Connected, None));
        assert_eq!(reconciler.snapshot()[0].status, PortStatus::Connected);
        assert!(!reconciler.mark_status("COM9", PortStatus::Error, None));
    }
}
