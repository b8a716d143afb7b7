//! Integration tests for the discovery pipeline: scripted host listings
//! driven through the public service API, asserting the exact event stream
//! observers rely on.

use panelforge::board::BoardKind;
use panelforge::discovery::{
    DeviceEnumerator, DiscoveryEvent, DiscoveryService, HostPort, PortProber, PortSource,
    PortStatus, UsbInfo,
};
use panelforge::error::AppResult;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Replays scripted host listings in order, then repeats the final one.
struct Script {
    listings: Mutex<VecDeque<Vec<HostPort>>>,
    last: Mutex<Vec<HostPort>>,
}

impl Script {
    fn new(listings: Vec<Vec<HostPort>>) -> Self {
        Self {
            listings: Mutex::new(listings.into()),
            last: Mutex::new(Vec::new()),
        }
    }
}

impl PortSource for Script {
    fn list_ports(&self) -> AppResult<Vec<HostPort>> {
        let next = self.listings.lock().unwrap().pop_front();
        match next {
            Some(listing) => {
                *self.last.lock().unwrap() = listing.clone();
                Ok(listing)
            }
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

/// Probe results keyed by port name; unlisted ports read as available.
struct ScriptedProber {
    busy: Vec<String>,
}

impl PortProber for ScriptedProber {
    fn probe(&self, port_name: &str) -> PortStatus {
        if self.busy.iter().any(|p| p == port_name) {
            PortStatus::Busy
        } else {
            PortStatus::Available
        }
    }
}

fn pro_micro(name: &str) -> HostPort {
    HostPort {
        name: name.to_string(),
        usb: Some(UsbInfo {
            vid: 0x2341,
            pid: 0x8036,
            manufacturer: Some("Arduino LLC".to_string()),
            product: Some("Arduino Micro".to_string()),
        }),
    }
}

fn mega(name: &str) -> HostPort {
    HostPort {
        name: name.to_string(),
        usb: Some(UsbInfo {
            vid: 0x2341,
            pid: 0x0042,
            manufacturer: None,
            product: Some("Arduino Mega 2560".to_string()),
        }),
    }
}

fn service_for(listings: Vec<Vec<HostPort>>, busy: Vec<String>) -> DiscoveryService {
    DiscoveryService::new(DeviceEnumerator::new(
        Box::new(Script::new(listings)),
        Box::new(ScriptedProber { busy }),
    ))
}

fn drain(rx: &mut broadcast::Receiver<DiscoveryEvent>) -> Vec<DiscoveryEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn a_stable_host_produces_one_event_burst_then_silence() {
    let service = service_for(vec![vec![pro_micro("/dev/ttyACM0")]], vec![]);
    let mut rx = service.subscribe();

    service.refresh_now().await;
    let first = drain(&mut rx);
    assert_eq!(first.len(), 2);
    assert!(matches!(&first[0], DiscoveryEvent::Connected(d) if d.port_name == "/dev/ttyACM0"));
    assert!(matches!(&first[1], DiscoveryEvent::Changed(_)));

    // No hardware change: a second refresh is completely silent.
    service.refresh_now().await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn swapping_one_board_for_another_yields_exactly_three_events() {
    let service = service_for(
        vec![
            vec![pro_micro("/dev/ttyACM0"), mega("/dev/ttyACM1")],
            vec![mega("/dev/ttyACM1"), pro_micro("/dev/ttyACM2")],
        ],
        vec![],
    );
    let mut rx = service.subscribe();

    service.refresh_now().await;
    drain(&mut rx);

    service.refresh_now().await;
    let events = drain(&mut rx);
    assert_eq!(events.len(), 3);
    assert!(
        matches!(&events[0], DiscoveryEvent::Disconnected(d) if d.port_name == "/dev/ttyACM0")
    );
    assert!(matches!(&events[1], DiscoveryEvent::Connected(d) if d.port_name == "/dev/ttyACM2"));
    match &events[2] {
        DiscoveryEvent::Changed(devices) => {
            let ports: Vec<&str> = devices.iter().map(|d| d.port_name.as_str()).collect();
            assert_eq!(ports, vec!["/dev/ttyACM1", "/dev/ttyACM2"]);
        }
        other => panic!("expected aggregate Changed, got {other:?}"),
    }

    // The surviving board kept its identity through the swap.
    let devices = service.devices().await;
    let survivor = devices
        .iter()
        .find(|d| d.port_name == "/dev/ttyACM1")
        .unwrap();
    assert_eq!(survivor.board_kind, BoardKind::Mega2560);
    assert_eq!(survivor.description.as_deref(), Some("Arduino Mega 2560"));
}

#[tokio::test]
async fn a_status_flip_reports_only_the_aggregate_change() {
    let listing = vec![pro_micro("/dev/ttyACM0")];
    let service = DiscoveryService::new(DeviceEnumerator::new(
        Box::new(Script::new(vec![listing.clone(), listing])),
        Box::new(FlippingProber {
            calls: Mutex::new(0),
        }),
    ));
    let mut rx = service.subscribe();

    service.refresh_now().await;
    drain(&mut rx);

    service.refresh_now().await;
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiscoveryEvent::Changed(devices) => {
            assert_eq!(devices[0].status, PortStatus::Busy);
        }
        other => panic!("expected aggregate Changed, got {other:?}"),
    }
}

/// Available on the first probe, busy afterwards.
struct FlippingProber {
    calls: Mutex<u32>,
}

impl PortProber for FlippingProber {
    fn probe(&self, _port_name: &str) -> PortStatus {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == 1 {
            PortStatus::Available
        } else {
            PortStatus::Busy
        }
    }
}

#[tokio::test]
async fn busy_ports_are_reported_not_hidden() {
    let service = service_for(
        vec![vec![pro_micro("/dev/ttyACM0"), pro_micro("/dev/ttyACM1")]],
        vec!["/dev/ttyACM1".to_string()],
    );
    service.refresh_now().await;

    let devices = service.devices().await;
    assert_eq!(devices.len(), 2);
    let busy = devices
        .iter()
        .find(|d| d.port_name == "/dev/ttyACM1")
        .unwrap();
    assert_eq!(busy.status, PortStatus::Busy);
    assert_eq!(busy.status_text(), "Port Busy");
}
