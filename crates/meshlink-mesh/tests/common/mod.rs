//! Shared collaborators for integration tests

#![allow(dead_code)]

use meshlink_mesh::{
    BeaconChange, BeaconNotifier, ChannelTable, Collaborators, MeshConfig, MeshRxHandler, PathTable,
    PeerTable, RxStatus,
};
use meshlink_proto::frame::{fc, BEACON_FIXED_LEN};
use meshlink_proto::ie::eid;
use meshlink_proto::{Channel, Elements, MacAddr, MeshConfigElement, MeshProtocolIds, MgmtFrame};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LOCAL_ADDR: MacAddr = MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
pub const MESH_ID: &[u8] = b"backhaul";

pub fn protocol() -> MeshProtocolIds {
    MeshProtocolIds {
        path_selection: 1,
        metric: 1,
        congestion_control: 0,
        synchronization: 1,
        authentication: 0,
    }
}

pub fn mesh_config() -> MeshConfig {
    let mut config = MeshConfig::new(MESH_ID);
    config.protocol = protocol();
    config
}

/// Records every collaborator call
#[derive(Default)]
pub struct Recorder {
    pub slots_available: AtomicBool,
    pub peer_expiries: AtomicUsize,
    pub path_expiries: AtomicUsize,
    pub root_announcements: AtomicUsize,
    pub flushes: AtomicUsize,
    pub neighbours: Mutex<Vec<MacAddr>>,
    pub peering_frames: AtomicUsize,
    pub path_selection_frames: AtomicUsize,
    pub beacon_changes: Mutex<Vec<BeaconChange>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        let recorder = Recorder::default();
        recorder.slots_available.store(true, Ordering::SeqCst);
        Arc::new(recorder)
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            peers: self.clone(),
            paths: self.clone(),
            rx: self.clone(),
            beacon: self.clone(),
            channels: self.clone(),
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn beacon_changes(&self) -> Vec<BeaconChange> {
        self.beacon_changes.lock().unwrap().clone()
    }
}

impl PeerTable for Recorder {
    fn expire_inactive_peers(&self, _inactivity_limit: Duration) {
        self.peer_expiries.fetch_add(1, Ordering::SeqCst);
    }

    fn available_peer_slots(&self) -> bool {
        self.slots_available.load(Ordering::SeqCst)
    }

    fn established_peer_count(&self) -> usize {
        2
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}

impl PathTable for Recorder {
    fn expire_stale_paths(&self) {
        self.path_expiries.fetch_add(1, Ordering::SeqCst);
    }

    fn transmit_root_announcement(&self) {
        self.root_announcements.fetch_add(1, Ordering::SeqCst);
    }
}

impl MeshRxHandler for Recorder {
    fn neighbour_update(&self, sa: MacAddr, _elems: &Elements<'_>, _status: &RxStatus) {
        self.neighbours.lock().unwrap().push(sa);
    }

    fn peering_frame(&self, _frame: &MgmtFrame<'_>, _status: &RxStatus) {
        self.peering_frames.fetch_add(1, Ordering::SeqCst);
    }

    fn path_selection_frame(&self, _frame: &MgmtFrame<'_>) {
        self.path_selection_frames.fetch_add(1, Ordering::SeqCst);
    }
}

impl BeaconNotifier for Recorder {
    fn beacon_changed(&self, change: BeaconChange) {
        self.beacon_changes.lock().unwrap().push(change);
    }
}

impl ChannelTable for Recorder {
    fn channel(&self, freq: u32) -> Option<Channel> {
        match freq {
            2412 | 2437 => Some(Channel::new_2g(freq)),
            2472 => Some(Channel::new_2g(freq).disabled()),
            _ => None,
        }
    }
}

/// Beacon from `sa` advertising `mesh_id` and `protocol`
pub fn mesh_beacon(sa: MacAddr, mesh_id: &[u8], protocol: MeshProtocolIds) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&(fc::TYPE_MGMT | fc::STYPE_BEACON).to_le_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(MacAddr::BROADCAST.as_bytes());
    frame.extend_from_slice(sa.as_bytes());
    frame.extend_from_slice(sa.as_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(&[0u8; BEACON_FIXED_LEN]);

    frame.extend_from_slice(&[eid::MESH_ID, mesh_id.len() as u8]);
    frame.extend_from_slice(mesh_id);
    let conf = MeshConfigElement {
        protocol,
        formation_info: 0,
        capability: MeshConfigElement::capability_for(true),
    };
    frame.extend_from_slice(&[eid::MESH_CONFIG, 7]);
    frame.extend_from_slice(&conf.to_bytes());
    frame
}
