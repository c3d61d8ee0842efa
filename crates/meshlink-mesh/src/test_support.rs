//! Recording fakes for the collaborator traits and frame builders

use crate::collaborators::{
    BeaconChange, BeaconNotifier, ChannelTable, Collaborators, MeshRxHandler, PathTable, PeerTable,
};
use crate::dispatch::RxStatus;
use crate::scheduler::MaintenanceActions;
use meshlink_proto::frame::{fc, BEACON_FIXED_LEN};
use meshlink_proto::{Channel, Elements, MacAddr, MgmtFrame};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LOCAL_ADDR: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);

#[derive(Default)]
pub struct FakePeers {
    available: AtomicBool,
    established: AtomicUsize,
    expire_calls: AtomicUsize,
    flushes: AtomicUsize,
}

impl FakePeers {
    pub fn new(available: bool, established: usize) -> Self {
        FakePeers {
            available: AtomicBool::new(available),
            established: AtomicUsize::new(established),
            ..Default::default()
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn expire_calls(&self) -> usize {
        self.expire_calls.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl PeerTable for FakePeers {
    fn expire_inactive_peers(&self, _inactivity_limit: Duration) {
        self.expire_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn available_peer_slots(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn established_peer_count(&self) -> usize {
        self.established.load(Ordering::SeqCst)
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakePaths {
    expire_calls: AtomicUsize,
    root_announcements: AtomicUsize,
    path_table_grows: AtomicUsize,
}

impl FakePaths {
    pub fn expire_calls(&self) -> usize {
        self.expire_calls.load(Ordering::SeqCst)
    }

    pub fn root_announcements(&self) -> usize {
        self.root_announcements.load(Ordering::SeqCst)
    }

    pub fn path_table_grows(&self) -> usize {
        self.path_table_grows.load(Ordering::SeqCst)
    }
}

impl PathTable for FakePaths {
    fn expire_stale_paths(&self) {
        self.expire_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn transmit_root_announcement(&self) {
        self.root_announcements.fetch_add(1, Ordering::SeqCst);
    }

    fn grow_path_table(&self) {
        self.path_table_grows.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeRx {
    neighbours: Mutex<Vec<MacAddr>>,
    peering_frames: AtomicUsize,
    path_selection_frames: AtomicUsize,
}

impl FakeRx {
    pub fn neighbours(&self) -> Vec<MacAddr> {
        self.neighbours.lock().unwrap().clone()
    }

    pub fn peering_frames(&self) -> usize {
        self.peering_frames.load(Ordering::SeqCst)
    }

    pub fn path_selection_frames(&self) -> usize {
        self.path_selection_frames.load(Ordering::SeqCst)
    }
}

impl MeshRxHandler for FakeRx {
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

#[derive(Default)]
pub struct FakeBeacon {
    changes: Mutex<Vec<BeaconChange>>,
}

impl FakeBeacon {
    pub fn changes(&self) -> Vec<BeaconChange> {
        self.changes.lock().unwrap().clone()
    }
}

impl BeaconNotifier for FakeBeacon {
    fn beacon_changed(&self, change: BeaconChange) {
        self.changes.lock().unwrap().push(change);
    }
}

pub struct FakeChannels {
    channels: Mutex<HashMap<u32, Channel>>,
}

impl FakeChannels {
    /// Knows channel 1 (2412 MHz) only
    pub fn new() -> Self {
        let channels = FakeChannels {
            channels: Mutex::new(HashMap::new()),
        };
        channels.add(Channel::new_2g(2412));
        channels
    }

    pub fn add(&self, channel: Channel) {
        self.channels.lock().unwrap().insert(channel.center_freq, channel);
    }
}

impl ChannelTable for FakeChannels {
    fn channel(&self, freq: u32) -> Option<Channel> {
        self.channels.lock().unwrap().get(&freq).copied()
    }
}

/// Every fake plus the `Collaborators` bundle pointing at them
pub struct Fakes {
    pub peers: Arc<FakePeers>,
    pub paths: Arc<FakePaths>,
    pub rx: Arc<FakeRx>,
    pub beacon: Arc<FakeBeacon>,
    pub channels: Arc<FakeChannels>,
    pub collab: Collaborators,
}

impl Fakes {
    pub fn new() -> Self {
        let peers = Arc::new(FakePeers::new(true, 0));
        let paths = Arc::new(FakePaths::default());
        let rx = Arc::new(FakeRx::default());
        let beacon = Arc::new(FakeBeacon::default());
        let channels = Arc::new(FakeChannels::new());
        let collab = Collaborators {
            peers: peers.clone(),
            paths: paths.clone(),
            rx: rx.clone(),
            beacon: beacon.clone(),
            channels: channels.clone(),
        };
        Fakes {
            peers,
            paths,
            rx,
            beacon,
            channels,
            collab,
        }
    }
}

/// Maintenance actions that only count calls
#[derive(Default)]
pub struct CountingActions {
    running: bool,
    delay: Duration,
    housekeeping: AtomicUsize,
    root: AtomicUsize,
    path_grows: AtomicUsize,
    proxy_grows: AtomicUsize,
    queued_preqs: AtomicUsize,
    discoveries: AtomicUsize,
}

impl CountingActions {
    pub fn running() -> Self {
        CountingActions {
            running: true,
            ..Default::default()
        }
    }

    pub fn stopped() -> Self {
        Self::default()
    }

    /// Running, with housekeeping and root announce each blocking for `delay`
    pub fn slow(delay: Duration) -> Self {
        CountingActions {
            running: true,
            delay,
            ..Default::default()
        }
    }

    pub fn set_queued_path_requests(&self, n: usize) {
        self.queued_preqs.store(n, Ordering::SeqCst);
    }

    pub fn housekeeping_runs(&self) -> usize {
        self.housekeeping.load(Ordering::SeqCst)
    }

    pub fn root_announcements(&self) -> usize {
        self.root.load(Ordering::SeqCst)
    }

    pub fn path_table_grows(&self) -> usize {
        self.path_grows.load(Ordering::SeqCst)
    }

    pub fn proxy_table_grows(&self) -> usize {
        self.proxy_grows.load(Ordering::SeqCst)
    }

    pub fn path_discoveries(&self) -> usize {
        self.discoveries.load(Ordering::SeqCst)
    }
}

impl MaintenanceActions for CountingActions {
    fn housekeeping(&self) {
        std::thread::sleep(self.delay);
        self.housekeeping.fetch_add(1, Ordering::SeqCst);
    }

    fn root_announce(&self) {
        std::thread::sleep(self.delay);
        self.root.fetch_add(1, Ordering::SeqCst);
    }

    fn grow_path_table(&self) {
        self.path_grows.fetch_add(1, Ordering::SeqCst);
    }

    fn grow_proxy_table(&self) {
        self.proxy_grows.fetch_add(1, Ordering::SeqCst);
    }

    fn queued_path_requests(&self) -> usize {
        self.queued_preqs.load(Ordering::SeqCst)
    }

    fn start_path_discovery(&self) {
        self.discoveries.fetch_add(1, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

fn mgmt_header(stype: u16, da: MacAddr, sa: MacAddr) -> Vec<u8> {
    let mut frame = Vec::with_capacity(64);
    frame.extend_from_slice(&(fc::TYPE_MGMT | stype).to_le_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(da.as_bytes());
    frame.extend_from_slice(sa.as_bytes());
    frame.extend_from_slice(sa.as_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame
}

/// Beacon-shaped management frame (fixed fields zeroed) carrying `ies`
pub fn beacon_frame(stype: u16, da: MacAddr, sa: MacAddr, ies: &[u8]) -> Vec<u8> {
    let mut frame = mgmt_header(stype, da, sa);
    frame.extend_from_slice(&[0u8; BEACON_FIXED_LEN]);
    frame.extend_from_slice(ies);
    frame
}

/// Action frame to the local address
pub fn action_frame(sa: MacAddr, category: u8, code: u8) -> Vec<u8> {
    let mut frame = mgmt_header(fc::STYPE_ACTION, LOCAL_ADDR, sa);
    frame.extend_from_slice(&[category, code, 0, 0]);
    frame
}
