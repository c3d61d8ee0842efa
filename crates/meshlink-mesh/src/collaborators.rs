//! Interfaces to the parts of the wireless stack this layer drives but does
//! not own: peer and path tables, the peering and HWMP state machines,
//! beacon generation, and the PHY channel list.

use crate::dispatch::RxStatus;
use meshlink_proto::{Channel, Elements, MacAddr, MgmtFrame};
use std::sync::Arc;
use std::time::Duration;

/// Mesh peer (station) table
pub trait PeerTable: Send + Sync {
    /// Remove peers silent for longer than `inactivity_limit`
    fn expire_inactive_peers(&self, inactivity_limit: Duration);

    /// Whether new peer links can still be accepted
    fn available_peer_slots(&self) -> bool;

    /// Peers with an established link
    fn established_peer_count(&self) -> usize;

    /// Drop every peer (interface going down)
    fn flush(&self);
}

/// Mesh path and proxy tables plus the HWMP transmit side
pub trait PathTable: Send + Sync {
    /// Remove paths that have outlived their lifetime
    fn expire_stale_paths(&self);

    /// Send a root announcement
    fn transmit_root_announcement(&self);

    /// Resize the mesh path table after it reported pressure
    fn grow_path_table(&self) {}

    /// Resize the proxy path table after it reported pressure
    fn grow_proxy_table(&self) {}

    /// Path requests waiting for transmission
    fn queued_path_requests(&self) -> usize {
        0
    }

    /// Transmit the next queued path request
    fn start_path_discovery(&self) {}
}

/// Receive-side consumers of routed management frames
pub trait MeshRxHandler: Send + Sync {
    /// A beacon or probe response from a station in our mesh
    fn neighbour_update(&self, sa: MacAddr, elems: &Elements<'_>, status: &RxStatus);

    /// Mesh peering open/confirm/close
    fn peering_frame(&self, frame: &MgmtFrame<'_>, status: &RxStatus);

    /// HWMP path selection frame
    fn path_selection_frame(&self, frame: &MgmtFrame<'_>);
}

/// Beacon state changes the mesh layer requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconChange {
    /// Beacon content must be regenerated
    Content,
    /// Start beaconing at the given interval (TUs)
    Enabled { interval_tu: u16 },
    /// Stop beaconing
    Disabled,
}

/// Beacon generation owner
pub trait BeaconNotifier: Send + Sync {
    fn beacon_changed(&self, change: BeaconChange);
}

/// Channel list of the PHY
pub trait ChannelTable: Send + Sync {
    /// Channel with center frequency `freq`, if the PHY knows it
    fn channel(&self, freq: u32) -> Option<Channel>;
}

/// Handles to every collaborator of one mesh interface
#[derive(Clone)]
pub struct Collaborators {
    pub peers: Arc<dyn PeerTable>,
    pub paths: Arc<dyn PathTable>,
    pub rx: Arc<dyn MeshRxHandler>,
    pub beacon: Arc<dyn BeaconNotifier>,
    pub channels: Arc<dyn ChannelTable>,
}
