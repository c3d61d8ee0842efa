//! meshlink mesh runtime
//!
//! Per-interface runtime of an 802.11s mesh point:
//!
//! ## Receive path
//! - Recent multicast cache for duplicate suppression of group-addressed frames
//! - Management frame dispatch to the peering, path selection and neighbour handlers
//!
//! ## Transmit path
//! - Mesh header construction with a per-interface sequence counter
//! - Mesh configuration, mesh ID, RSN, vendor and DS parameter elements for beacons
//!
//! ## Maintenance
//! - Housekeeping, root announcement and path timers feeding a single
//!   coalescing worker
//! - Suspend/resume with latched timers
//! - Cancel-and-join teardown

pub mod beacon;
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod interface;
pub mod rmc;
pub mod scheduler;
pub mod state;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use collaborators::{
    BeaconChange, BeaconNotifier, ChannelTable, Collaborators, MeshRxHandler, PathTable, PeerTable,
};
pub use config::{MeshConfig, MeshSecurity, RmcConfig};
pub use dispatch::{mesh_matches_local, FrameDispatcher, IgnoreReason, RxDisposition, RxStatus};
pub use error::{MeshError, Result};
pub use flags::{MeshWork, TimerKind, TimerLatch, WorkFlags};
pub use interface::MeshInterface;
pub use rmc::{RecentMulticastCache, RmcVerdict};
pub use scheduler::{round_coarse, MaintenanceActions, MaintenanceScheduler, WorkQueue};
pub use state::MeshRuntimeState;
pub use timer::MeshTimer;
