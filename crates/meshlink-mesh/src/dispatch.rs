//! Receive-side routing of mesh management frames
//!
//! Mismatched meshes, disabled channels and security policy differences are
//! normal on a shared medium. They are reported through `RxDisposition` and
//! a `trace!` line, never as errors.

use crate::collaborators::Collaborators;
use crate::config::MeshSecurity;
use crate::state::MeshRuntimeState;
use meshlink_proto::frame::{category, mesh_action, self_protected};
use meshlink_proto::{channel_to_frequency, Band, Elements, MgmtFrame, MgmtSubtype};
use tracing::trace;

/// Receive metadata supplied by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxStatus {
    /// Band the frame was received on
    pub band: Band,
    /// Receive frequency (MHz)
    pub freq: u32,
}

impl RxStatus {
    pub fn new(band: Band, freq: u32) -> Self {
        RxStatus { band, freq }
    }
}

/// Why a frame was not handed to any collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Truncated,
    ForeignProbeResponse,
    SecurityMismatch,
    UnknownChannel,
    ChannelDisabled,
    NotOurMesh,
    UnsupportedSubtype,
    UnhandledAction,
}

/// Outcome of dispatching one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxDisposition {
    NeighbourUpdated,
    PeeringFrame,
    PathSelectionFrame,
    Ignored(IgnoreReason),
}

/// True when the advertised mesh id and all five protocol identifiers equal
/// the local configuration. Both elements must be present.
pub fn mesh_matches_local(elems: &Elements<'_>, state: &MeshRuntimeState) -> bool {
    let (Some(mesh_id), Some(conf)) = (elems.mesh_id, elems.mesh_config) else {
        return false;
    };
    state.with_mesh_id(|local| local == mesh_id) && conf.protocol == state.protocol()
}

/// Routes received management frames to the peering, path selection and
/// neighbour collaborators
pub struct FrameDispatcher<'a> {
    state: &'a MeshRuntimeState,
    collab: &'a Collaborators,
}

impl<'a> FrameDispatcher<'a> {
    pub fn new(state: &'a MeshRuntimeState, collab: &'a Collaborators) -> Self {
        FrameDispatcher { state, collab }
    }

    pub fn dispatch(&self, frame: &[u8], status: &RxStatus) -> RxDisposition {
        let disposition = match MgmtFrame::parse(frame) {
            Ok(mgmt) => self.dispatch_mgmt(&mgmt, status),
            Err(_) => RxDisposition::Ignored(IgnoreReason::Truncated),
        };
        if let RxDisposition::Ignored(reason) = disposition {
            trace!(?reason, len = frame.len(), "mesh frame ignored");
        }
        disposition
    }

    fn dispatch_mgmt(&self, mgmt: &MgmtFrame<'_>, status: &RxStatus) -> RxDisposition {
        if !mgmt.is_mgmt() {
            return RxDisposition::Ignored(IgnoreReason::UnsupportedSubtype);
        }
        match mgmt.subtype() {
            MgmtSubtype::Beacon => self.rx_beacon(mgmt, status),
            MgmtSubtype::ProbeResponse => {
                if mgmt.da() != self.state.addr() {
                    return RxDisposition::Ignored(IgnoreReason::ForeignProbeResponse);
                }
                self.rx_beacon(mgmt, status)
            }
            MgmtSubtype::Action => self.rx_action(mgmt, status),
            MgmtSubtype::Other(_) => RxDisposition::Ignored(IgnoreReason::UnsupportedSubtype),
        }
    }

    fn rx_beacon(&self, mgmt: &MgmtFrame<'_>, status: &RxStatus) -> RxDisposition {
        let Some(ies) = mgmt.beacon_elements() else {
            return RxDisposition::Ignored(IgnoreReason::Truncated);
        };
        let elems = Elements::parse(ies);

        if elems.has_rsn() && self.state.security() == MeshSecurity::None {
            return RxDisposition::Ignored(IgnoreReason::SecurityMismatch);
        }

        let freq = elems
            .ds_channel()
            .and_then(|chan| channel_to_frequency(chan, status.band))
            .unwrap_or(status.freq);
        match self.collab.channels.channel(freq) {
            None => return RxDisposition::Ignored(IgnoreReason::UnknownChannel),
            Some(channel) if channel.disabled => {
                return RxDisposition::Ignored(IgnoreReason::ChannelDisabled);
            }
            Some(_) => {}
        }

        if !mesh_matches_local(&elems, self.state) {
            return RxDisposition::Ignored(IgnoreReason::NotOurMesh);
        }

        self.collab.rx.neighbour_update(mgmt.sa(), &elems, status);
        RxDisposition::NeighbourUpdated
    }

    fn rx_action(&self, mgmt: &MgmtFrame<'_>, status: &RxStatus) -> RxDisposition {
        let Some((cat, code)) = mgmt.action() else {
            return RxDisposition::Ignored(IgnoreReason::Truncated);
        };

        match (cat, code) {
            (
                category::SELF_PROTECTED,
                self_protected::MESH_PEERING_OPEN
                | self_protected::MESH_PEERING_CONFIRM
                | self_protected::MESH_PEERING_CLOSE,
            ) => {
                self.collab.rx.peering_frame(mgmt, status);
                RxDisposition::PeeringFrame
            }
            (category::MESH_ACTION, mesh_action::HWMP_PATH_SELECTION) => {
                self.collab.rx.path_selection_frame(mgmt);
                RxDisposition::PathSelectionFrame
            }
            _ => RxDisposition::Ignored(IgnoreReason::UnhandledAction),
        }
    }
}
