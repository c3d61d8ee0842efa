//! Mesh information elements for beacons and probe responses
//!
//! Each builder checks the buffer's tailroom against the exact encoded size
//! before writing anything and returns the number of bytes appended. A
//! builder with nothing to emit returns `Ok(0)`.

use crate::collaborators::PeerTable;
use crate::state::MeshRuntimeState;
use meshlink_proto::elements::MESH_CONFIG_LEN;
use meshlink_proto::ie::{eid, IE_HEADER_LEN};
use meshlink_proto::{find_element, split_vendor, Band, FrameBuf, MeshConfigElement, Result};
use tracing::trace;

/// Mesh configuration element.
///
/// Accept-peer-links is recomputed from the peer table on every call and
/// stored back into the runtime state as the advertised value.
pub fn add_mesh_config_ie(state: &MeshRuntimeState, peers: &dyn PeerTable, buf: &mut FrameBuf) -> Result<usize> {
    buf.ensure(IE_HEADER_LEN + MESH_CONFIG_LEN)?;

    let accepting = peers.available_peer_slots();
    state.set_accepting_peer_links(accepting);

    let element = MeshConfigElement {
        protocol: state.protocol(),
        formation_info: MeshConfigElement::formation_info_for(peers.established_peer_count()),
        capability: MeshConfigElement::capability_for(accepting),
    };
    buf.put_element(eid::MESH_CONFIG, &element.to_bytes())
}

/// Mesh ID element
pub fn add_mesh_id_ie(state: &MeshRuntimeState, buf: &mut FrameBuf) -> Result<usize> {
    state.with_mesh_id(|mesh_id| buf.put_element(eid::MESH_ID, mesh_id))
}

/// Vendor-specific elements copied from the cached IE template
pub fn add_vendor_ies(state: &MeshRuntimeState, buf: &mut FrameBuf) -> Result<usize> {
    state.with_beacon_ies(|ies| match split_vendor(ies) {
        Some(offset) => buf.put(&ies[offset..]),
        None => Ok(0),
    })
}

/// RSN element copied from the cached IE template
pub fn add_rsn_ie(state: &MeshRuntimeState, buf: &mut FrameBuf) -> Result<usize> {
    state.with_beacon_ies(|ies| match find_element(ies, eid::RSN) {
        Some(rsn) => buf.put(rsn),
        None => Ok(0),
    })
}

/// DS parameter set; only emitted on 2.4 GHz
pub fn add_ds_params_ie(state: &MeshRuntimeState, buf: &mut FrameBuf) -> Result<usize> {
    let Some(channel) = state.operating_channel() else {
        return Ok(0);
    };
    if channel.band != Band::TwoGhz {
        return Ok(0);
    }
    let Some(number) = channel.number() else {
        return Ok(0);
    };
    buf.put_element(eid::DS_PARAMS, &[number])
}

/// Append every mesh element, skipping any that do not fit.
///
/// Returns the total number of bytes written.
pub fn add_mesh_ies(state: &MeshRuntimeState, peers: &dyn PeerTable, buf: &mut FrameBuf) -> usize {
    let results = [
        ("ds_params", add_ds_params_ie(state, buf)),
        ("rsn", add_rsn_ie(state, buf)),
        ("mesh_id", add_mesh_id_ie(state, buf)),
        ("mesh_config", add_mesh_config_ie(state, peers, buf)),
        ("vendor", add_vendor_ies(state, buf)),
    ];

    results
        .into_iter()
        .map(|(name, result)| {
            result.unwrap_or_else(|e| {
                trace!("skipping {} element: {}", name, e);
                0
            })
        })
        .sum()
}
