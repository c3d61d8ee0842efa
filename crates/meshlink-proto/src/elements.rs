//! Parsed view of the elements carried by beacons and probe responses

use crate::error::{ProtoError, Result};
use crate::ie::{eid, ElementIter};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Mesh configuration capability bits
pub mod meshconf_capab {
    pub const ACCEPT_PLINKS: u8 = 0x01;
    pub const FORWARDING: u8 = 0x08;
}

/// Payload length of the mesh configuration element
pub const MESH_CONFIG_LEN: usize = 7;

/// Largest neighbour count the formation-info field can report
pub const MAX_FORMATION_NEIGHBORS: usize = 15;

/// The five protocol identifiers that define a mesh profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MeshProtocolIds {
    /// Active path selection protocol (0 = HWMP)
    pub path_selection: u8,
    /// Active path selection metric (0 = airtime)
    pub metric: u8,
    /// Congestion control mode (0 = disabled)
    pub congestion_control: u8,
    /// Synchronization method (0 = neighbour offset)
    pub synchronization: u8,
    /// Authentication protocol (0 = none)
    pub authentication: u8,
}

/// Mesh configuration element payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshConfigElement {
    pub protocol: MeshProtocolIds,
    pub formation_info: u8,
    pub capability: u8,
}

impl MeshConfigElement {
    /// Formation info byte for `neighbors` established peers
    pub fn formation_info_for(neighbors: usize) -> u8 {
        (neighbors.min(MAX_FORMATION_NEIGHBORS) as u8) << 1
    }

    /// Capability byte; forwarding is always advertised
    pub fn capability_for(accepting_plinks: bool) -> u8 {
        let mut capability = meshconf_capab::FORWARDING;
        if accepting_plinks {
            capability |= meshconf_capab::ACCEPT_PLINKS;
        }
        capability
    }

    pub fn from_bytes(payload: &[u8]) -> Result<Self> {
        if payload.len() != MESH_CONFIG_LEN {
            return Err(ProtoError::InvalidElement {
                id: eid::MESH_CONFIG,
            });
        }
        Ok(Self {
            protocol: MeshProtocolIds {
                path_selection: payload[0],
                metric: payload[1],
                congestion_control: payload[2],
                synchronization: payload[3],
                authentication: payload[4],
            },
            formation_info: payload[5],
            capability: payload[6],
        })
    }

    pub fn to_bytes(&self) -> [u8; MESH_CONFIG_LEN] {
        [
            self.protocol.path_selection,
            self.protocol.metric,
            self.protocol.congestion_control,
            self.protocol.synchronization,
            self.protocol.authentication,
            self.formation_info,
            self.capability,
        ]
    }

    /// Neighbour count advertised in formation info
    pub fn neighbors(&self) -> u8 {
        (self.formation_info >> 1) & 0x0f
    }

    /// Whether the advertising station accepts new peer links
    pub fn accepts_peer_links(&self) -> bool {
        self.capability & meshconf_capab::ACCEPT_PLINKS != 0
    }
}

/// Elements of interest, first instance of each
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Elements<'a> {
    pub ssid: Option<&'a [u8]>,
    pub supported_rates: Option<&'a [u8]>,
    pub ext_supported_rates: Option<&'a [u8]>,
    pub ds_params: Option<&'a [u8]>,
    pub rsn: Option<&'a [u8]>,
    pub mesh_id: Option<&'a [u8]>,
    pub mesh_config: Option<MeshConfigElement>,
    /// A trailing element ran past the end of the region
    pub truncated: bool,
}

impl<'a> Elements<'a> {
    /// Parse an IE region. Malformed mesh configuration elements are
    /// dropped rather than failing the whole frame.
    pub fn parse(ies: &'a [u8]) -> Self {
        let mut elems = Elements::default();
        let mut iter = ElementIter::new(ies);

        for element in iter.by_ref() {
            let payload = element.payload;
            match element.id {
                eid::SSID => {
                    elems.ssid.get_or_insert(payload);
                }
                eid::SUPPORTED_RATES => {
                    elems.supported_rates.get_or_insert(payload);
                }
                eid::EXT_SUPPORTED_RATES => {
                    elems.ext_supported_rates.get_or_insert(payload);
                }
                eid::DS_PARAMS => {
                    elems.ds_params.get_or_insert(payload);
                }
                eid::RSN => {
                    elems.rsn.get_or_insert(payload);
                }
                eid::MESH_ID => {
                    elems.mesh_id.get_or_insert(payload);
                }
                eid::MESH_CONFIG if elems.mesh_config.is_none() => {
                    match MeshConfigElement::from_bytes(payload) {
                        Ok(conf) => elems.mesh_config = Some(conf),
                        Err(e) => trace!("ignoring mesh config element: {}", e),
                    }
                }
                _ => {}
            }
        }

        elems.truncated = iter.truncated();
        elems
    }

    /// Channel number from a well-formed DS parameter set
    pub fn ds_channel(&self) -> Option<u8> {
        match self.ds_params {
            Some([channel]) => Some(*channel),
            _ => None,
        }
    }

    /// RSN element present with a non-empty payload
    pub fn has_rsn(&self) -> bool {
        self.rsn.map_or(false, |rsn| !rsn.is_empty())
    }
}
