//! 802.11 management frame views and data-frame address layout
//!
//! Only the pieces the mesh layer touches are modelled: frame control
//! decoding, the 24-byte management header, beacon/probe-response bodies,
//! action category/code, and the addressing of locally originated mesh
//! data frames.

use crate::addr::{MacAddr, ETH_ALEN};
use crate::error::{ProtoError, Result};

/// Frame control field masks and values (little-endian u16 on the wire)
pub mod fc {
    pub const FTYPE: u16 = 0x000c;
    pub const STYPE: u16 = 0x00f0;
    pub const TODS: u16 = 0x0100;
    pub const FROMDS: u16 = 0x0200;

    pub const TYPE_MGMT: u16 = 0x0000;
    pub const TYPE_CTL: u16 = 0x0004;
    pub const TYPE_DATA: u16 = 0x0008;

    pub const STYPE_PROBE_REQ: u16 = 0x0040;
    pub const STYPE_PROBE_RESP: u16 = 0x0050;
    pub const STYPE_BEACON: u16 = 0x0080;
    pub const STYPE_ACTION: u16 = 0x00d0;
}

/// Action frame categories
pub mod category {
    pub const MESH_ACTION: u8 = 13;
    pub const SELF_PROTECTED: u8 = 15;
}

/// Self-protected action codes used by mesh peering
pub mod self_protected {
    pub const MESH_PEERING_OPEN: u8 = 1;
    pub const MESH_PEERING_CONFIRM: u8 = 2;
    pub const MESH_PEERING_CLOSE: u8 = 3;
}

/// Mesh action codes
pub mod mesh_action {
    pub const LINK_METRIC_REPORT: u8 = 0;
    pub const HWMP_PATH_SELECTION: u8 = 1;
}

/// Length of the management frame header (fc, duration, DA, SA, BSSID, seq)
pub const MGMT_HEADER_LEN: usize = 24;

/// Timestamp + beacon interval + capability preceding beacon/probe-response IEs
pub const BEACON_FIXED_LEN: usize = 12;

/// Three-address 802.11 header length
pub const HEADER_LEN_3ADDR: usize = 24;

/// Four-address 802.11 header length
pub const HEADER_LEN_4ADDR: usize = 30;

/// Management frame subtypes the mesh layer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MgmtSubtype {
    Beacon,
    ProbeResponse,
    Action,
    Other(u16),
}

/// Borrowed view over a received management frame
#[derive(Debug, Clone, Copy)]
pub struct MgmtFrame<'a> {
    buf: &'a [u8],
}

impl<'a> MgmtFrame<'a> {
    /// Wrap `buf`, checking that the full management header is present
    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        if buf.len() < MGMT_HEADER_LEN {
            return Err(ProtoError::Truncated {
                needed: MGMT_HEADER_LEN,
                available: buf.len(),
            });
        }
        Ok(Self { buf })
    }

    pub fn frame_control(&self) -> u16 {
        u16::from_le_bytes([self.buf[0], self.buf[1]])
    }

    pub fn is_mgmt(&self) -> bool {
        self.frame_control() & fc::FTYPE == fc::TYPE_MGMT
    }

    pub fn subtype(&self) -> MgmtSubtype {
        match self.frame_control() & fc::STYPE {
            fc::STYPE_BEACON => MgmtSubtype::Beacon,
            fc::STYPE_PROBE_RESP => MgmtSubtype::ProbeResponse,
            fc::STYPE_ACTION => MgmtSubtype::Action,
            other => MgmtSubtype::Other(other),
        }
    }

    pub fn da(&self) -> MacAddr {
        self.addr_at(4)
    }

    pub fn sa(&self) -> MacAddr {
        self.addr_at(10)
    }

    pub fn bssid(&self) -> MacAddr {
        self.addr_at(16)
    }

    fn addr_at(&self, offset: usize) -> MacAddr {
        let mut bytes = [0u8; ETH_ALEN];
        bytes.copy_from_slice(&self.buf[offset..offset + ETH_ALEN]);
        MacAddr::new(bytes)
    }

    /// Whole frame including header
    pub fn bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Frame body after the management header
    pub fn body(&self) -> &'a [u8] {
        &self.buf[MGMT_HEADER_LEN..]
    }

    /// Information elements of a beacon or probe response, if the fixed
    /// fields are present
    pub fn beacon_elements(&self) -> Option<&'a [u8]> {
        self.body().get(BEACON_FIXED_LEN..)
    }

    /// Action category and action code
    pub fn action(&self) -> Option<(u8, u8)> {
        match self.body() {
            [category, code, ..] => Some((*category, *code)),
            _ => None,
        }
    }
}

/// Address fields of a locally originated mesh data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshDataAddresses {
    /// Frame control with ToDS/FromDS applied
    pub frame_control: u16,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub addr4: Option<MacAddr>,
}

impl MeshDataAddresses {
    /// Length of the 802.11 header these addresses produce, excluding the
    /// mesh control header
    pub fn header_len(&self) -> usize {
        if self.addr4.is_some() {
            HEADER_LEN_4ADDR
        } else {
            HEADER_LEN_3ADDR
        }
    }
}

/// Lay out the addresses of a locally originated mesh frame.
///
/// Group-addressed frames use FromDS with `DA TA SA`; individually
/// addressed frames use FromDS|ToDS with `RA TA DA SA`, leaving RA zeroed
/// for the path lookup to fill in.
pub fn fill_mesh_addresses(frame_control: u16, mesh_da: MacAddr, mesh_sa: MacAddr) -> MeshDataAddresses {
    if mesh_da.is_multicast() {
        MeshDataAddresses {
            frame_control: frame_control | fc::FROMDS,
            addr1: mesh_da,
            addr2: mesh_sa,
            addr3: mesh_sa,
            addr4: None,
        }
    } else {
        MeshDataAddresses {
            frame_control: frame_control | fc::FROMDS | fc::TODS,
            addr1: MacAddr::ZERO,
            addr2: mesh_sa,
            addr3: mesh_da,
            addr4: Some(mesh_sa),
        }
    }
}
