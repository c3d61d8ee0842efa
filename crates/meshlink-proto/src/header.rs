//! Mesh control header codec
//!
//! Wire layout (all fields little-endian):
//!
//! ```text
//! +-------+-----+-----------+----------------------+
//! | flags | ttl | seqnum(4) | ext addresses (0/6/12)|
//! +-------+-----+-----------+----------------------+
//! ```
//!
//! The address-extension bits of `flags` select between no extension, a
//! single address (AE_A4) and an address pair (AE_A5_A6). Both bits set is
//! not a valid header.

use crate::addr::{MacAddr, ETH_ALEN};
use crate::error::{ProtoError, Result};
use std::sync::atomic::{AtomicU32, Ordering};

/// Mesh header flag bits
pub mod flags {
    /// One extended address (address 4) follows
    pub const AE_A4: u8 = 0x01;
    /// Two extended addresses (addresses 5 and 6) follow
    pub const AE_A5_A6: u8 = 0x02;
    /// Address-extension mode mask
    pub const AE_MASK: u8 = 0x03;
}

/// Length of the mesh header without extended addresses
pub const MESH_HEADER_BASE_LEN: usize = 6;

/// Longest possible mesh header
pub const MESH_HEADER_MAX_LEN: usize = MESH_HEADER_BASE_LEN + 2 * ETH_ALEN;

/// Extended addressing carried by a mesh header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtendedAddresses {
    #[default]
    None,
    /// Address 4: the mesh source of a proxied frame
    A4(MacAddr),
    /// Addresses 5 and 6: end-to-end source and destination outside the mesh
    A5A6 { addr5: MacAddr, addr6: MacAddr },
}

impl ExtendedAddresses {
    /// Build from the optional (address 4-or-5, address 6) pair used by
    /// frame origination. Address 6 alone cannot be expressed.
    pub fn from_optional(addr4or5: Option<MacAddr>, addr6: Option<MacAddr>) -> Result<Self> {
        match (addr4or5, addr6) {
            (None, None) => Ok(ExtendedAddresses::None),
            (Some(addr4), None) => Ok(ExtendedAddresses::A4(addr4)),
            (Some(addr5), Some(addr6)) => Ok(ExtendedAddresses::A5A6 { addr5, addr6 }),
            (None, Some(_)) => Err(ProtoError::InvalidAddressing),
        }
    }

    /// Address-extension flag bits for this mode
    pub const fn flag(&self) -> u8 {
        match self {
            ExtendedAddresses::None => 0,
            ExtendedAddresses::A4(_) => flags::AE_A4,
            ExtendedAddresses::A5A6 { .. } => flags::AE_A5_A6,
        }
    }

    /// Number of address bytes appended to the base header
    pub const fn encoded_len(&self) -> usize {
        match self {
            ExtendedAddresses::None => 0,
            ExtendedAddresses::A4(_) => ETH_ALEN,
            ExtendedAddresses::A5A6 { .. } => 2 * ETH_ALEN,
        }
    }
}

/// Mesh control header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHeader {
    /// Raw flags byte; the address-extension bits always agree with `ext`
    pub flags: u8,
    pub ttl: u8,
    pub seqnum: u32,
    pub ext: ExtendedAddresses,
}

impl MeshHeader {
    pub fn new(ttl: u8, seqnum: u32, ext: ExtendedAddresses) -> Self {
        Self {
            flags: ext.flag(),
            ttl,
            seqnum,
            ext,
        }
    }

    /// Header length implied by a flags byte, or an error for a reserved
    /// address-extension mode
    pub fn len_from_flags(flags_byte: u8) -> Result<usize> {
        match flags_byte & flags::AE_MASK {
            0 => Ok(MESH_HEADER_BASE_LEN),
            flags::AE_A4 => Ok(MESH_HEADER_BASE_LEN + ETH_ALEN),
            flags::AE_A5_A6 => Ok(MESH_HEADER_BASE_LEN + 2 * ETH_ALEN),
            _ => Err(ProtoError::InvalidFlags(flags_byte)),
        }
    }

    /// Encoded length of this header
    pub fn encoded_len(&self) -> usize {
        MESH_HEADER_BASE_LEN + self.ext.encoded_len()
    }

    /// First extended address (address 4, or address 5 in the pair form)
    pub fn extended_address_1(&self) -> Option<MacAddr> {
        match self.ext {
            ExtendedAddresses::None => None,
            ExtendedAddresses::A4(addr) => Some(addr),
            ExtendedAddresses::A5A6 { addr5, .. } => Some(addr5),
        }
    }

    /// Second extended address (address 6)
    pub fn extended_address_2(&self) -> Option<MacAddr> {
        match self.ext {
            ExtendedAddresses::A5A6 { addr6, .. } => Some(addr6),
            _ => None,
        }
    }

    /// Append the encoded header to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.push((self.flags & !flags::AE_MASK) | self.ext.flag());
        out.push(self.ttl);
        out.extend_from_slice(&self.seqnum.to_le_bytes());
        match &self.ext {
            ExtendedAddresses::None => {}
            ExtendedAddresses::A4(addr4) => out.extend_from_slice(addr4.as_bytes()),
            ExtendedAddresses::A5A6 { addr5, addr6 } => {
                out.extend_from_slice(addr5.as_bytes());
                out.extend_from_slice(addr6.as_bytes());
            }
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }

    /// Deserialize from the start of `data`; trailing payload is ignored
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MESH_HEADER_BASE_LEN {
            return Err(ProtoError::Truncated {
                needed: MESH_HEADER_BASE_LEN,
                available: data.len(),
            });
        }

        let flags_byte = data[0];
        let needed = Self::len_from_flags(flags_byte)?;
        if data.len() < needed {
            return Err(ProtoError::Truncated {
                needed,
                available: data.len(),
            });
        }

        let ttl = data[1];
        let seqnum = u32::from_le_bytes([data[2], data[3], data[4], data[5]]);
        let ext_bytes = &data[MESH_HEADER_BASE_LEN..needed];
        let ext = match flags_byte & flags::AE_MASK {
            flags::AE_A4 => ExtendedAddresses::A4(MacAddr::from_slice(ext_bytes)?),
            flags::AE_A5_A6 => ExtendedAddresses::A5A6 {
                addr5: MacAddr::from_slice(&ext_bytes[..ETH_ALEN])?,
                addr6: MacAddr::from_slice(&ext_bytes[ETH_ALEN..])?,
            },
            _ => ExtendedAddresses::None,
        };

        Ok(Self {
            flags: flags_byte,
            ttl,
            seqnum,
            ext,
        })
    }
}

/// Encode a mesh header from the origination-style optional address pair
pub fn encode(ttl: u8, seqnum: u32, addr4or5: Option<MacAddr>, addr6: Option<MacAddr>) -> Result<Vec<u8>> {
    let ext = ExtendedAddresses::from_optional(addr4or5, addr6)?;
    Ok(MeshHeader::new(ttl, seqnum, ext).to_bytes())
}

/// Decode a mesh header
pub fn decode(data: &[u8]) -> Result<MeshHeader> {
    MeshHeader::from_bytes(data)
}

/// Per-interface mesh sequence number source; wraps silently at `u32::MAX`
#[derive(Debug, Default)]
pub struct SequenceCounter(AtomicU32);

impl SequenceCounter {
    pub fn new(start: u32) -> Self {
        Self(AtomicU32::new(start))
    }

    /// Take the next sequence number
    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Value the next call to `next` will return
    pub fn peek(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}
