//! Information element primitives
//!
//! Element ids, a TLV iterator, and `FrameBuf`, a fixed-capacity output
//! buffer whose writes either fit completely or fail without side effects.

use crate::error::{ProtoError, Result};

/// Element ids used by the mesh layer
pub mod eid {
    pub const SSID: u8 = 0;
    pub const SUPPORTED_RATES: u8 = 1;
    pub const DS_PARAMS: u8 = 3;
    pub const RSN: u8 = 48;
    pub const EXT_SUPPORTED_RATES: u8 = 50;
    pub const MESH_CONFIG: u8 = 113;
    pub const MESH_ID: u8 = 114;
    pub const VENDOR_SPECIFIC: u8 = 221;
}

/// Element id + length octets
pub const IE_HEADER_LEN: usize = 2;

/// Longest mesh id the mesh id element can carry
pub const MESH_ID_MAX_LEN: usize = 32;

/// One TLV element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawElement<'a> {
    pub id: u8,
    /// Offset of the element header within the scanned region
    pub offset: usize,
    pub payload: &'a [u8],
}

impl<'a> RawElement<'a> {
    /// Encoded length including the two header octets
    pub fn encoded_len(&self) -> usize {
        IE_HEADER_LEN + self.payload.len()
    }
}

/// Iterator over the elements of an IE region.
///
/// Stops at the first element whose declared length runs past the end of
/// the region; `truncated()` reports whether that happened.
#[derive(Debug, Clone)]
pub struct ElementIter<'a> {
    data: &'a [u8],
    pos: usize,
    truncated: bool,
}

impl<'a> ElementIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            truncated: false,
        }
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = RawElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.data[self.pos..];
        if rest.is_empty() {
            return None;
        }
        if rest.len() < IE_HEADER_LEN {
            self.truncated = true;
            self.pos = self.data.len();
            return None;
        }

        let id = rest[0];
        let len = rest[1] as usize;
        let Some(payload) = rest.get(IE_HEADER_LEN..IE_HEADER_LEN + len) else {
            self.truncated = true;
            self.pos = self.data.len();
            return None;
        };

        let element = RawElement {
            id,
            offset: self.pos,
            payload,
        };
        self.pos += IE_HEADER_LEN + len;
        Some(element)
    }
}

/// Find the first element with `id`, returning its full encoding
/// (id + length + payload)
pub fn find_element(ies: &[u8], id: u8) -> Option<&[u8]> {
    ElementIter::new(ies)
        .find(|e| e.id == id)
        .map(|e| &ies[e.offset..e.offset + e.encoded_len()])
}

/// Offset of the first vendor-specific element
pub fn split_vendor(ies: &[u8]) -> Option<usize> {
    ElementIter::new(ies)
        .find(|e| e.id == eid::VENDOR_SPECIFIC)
        .map(|e| e.offset)
}

/// Fixed-capacity frame buffer.
///
/// Capacity is allocated up front; `put` never reallocates and never
/// writes a partial element.
#[derive(Debug, Clone)]
pub struct FrameBuf {
    data: Vec<u8>,
    capacity: usize,
}

impl FrameBuf {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Bytes still available
    pub fn tailroom(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// Fail unless `needed` bytes are available
    pub fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.tailroom();
        if needed > available {
            return Err(ProtoError::InsufficientSpace { needed, available });
        }
        Ok(())
    }

    /// Append `bytes` in full, or nothing
    pub fn put(&mut self, bytes: &[u8]) -> Result<usize> {
        self.ensure(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Append an element header and payload in full, or nothing
    pub fn put_element(&mut self, id: u8, payload: &[u8]) -> Result<usize> {
        let len = u8::try_from(payload.len()).map_err(|_| ProtoError::InvalidElement { id })?;
        self.ensure(IE_HEADER_LEN + payload.len())?;
        self.data.push(id);
        self.data.push(len);
        self.data.extend_from_slice(payload);
        Ok(IE_HEADER_LEN + payload.len())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
