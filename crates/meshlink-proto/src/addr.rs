//! 48-bit IEEE MAC addresses

use crate::error::{ProtoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a MAC address in bytes
pub const ETH_ALEN: usize = 6;

/// A 6-byte IEEE 802 MAC address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MacAddr([u8; ETH_ALEN]);

impl MacAddr {
    /// ff:ff:ff:ff:ff:ff
    pub const BROADCAST: MacAddr = MacAddr([0xff; ETH_ALEN]);

    /// 00:00:00:00:00:00
    pub const ZERO: MacAddr = MacAddr([0; ETH_ALEN]);

    pub const fn new(bytes: [u8; ETH_ALEN]) -> Self {
        MacAddr(bytes)
    }

    /// Read an address from the first six bytes of `data`
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let bytes: [u8; ETH_ALEN] = data
            .get(..ETH_ALEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtoError::Truncated {
                needed: ETH_ALEN,
                available: data.len(),
            })?;
        Ok(MacAddr(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; ETH_ALEN] {
        &self.0
    }

    /// Group bit set (multicast or broadcast)
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl From<[u8; ETH_ALEN]> for MacAddr {
    fn from(bytes: [u8; ETH_ALEN]) -> Self {
        MacAddr(bytes)
    }
}

impl AsRef<[u8]> for MacAddr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({})", self)
    }
}

impl FromStr for MacAddr {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ProtoError::InvalidMacAddress(s.to_string());

        let mut bytes = [0u8; ETH_ALEN];
        let mut parts = s.split([':', '-']);
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(MacAddr(bytes))
    }
}
