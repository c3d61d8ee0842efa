//! meshlink wire formats
//!
//! Everything here is pure byte manipulation with no runtime:
//!
//! - MAC addresses and channel/frequency helpers
//! - 802.11 management frame views and mesh data-frame addressing
//! - The mesh control header (TTL, sequence number, extended addresses)
//! - Information element iteration, parsing and bounded output buffers
//!
//! Decoders never panic on attacker-controlled input; every length is
//! checked before it is used.

pub mod addr;
pub mod channel;
pub mod elements;
pub mod error;
pub mod frame;
pub mod header;
pub mod ie;

pub use addr::{MacAddr, ETH_ALEN};
pub use channel::{channel_to_frequency, frequency_to_channel, Band, Channel};
pub use elements::{Elements, MeshConfigElement, MeshProtocolIds};
pub use error::{ProtoError, Result};
pub use frame::{fill_mesh_addresses, MeshDataAddresses, MgmtFrame, MgmtSubtype};
pub use header::{ExtendedAddresses, MeshHeader, SequenceCounter, MESH_HEADER_BASE_LEN};
pub use ie::{find_element, split_vendor, ElementIter, FrameBuf, RawElement};
