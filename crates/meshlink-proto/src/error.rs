//! Wire format error types

use thiserror::Error;

/// Errors raised while encoding or decoding mesh wire formats
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    #[error("Truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Invalid mesh header flags: {0:#04x}")]
    InvalidFlags(u8),

    #[error("Address 6 supplied without address 4/5")]
    InvalidAddressing,

    #[error("Insufficient space: need {needed} bytes, have {available}")]
    InsufficientSpace { needed: usize, available: usize },

    #[error("Malformed information element {id}")]
    InvalidElement { id: u8 },

    #[error("Mesh ID too long: {0} bytes (max 32)")]
    MeshIdTooLong(usize),

    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),
}

/// Result type for wire format operations
pub type Result<T> = std::result::Result<T, ProtoError>;
