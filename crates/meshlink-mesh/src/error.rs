//! Mesh runtime error types

use thiserror::Error;

/// Mesh-interface errors
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Protocol error: {0}")]
    Proto(#[from] meshlink_proto::ProtoError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Mesh interface is not running")]
    NotRunning,

    #[error("Maintenance task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for mesh operations
pub type Result<T> = std::result::Result<T, MeshError>;
