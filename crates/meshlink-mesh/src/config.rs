//! Mesh interface configuration

use crate::error::{MeshError, Result};
use meshlink_proto::ie::MESH_ID_MAX_LEN;
use meshlink_proto::MeshProtocolIds;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of RMC buckets
pub const RMC_BUCKETS: usize = 256;

/// Default per-bucket entry cap
pub const RMC_QUEUE_MAX_LEN: usize = 4;

/// Default RMC entry lifetime (milliseconds)
pub const RMC_TIMEOUT_MS: u64 = 3_000;

/// Default TTL stamped on originated frames
pub const DEFAULT_MESH_TTL: u8 = 31;

/// Default housekeeping period (seconds)
pub const HOUSEKEEPING_INTERVAL_SECS: u64 = 60;

/// Peers silent for longer than this are expired (seconds)
pub const PEER_INACTIVITY_LIMIT_SECS: u64 = 1_800;

/// Default root announcement interval (TUs)
pub const DEFAULT_RANN_INTERVAL_TU: u32 = 5_000;

/// Default minimum spacing between path requests (milliseconds)
pub const DEFAULT_PREQ_MIN_INTERVAL_MS: u64 = 10;

/// Default mesh beacon interval (TUs)
pub const MESH_DEFAULT_BEACON_INTERVAL_TU: u16 = 1_000;

/// Convert 802.11 time units (1024 us) to a duration
pub fn tu_to_duration(tu: u32) -> Duration {
    Duration::from_micros(tu as u64 * 1024)
}

/// Recent multicast cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmcConfig {
    /// Bucket count; must be a power of two
    pub buckets: usize,

    /// Hard cap on entries per bucket
    pub queue_max_len: usize,

    /// Entry lifetime (milliseconds)
    pub timeout_ms: u64,
}

impl RmcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buckets == 0 || !self.buckets.is_power_of_two() {
            return Err(MeshError::InvalidConfig(format!(
                "RMC bucket count must be a non-zero power of two, got {}",
                self.buckets
            )));
        }
        if self.queue_max_len == 0 {
            return Err(MeshError::InvalidConfig(
                "RMC queue length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RmcConfig {
    fn default() -> Self {
        RmcConfig {
            buckets: RMC_BUCKETS,
            queue_max_len: RMC_QUEUE_MAX_LEN,
            timeout_ms: RMC_TIMEOUT_MS,
        }
    }
}

/// Security mode of the local mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeshSecurity {
    #[default]
    None,
    Authenticated,
    Secured,
}

/// Configuration for one mesh interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Mesh identifier (0-32 bytes)
    pub mesh_id: Vec<u8>,

    /// Protocol identifiers advertised and matched
    pub protocol: MeshProtocolIds,

    /// TTL for locally originated frames
    pub ttl: u8,

    pub security: MeshSecurity,

    /// Housekeeping period (seconds)
    pub housekeeping_interval_secs: u64,

    /// Peer inactivity limit (seconds)
    pub peer_inactivity_limit_secs: u64,

    /// Act as HWMP root and send root announcements
    pub hwmp_root_mode: bool,

    /// Root announcement interval (TUs)
    pub rann_interval_tu: u32,

    /// Minimum spacing between path discoveries (milliseconds)
    pub preq_min_interval_ms: u64,

    /// Beacon interval (TUs)
    pub beacon_interval_tu: u16,

    pub rmc: RmcConfig,
}

impl MeshConfig {
    /// Configuration for mesh `mesh_id` with defaults elsewhere
    pub fn new(mesh_id: impl Into<Vec<u8>>) -> Self {
        MeshConfig {
            mesh_id: mesh_id.into(),
            ..Default::default()
        }
    }

    pub fn housekeeping_interval(&self) -> Duration {
        Duration::from_secs(self.housekeeping_interval_secs)
    }

    pub fn peer_inactivity_limit(&self) -> Duration {
        Duration::from_secs(self.peer_inactivity_limit_secs)
    }

    pub fn rann_interval(&self) -> Duration {
        tu_to_duration(self.rann_interval_tu)
    }

    pub fn preq_min_interval(&self) -> Duration {
        Duration::from_millis(self.preq_min_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mesh_id.len() > MESH_ID_MAX_LEN {
            return Err(MeshError::Proto(meshlink_proto::ProtoError::MeshIdTooLong(
                self.mesh_id.len(),
            )));
        }
        if self.housekeeping_interval_secs == 0 {
            return Err(MeshError::InvalidConfig(
                "housekeeping interval must be non-zero".to_string(),
            ));
        }
        if self.hwmp_root_mode && self.rann_interval_tu == 0 {
            return Err(MeshError::InvalidConfig(
                "root mode requires a non-zero RANN interval".to_string(),
            ));
        }
        self.rmc.validate()
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        MeshConfig {
            mesh_id: Vec::new(),
            protocol: MeshProtocolIds::default(),
            ttl: DEFAULT_MESH_TTL,
            security: MeshSecurity::None,
            housekeeping_interval_secs: HOUSEKEEPING_INTERVAL_SECS,
            peer_inactivity_limit_secs: PEER_INACTIVITY_LIMIT_SECS,
            hwmp_root_mode: false,
            rann_interval_tu: DEFAULT_RANN_INTERVAL_TU,
            preq_min_interval_ms: DEFAULT_PREQ_MIN_INTERVAL_MS,
            beacon_interval_tu: MESH_DEFAULT_BEACON_INTERVAL_TU,
            rmc: RmcConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MeshConfig::new("meshlink");
        assert!(config.validate().is_ok());
        assert_eq!(config.rmc.buckets, 256);
        assert_eq!(config.rmc.timeout(), Duration::from_secs(3));
        assert_eq!(config.housekeeping_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_rejects_non_power_of_two_buckets() {
        let mut config = MeshConfig::new("m");
        config.rmc.buckets = 100;
        assert!(matches!(config.validate(), Err(MeshError::InvalidConfig(_))));

        config.rmc.buckets = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_long_mesh_id() {
        let config = MeshConfig::new(vec![b'a'; 33]);
        assert!(matches!(config.validate(), Err(MeshError::Proto(_))));
    }

    #[test]
    fn test_tu_conversion() {
        assert_eq!(tu_to_duration(1000), Duration::from_micros(1_024_000));
        assert_eq!(MeshConfig::default().rann_interval(), Duration::from_micros(5_120_000));
    }
}
