//! Per-interface mesh runtime state

use crate::config::{MeshConfig, MeshSecurity};
use crate::error::Result;
use crate::flags::{TimerLatch, WorkFlags};
use meshlink_proto::{Channel, ExtendedAddresses, MacAddr, MeshHeader, MeshProtocolIds, SequenceCounter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use tokio::time::Instant;

/// Mutable state shared by the receive path, timers and the maintenance
/// worker of one mesh interface.
///
/// The sequence counter, flags and capability bit are atomics; the mesh id,
/// operating channel and cached beacon IEs sit behind short-lived locks
/// that are never held across collaborator calls.
#[derive(Debug)]
pub struct MeshRuntimeState {
    addr: MacAddr,
    mesh_id: RwLock<Vec<u8>>,
    protocol: MeshProtocolIds,
    security: MeshSecurity,
    ttl: u8,
    seqnum: SequenceCounter,
    accepting_plinks: AtomicBool,
    root_mode: AtomicBool,
    work: WorkFlags,
    timers_running: TimerLatch,
    channel: RwLock<Option<Channel>>,
    beacon_ies: RwLock<Vec<u8>>,
    last_preq: Mutex<Instant>,
}

impl MeshRuntimeState {
    pub fn new(addr: MacAddr, config: &MeshConfig) -> Self {
        MeshRuntimeState {
            addr,
            mesh_id: RwLock::new(config.mesh_id.clone()),
            protocol: config.protocol,
            security: config.security,
            ttl: config.ttl,
            seqnum: SequenceCounter::default(),
            accepting_plinks: AtomicBool::new(true),
            root_mode: AtomicBool::new(config.hwmp_root_mode),
            work: WorkFlags::new(),
            timers_running: TimerLatch::new(),
            channel: RwLock::new(None),
            beacon_ies: RwLock::new(Vec::new()),
            last_preq: Mutex::new(Instant::now()),
        }
    }

    /// Interface address
    pub fn addr(&self) -> MacAddr {
        self.addr
    }

    pub fn mesh_id(&self) -> Vec<u8> {
        self.mesh_id.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Run `f` over the mesh id without copying it
    pub fn with_mesh_id<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let mesh_id = self.mesh_id.read().unwrap_or_else(PoisonError::into_inner);
        f(&mesh_id)
    }

    pub(crate) fn clear_mesh_id(&self) {
        self.mesh_id.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn protocol(&self) -> MeshProtocolIds {
        self.protocol
    }

    pub fn security(&self) -> MeshSecurity {
        self.security
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    /// Sequence number the next originated header will carry
    pub fn peek_seqnum(&self) -> u32 {
        self.seqnum.peek()
    }

    /// Build the mesh header for a locally originated frame, consuming one
    /// sequence number. Address 6 without address 4/5 is rejected before a
    /// sequence number is taken.
    pub fn new_mesh_header(&self, addr4or5: Option<MacAddr>, addr6: Option<MacAddr>) -> Result<MeshHeader> {
        let ext = ExtendedAddresses::from_optional(addr4or5, addr6)?;
        Ok(MeshHeader::new(self.ttl, self.seqnum.next(), ext))
    }

    /// Accept-peer-links bit carried by the last built mesh config element
    pub fn accepting_peer_links(&self) -> bool {
        self.accepting_plinks.load(Ordering::Acquire)
    }

    /// Record the advertised accept-peer-links bit, returning the previous value
    pub fn set_accepting_peer_links(&self, accepting: bool) -> bool {
        self.accepting_plinks.swap(accepting, Ordering::AcqRel)
    }

    pub fn root_mode(&self) -> bool {
        self.root_mode.load(Ordering::Acquire)
    }

    pub(crate) fn set_root_mode(&self, enabled: bool) {
        self.root_mode.store(enabled, Ordering::Release);
    }

    /// Pending maintenance work
    pub fn work(&self) -> &WorkFlags {
        &self.work
    }

    /// Timers latched by a quiesce
    pub fn timers_running(&self) -> &TimerLatch {
        &self.timers_running
    }

    pub fn operating_channel(&self) -> Option<Channel> {
        *self.channel.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_operating_channel(&self, channel: Channel) {
        *self.channel.write().unwrap_or_else(PoisonError::into_inner) = Some(channel);
    }

    /// Replace the cached beacon IE template (vendor and RSN elements
    /// supplied by userspace)
    pub fn set_beacon_ies(&self, ies: Vec<u8>) {
        *self.beacon_ies.write().unwrap_or_else(PoisonError::into_inner) = ies;
    }

    /// Run `f` over the cached beacon IE template
    pub fn with_beacon_ies<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let ies = self.beacon_ies.read().unwrap_or_else(PoisonError::into_inner);
        f(&ies)
    }

    pub(crate) fn last_path_discovery(&self) -> Instant {
        *self.last_preq.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn mark_path_discovery(&self, at: Instant) {
        *self.last_preq.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}
