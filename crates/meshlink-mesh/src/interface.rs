//! Mesh interface lifecycle
//!
//! `MeshInterface` owns the per-interface state, the RMC and the scheduler,
//! and the tokio tasks driving the maintenance worker and the three timers.
//! Teardown cancels and joins every task before the state is released.

use crate::beacon;
use crate::collaborators::{BeaconChange, Collaborators};
use crate::config::MeshConfig;
use crate::dispatch::{FrameDispatcher, RxDisposition, RxStatus};
use crate::error::{MeshError, Result};
use crate::flags::{MeshWork, TimerKind};
use crate::rmc::{RecentMulticastCache, RmcVerdict};
use crate::scheduler::{MaintenanceActions, MaintenanceScheduler};
use crate::state::MeshRuntimeState;
use meshlink_proto::{FrameBuf, MacAddr, MeshHeader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Shared {
    config: MeshConfig,
    state: MeshRuntimeState,
    rmc: Mutex<RecentMulticastCache>,
    scheduler: MaintenanceScheduler,
    collab: Collaborators,
    running: AtomicBool,
}

impl Shared {
    fn rmc(&self) -> MutexGuard<'_, RecentMulticastCache> {
        self.rmc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_up(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn root_setup(&self) {
        if self.state.root_mode() {
            self.state.work().set(MeshWork::RootAnnounce);
        } else {
            self.state.work().clear(MeshWork::RootAnnounce);
            self.scheduler.timer(TimerKind::Root).cancel();
        }
    }
}

impl MaintenanceActions for Shared {
    fn housekeeping(&self) {
        debug!("mesh housekeeping");
        self.collab
            .peers
            .expire_inactive_peers(self.config.peer_inactivity_limit());
        self.collab.paths.expire_stale_paths();

        let purged = self.rmc().purge_expired(Instant::now());
        if purged > 0 {
            debug!(purged, "expired RMC entries released");
        }

        // The advertised bit only changes when the beacon is rebuilt
        if self.collab.peers.available_peer_slots() != self.state.accepting_peer_links() {
            self.collab.beacon.beacon_changed(BeaconChange::Content);
        }
    }

    fn root_announce(&self) {
        debug!("transmitting root announcement");
        self.collab.paths.transmit_root_announcement();
    }

    fn grow_path_table(&self) {
        self.collab.paths.grow_path_table();
    }

    fn grow_proxy_table(&self) {
        self.collab.paths.grow_proxy_table();
    }

    fn queued_path_requests(&self) -> usize {
        self.collab.paths.queued_path_requests()
    }

    fn start_path_discovery(&self) {
        self.collab.paths.start_path_discovery();
    }

    fn is_running(&self) -> bool {
        self.is_up()
    }
}

/// One 802.11s mesh interface
pub struct MeshInterface {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl MeshInterface {
    /// Create a stopped interface with address `addr`
    pub fn new(addr: MacAddr, config: MeshConfig, collab: Collaborators) -> Result<Self> {
        config.validate()?;

        let shared = Shared {
            state: MeshRuntimeState::new(addr, &config),
            rmc: Mutex::new(RecentMulticastCache::new(&config.rmc)?),
            scheduler: MaintenanceScheduler::new(&config),
            collab,
            running: AtomicBool::new(false),
            config,
        };

        Ok(MeshInterface {
            shared: Arc::new(shared),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    pub fn state(&self) -> &MeshRuntimeState {
        &self.shared.state
    }

    pub fn config(&self) -> &MeshConfig {
        &self.shared.config
    }

    pub fn scheduler(&self) -> &MaintenanceScheduler {
        &self.shared.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_up()
    }

    /// Spawn the maintenance worker and timers and enable beaconing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let shared = self.shared.clone();
        let cancel = self.cancel.clone();
        self.tasks.push(tokio::spawn(async move {
            shared
                .scheduler
                .run_worker(&cancel, || shared.scheduler.run_pending(&shared.state, &*shared))
                .await;
        }));

        for kind in TimerKind::ALL {
            let shared = self.shared.clone();
            let cancel = self.cancel.clone();
            self.tasks.push(tokio::spawn(async move {
                shared
                    .scheduler
                    .timer(kind)
                    .run(&cancel, || {
                        shared.scheduler.timer_fired(kind, &shared.state);
                    })
                    .await;
            }));
        }

        let shared = &self.shared;
        shared.state.work().set(MeshWork::Housekeeping);
        shared.root_setup();
        shared.scheduler.schedule();
        shared.collab.beacon.beacon_changed(BeaconChange::Enabled {
            interval_tu: shared.config.beacon_interval_tu,
        });

        info!(addr = %shared.state.addr(), "mesh interface started");
        Ok(())
    }

    /// Stop beaconing, flush peers, then cancel and join every task
    pub async fn shutdown(mut self) -> Result<()> {
        let shared = self.shared.clone();
        shared.running.store(false, Ordering::Release);

        shared.state.clear_mesh_id();
        shared.collab.beacon.beacon_changed(BeaconChange::Disabled);
        shared.collab.peers.flush();

        shared.scheduler.cancel_timers();
        self.cancel.cancel();

        let mut result = Ok(());
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!("mesh task failed during shutdown: {}", e);
                if result.is_ok() {
                    result = Err(MeshError::Join(e));
                }
            }
        }

        shared.state.work().clear_all();
        shared.rmc().clear();
        info!(addr = %shared.state.addr(), "mesh interface stopped");
        result
    }

    /// Suspend maintenance, latching timers that were pending
    pub fn quiesce(&self) {
        self.shared.scheduler.quiesce(&self.shared.state);
    }

    /// Resume after `quiesce`
    pub fn restart(&self) {
        self.shared.scheduler.restart(&self.shared.state);
        self.shared.root_setup();
        if self.shared.state.root_mode() && self.is_running() {
            self.shared.scheduler.schedule();
        }
    }

    /// Enable or disable HWMP root announcements
    pub fn set_root_mode(&self, enabled: bool) {
        self.shared.state.set_root_mode(enabled);
        self.shared.root_setup();
        if enabled && self.is_running() {
            self.shared.scheduler.schedule();
        }
    }

    /// Refresh the advertised accept-peer-links bit if peer-slot
    /// availability changed
    pub fn accept_plinks_update(&self) {
        let shared = &self.shared;
        if shared.collab.peers.available_peer_slots() != shared.state.accepting_peer_links() {
            shared.scheduler.timer_fired(TimerKind::Housekeeping, &shared.state);
        }
    }

    /// Kick the maintenance worker after a scan
    pub fn notify_scan_completed(&self) -> Result<()> {
        self.ensure_running()?;
        self.shared.scheduler.schedule();
        Ok(())
    }

    /// Ask the worker to grow the path or proxy table
    pub fn request_table_growth(&self, work: MeshWork) -> Result<()> {
        self.ensure_running()?;
        self.shared.scheduler.request(&self.shared.state, work);
        Ok(())
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(MeshError::NotRunning)
        }
    }

    /// Duplicate check for a group-addressed frame from `sa`
    pub fn rmc_check(&self, sa: &MacAddr, seqnum: u32) -> RmcVerdict {
        self.shared.rmc().check_and_insert(sa, seqnum, Instant::now())
    }

    /// Duplicate check keyed by a received mesh header
    pub fn rx_multicast(&self, sa: &MacAddr, header: &MeshHeader) -> RmcVerdict {
        self.shared.rmc().check_header(sa, header, Instant::now())
    }

    /// Mesh header for a locally originated frame
    pub fn new_mesh_header(&self, addr4or5: Option<MacAddr>, addr6: Option<MacAddr>) -> Result<MeshHeader> {
        self.shared.state.new_mesh_header(addr4or5, addr6)
    }

    /// Route a received management frame
    pub fn dispatch(&self, frame: &[u8], status: &RxStatus) -> RxDisposition {
        FrameDispatcher::new(&self.shared.state, &self.shared.collab).dispatch(frame, status)
    }

    /// Append the mesh elements of a beacon or probe response to `buf`
    pub fn build_beacon_ies(&self, buf: &mut FrameBuf) -> usize {
        beacon::add_mesh_ies(&self.shared.state, self.shared.collab.peers.as_ref(), buf)
    }
}

impl Drop for MeshInterface {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fakes, LOCAL_ADDR};
    use std::time::Duration;

    fn interface(config: MeshConfig) -> (MeshInterface, Fakes) {
        let fakes = Fakes::new();
        let iface = MeshInterface::new(LOCAL_ADDR, config, fakes.collab.clone()).unwrap();
        (iface, fakes)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let fakes = Fakes::new();
        let mut config = MeshConfig::new("mesh");
        config.rmc.buckets = 100;
        assert!(matches!(
            MeshInterface::new(LOCAL_ADDR, config, fakes.collab),
            Err(MeshError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_kicks_require_running() {
        let (iface, _fakes) = interface(MeshConfig::new("mesh"));
        assert!(matches!(iface.notify_scan_completed(), Err(MeshError::NotRunning)));
        assert!(matches!(
            iface.request_table_growth(MeshWork::GrowProxyTable),
            Err(MeshError::NotRunning)
        ));
        assert!(iface.state().work().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_initial_housekeeping() {
        let (mut iface, fakes) = interface(MeshConfig::new("mesh"));
        iface.start().unwrap();
        assert!(iface.is_running());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fakes.peers.expire_calls(), 1);
        assert_eq!(fakes.paths.expire_calls(), 1);
        assert!(iface.scheduler().timer(TimerKind::Housekeeping).is_pending());
        assert_eq!(
            fakes.beacon.changes().first(),
            Some(&BeaconChange::Enabled { interval_tu: 1_000 })
        );

        iface.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_housekeeping() {
        let (mut iface, fakes) = interface(MeshConfig::new("mesh"));
        iface.start().unwrap();

        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(fakes.peers.expire_calls(), 3);

        iface.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_root_mode_announces() {
        let mut config = MeshConfig::new("mesh");
        config.hwmp_root_mode = true;
        let (mut iface, fakes) = interface(config);
        iface.start().unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fakes.paths.root_announcements(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fakes.paths.root_announcements(), 2);

        iface.set_root_mode(false);
        assert!(!iface.scheduler().timer(TimerKind::Root).is_pending());
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(fakes.paths.root_announcements(), 2);

        iface.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_plinks_update_refreshes_beacon() {
        let (mut iface, fakes) = interface(MeshConfig::new("mesh"));
        iface.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Unchanged availability: nothing to do
        iface.accept_plinks_update();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fakes.peers.expire_calls(), 1);

        fakes.peers.set_available(false);
        iface.accept_plinks_update();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fakes.peers.expire_calls(), 2);
        assert!(fakes.beacon.changes().contains(&BeaconChange::Content));
        assert!(iface.state().accepting_peer_links());

        // Beacon not rebuilt yet: the difference is still seen
        iface.accept_plinks_update();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fakes.peers.expire_calls(), 3);

        let mut buf = FrameBuf::with_capacity(256);
        iface.build_beacon_ies(&mut buf);
        assert!(!iface.state().accepting_peer_links());

        iface.accept_plinks_update();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fakes.peers.expire_calls(), 3);

        iface.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_table_growth_request() {
        let (mut iface, fakes) = interface(MeshConfig::new("mesh"));
        iface.start().unwrap();

        iface.request_table_growth(MeshWork::GrowPathTable).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fakes.paths.path_table_grows(), 1);

        iface.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_tears_down() {
        let (mut iface, fakes) = interface(MeshConfig::new("mesh"));
        iface.start().unwrap();
        iface.rmc_check(&MacAddr::new([2, 0, 0, 0, 0, 9]), 1);

        iface.shutdown().await.unwrap();
        assert_eq!(fakes.peers.flushes(), 1);
        assert_eq!(fakes.beacon.changes().last(), Some(&BeaconChange::Disabled));
    }
}
