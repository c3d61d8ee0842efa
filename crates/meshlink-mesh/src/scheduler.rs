//! Deferred maintenance scheduling
//!
//! Timers and table-pressure signals never do maintenance themselves. They
//! set a `MeshWork` flag and schedule the single per-interface worker, which
//! consumes every pending flag in one pass. Scheduling is single-flight: any
//! number of requests made before the worker wakes collapse into one run,
//! and a request made while a run is in progress causes exactly one more.
//!
//! While the interface is quiesced, timer expiries are latched in
//! `timers_running` instead of scheduling work; `restart` re-arms them.

use crate::config::{tu_to_duration, MeshConfig};
use crate::flags::{MeshWork, TimerKind};
use crate::state::MeshRuntimeState;
use crate::timer::MeshTimer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Work performed by a consumer run
pub trait MaintenanceActions {
    /// Expire peers and paths, prune caches, refresh beacon capability
    fn housekeeping(&self);

    /// Transmit a root announcement
    fn root_announce(&self);

    fn grow_path_table(&self);

    fn grow_proxy_table(&self);

    /// Path requests waiting for transmission
    fn queued_path_requests(&self) -> usize;

    fn start_path_discovery(&self);

    /// Whether the interface is still up
    fn is_running(&self) -> bool;
}

/// Single-flight wakeup for the maintenance worker
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: AtomicBool,
    notify: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a worker run; returns false if one was already pending
    pub fn schedule(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.notify_one();
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait for the next scheduled run and mark it taken
    pub async fn wait(&self) {
        self.notify.notified().await;
        self.pending.store(false, Ordering::Release);
    }
}

/// Round a delay to the nearest whole second. Delays shorter than half a
/// second are returned unchanged.
pub fn round_coarse(delay: Duration) -> Duration {
    let secs = (delay.as_millis() + 500) / 1_000;
    if secs == 0 {
        delay
    } else {
        Duration::from_secs(secs as u64)
    }
}

/// Maintenance timers and work queue of one mesh interface
#[derive(Debug)]
pub struct MaintenanceScheduler {
    queue: WorkQueue,
    housekeeping: MeshTimer,
    path: MeshTimer,
    root: MeshTimer,
    quiescing: AtomicBool,
    housekeeping_interval: Duration,
    rann_interval: Duration,
    preq_min_interval: Duration,
}

impl MaintenanceScheduler {
    pub fn new(config: &MeshConfig) -> Self {
        MaintenanceScheduler {
            queue: WorkQueue::new(),
            housekeeping: MeshTimer::new(TimerKind::Housekeeping),
            path: MeshTimer::new(TimerKind::Path),
            root: MeshTimer::new(TimerKind::Root),
            quiescing: AtomicBool::new(false),
            housekeeping_interval: config.housekeeping_interval(),
            rann_interval: tu_to_duration(config.rann_interval_tu),
            preq_min_interval: config.preq_min_interval(),
        }
    }

    pub fn timer(&self, kind: TimerKind) -> &MeshTimer {
        match kind {
            TimerKind::Housekeeping => &self.housekeeping,
            TimerKind::Path => &self.path,
            TimerKind::Root => &self.root,
        }
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn schedule(&self) -> bool {
        self.queue.schedule()
    }

    /// Set `work` and schedule a run
    pub fn request(&self, state: &MeshRuntimeState, work: MeshWork) -> bool {
        state.work().set(work);
        self.queue.schedule()
    }

    pub fn is_quiescing(&self) -> bool {
        self.quiescing.load(Ordering::Acquire)
    }

    /// Timer expiry handler. Returns whether a worker run was scheduled.
    pub fn timer_fired(&self, kind: TimerKind, state: &MeshRuntimeState) -> bool {
        match kind {
            TimerKind::Housekeeping => {
                state.work().set(MeshWork::Housekeeping);
            }
            TimerKind::Root => {
                state.work().set(MeshWork::RootAnnounce);
            }
            TimerKind::Path => {}
        }

        if self.is_quiescing() {
            state.timers_running().set(kind);
            trace!(timer = kind.name(), "timer latched while quiesced");
            return false;
        }
        self.queue.schedule()
    }

    /// Stop every timer, remembering the ones that were pending
    pub fn quiesce(&self, state: &MeshRuntimeState) {
        self.quiescing.store(true, Ordering::Release);
        for kind in TimerKind::ALL {
            if self.timer(kind).cancel() {
                state.timers_running().set(kind);
            }
        }
        debug!(latched = state.timers_running().bits(), "maintenance quiesced");
    }

    /// Leave the quiesced state and re-arm latched timers
    pub fn restart(&self, state: &MeshRuntimeState) {
        self.quiescing.store(false, Ordering::Release);
        for kind in TimerKind::ALL {
            if state.timers_running().test_and_clear(kind) {
                self.timer(kind).re_add();
            }
        }
    }

    /// Cancel every timer
    pub fn cancel_timers(&self) {
        for kind in TimerKind::ALL {
            self.timer(kind).cancel();
        }
    }

    /// Consume every pending work flag
    pub fn run_pending(&self, state: &MeshRuntimeState, actions: &dyn MaintenanceActions) {
        if actions.queued_path_requests() > 0 {
            let now = Instant::now();
            let earliest = state.last_path_discovery() + self.preq_min_interval;
            if now > earliest {
                actions.start_path_discovery();
                state.mark_path_discovery(now);
            } else {
                self.path.arm(earliest);
            }
        }

        for work in MeshWork::ALL {
            if !state.work().test_and_clear(work) {
                continue;
            }
            match work {
                MeshWork::GrowPathTable => actions.grow_path_table(),
                MeshWork::GrowProxyTable => actions.grow_proxy_table(),
                MeshWork::Housekeeping => {
                    actions.housekeeping();
                    if actions.is_running() {
                        self.housekeeping.arm(Instant::now() + self.housekeeping_interval);
                    }
                }
                MeshWork::RootAnnounce => {
                    actions.root_announce();
                    self.root.arm(Instant::now() + round_coarse(self.rann_interval));
                }
            }
        }
    }

    /// Worker loop: run `consume` once per scheduled wakeup until cancelled
    pub async fn run_worker(&self, cancel: &CancellationToken, mut consume: impl FnMut()) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.queue.wait() => consume(),
            }
        }
        trace!("maintenance worker stopped");
    }
}
