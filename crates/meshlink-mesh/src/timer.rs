//! One-shot rearmable maintenance timers
//!
//! A `MeshTimer` holds at most one pending deadline. Arming replaces the
//! deadline, cancelling clears it, and the driving task (`run`) fires the
//! callback once per deadline that is still current when it elapses.

use crate::flags::TimerKind;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug)]
pub struct MeshTimer {
    kind: TimerKind,
    deadline: watch::Sender<Option<Instant>>,
    /// Last armed expiry, kept for `re_add` after a quiesce
    expires: Mutex<Option<Instant>>,
}

impl MeshTimer {
    pub fn new(kind: TimerKind) -> Self {
        let (deadline, _) = watch::channel(None);
        MeshTimer {
            kind,
            deadline,
            expires: Mutex::new(None),
        }
    }

    /// Arm (or re-arm) the timer to fire at `at`
    pub fn arm(&self, at: Instant) {
        *self.expires.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
        self.deadline.send_replace(Some(at));
    }

    /// Disarm the timer; returns whether a deadline was pending
    pub fn cancel(&self) -> bool {
        self.deadline.send_replace(None).is_some()
    }

    /// Re-arm with the last expiry passed to `arm`. An expiry already in
    /// the past fires as soon as the driving task observes it.
    pub fn re_add(&self) -> bool {
        let expires = *self.expires.lock().unwrap_or_else(PoisonError::into_inner);
        match expires {
            Some(at) => {
                self.deadline.send_replace(Some(at));
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.borrow().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        *self.deadline.borrow()
    }

    /// Drive the timer until `cancel` is triggered, calling `on_fire` each
    /// time a pending deadline elapses.
    pub async fn run(&self, cancel: &CancellationToken, mut on_fire: impl FnMut()) {
        let mut rx = self.deadline.subscribe();

        loop {
            let current = *rx.borrow_and_update();
            match current {
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                    }
                }
                Some(at) => {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = sleep_until(at) => {
                            // Only fire if nobody re-armed or cancelled meanwhile
                            let fired = self.deadline.send_if_modified(|deadline| {
                                if *deadline == Some(at) {
                                    *deadline = None;
                                    true
                                } else {
                                    false
                                }
                            });
                            if fired {
                                trace!(timer = self.kind.name(), "timer fired");
                                on_fire();
                            }
                        }
                    }
                }
            }
        }
    }
}
