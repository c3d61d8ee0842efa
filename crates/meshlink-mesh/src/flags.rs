//! Atomic flag sets for pending maintenance work and suspended timers

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

/// A flag that occupies one bit of an `AtomicFlagSet`
pub trait FlagBit: Copy {
    fn bit(self) -> u32;
}

/// Maintenance activities a consumer run can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshWork {
    Housekeeping,
    RootAnnounce,
    GrowPathTable,
    GrowProxyTable,
}

impl MeshWork {
    pub const ALL: [MeshWork; 4] = [
        MeshWork::GrowPathTable,
        MeshWork::GrowProxyTable,
        MeshWork::Housekeeping,
        MeshWork::RootAnnounce,
    ];
}

impl FlagBit for MeshWork {
    fn bit(self) -> u32 {
        match self {
            MeshWork::Housekeeping => 1 << 0,
            MeshWork::RootAnnounce => 1 << 1,
            MeshWork::GrowPathTable => 1 << 2,
            MeshWork::GrowProxyTable => 1 << 3,
        }
    }
}

/// The per-interface maintenance timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Housekeeping,
    Path,
    Root,
}

impl TimerKind {
    pub const ALL: [TimerKind; 3] = [TimerKind::Housekeeping, TimerKind::Path, TimerKind::Root];

    pub fn name(self) -> &'static str {
        match self {
            TimerKind::Housekeeping => "housekeeping",
            TimerKind::Path => "path",
            TimerKind::Root => "root",
        }
    }
}

impl FlagBit for TimerKind {
    fn bit(self) -> u32 {
        match self {
            TimerKind::Housekeeping => 1 << 0,
            TimerKind::Path => 1 << 1,
            TimerKind::Root => 1 << 2,
        }
    }
}

/// Lock-free bit set with set / test-and-clear semantics
pub struct AtomicFlagSet<F> {
    bits: AtomicU32,
    _flag: PhantomData<F>,
}

/// Pending maintenance work
pub type WorkFlags = AtomicFlagSet<MeshWork>;

/// Timers that were running when the interface was quiesced
pub type TimerLatch = AtomicFlagSet<TimerKind>;

impl<F: FlagBit> AtomicFlagSet<F> {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(0),
            _flag: PhantomData,
        }
    }

    /// Set `flag`; returns whether it was already set
    pub fn set(&self, flag: F) -> bool {
        self.bits.fetch_or(flag.bit(), Ordering::AcqRel) & flag.bit() != 0
    }

    /// Clear `flag`
    pub fn clear(&self, flag: F) {
        self.bits.fetch_and(!flag.bit(), Ordering::AcqRel);
    }

    /// Clear `flag`, returning whether it was set
    pub fn test_and_clear(&self, flag: F) -> bool {
        self.bits.fetch_and(!flag.bit(), Ordering::AcqRel) & flag.bit() != 0
    }

    /// Clear every flag, returning the previous bits
    pub fn clear_all(&self) -> u32 {
        self.bits.swap(0, Ordering::AcqRel)
    }

    pub fn contains(&self, flag: F) -> bool {
        self.bits.load(Ordering::Acquire) & flag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits.load(Ordering::Acquire) == 0
    }

    pub fn bits(&self) -> u32 {
        self.bits.load(Ordering::Acquire)
    }
}

impl<F: FlagBit> Default for AtomicFlagSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for AtomicFlagSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomicFlagSet({:#06b})", self.bits.load(Ordering::Relaxed))
    }
}
