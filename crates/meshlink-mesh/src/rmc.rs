//! Recent multicast cache
//!
//! Duplicate suppression for group-addressed mesh frames, keyed by
//! (mesh source address, mesh sequence number).
//!
//! The table is an array of buckets selected by the low bits of the
//! sequence number. Each bucket is ordered newest-first and self-prunes
//! while it is scanned: entries past their expiry time, and every entry at
//! or beyond the per-bucket cap, are evicted as the scan reaches them. No
//! separate sweep is required for correctness; `purge_expired` exists so
//! housekeeping can release memory from idle buckets.
//!
//! The bucket index is the raw sequence number masked, with no mixing. A
//! sender choosing sequence numbers can concentrate entries on one bucket;
//! the per-bucket cap bounds the cost of that.

use crate::config::RmcConfig;
use crate::error::Result;
use meshlink_proto::{MacAddr, MeshHeader};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Outcome of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmcVerdict {
    /// Seen within the timeout window; drop the frame
    Duplicate,
    /// Not seen (now recorded); process the frame
    Fresh,
}

impl RmcVerdict {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RmcVerdict::Duplicate)
    }
}

#[derive(Debug, Clone)]
struct RmcEntry {
    sa: MacAddr,
    seqnum: u32,
    expires_at: Instant,
}

/// Bounded, time-expiring set of recently seen (source, seqnum) pairs
#[derive(Debug)]
pub struct RecentMulticastCache {
    buckets: Vec<VecDeque<RmcEntry>>,
    idx_mask: u32,
    queue_max_len: usize,
    timeout: Duration,
}

impl RecentMulticastCache {
    /// Create an empty cache sized by `config`
    pub fn new(config: &RmcConfig) -> Result<Self> {
        config.validate()?;

        let buckets = (0..config.buckets)
            .map(|_| VecDeque::with_capacity(config.queue_max_len))
            .collect();

        Ok(RecentMulticastCache {
            buckets,
            idx_mask: (config.buckets - 1) as u32,
            queue_max_len: config.queue_max_len,
            timeout: config.timeout(),
        })
    }

    /// Bucket a sequence number maps to
    pub fn bucket_index(&self, seqnum: u32) -> usize {
        (seqnum & self.idx_mask) as usize
    }

    /// Check whether (`sa`, `seqnum`) was seen recently; record it if not.
    ///
    /// Allocation failure while recording reports `Fresh`: admitting an
    /// occasional duplicate is preferable to dropping a legitimate frame.
    pub fn check_and_insert(&mut self, sa: &MacAddr, seqnum: u32, now: Instant) -> RmcVerdict {
        let idx = self.bucket_index(seqnum);
        let queue_max_len = self.queue_max_len;
        let bucket = &mut self.buckets[idx];

        let mut kept = 0;
        let mut pos = 0;
        while pos < bucket.len() {
            let entry = &bucket[pos];
            if now > entry.expires_at || kept + 1 == queue_max_len {
                bucket.remove(pos);
                continue;
            }
            if entry.seqnum == seqnum && entry.sa == *sa {
                return RmcVerdict::Duplicate;
            }
            kept += 1;
            pos += 1;
        }

        if bucket.try_reserve(1).is_err() {
            warn!(%sa, seqnum, "RMC insert failed, admitting frame");
            return RmcVerdict::Fresh;
        }

        bucket.push_front(RmcEntry {
            sa: *sa,
            seqnum,
            expires_at: now + self.timeout,
        });
        RmcVerdict::Fresh
    }

    /// `check_and_insert` keyed by a received mesh header
    pub fn check_header(&mut self, sa: &MacAddr, header: &MeshHeader, now: Instant) -> RmcVerdict {
        self.check_and_insert(sa, header.seqnum, now)
    }

    /// Drop expired entries from every bucket
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        for bucket in &mut self.buckets {
            let before = bucket.len();
            bucket.retain(|entry| now <= entry.expires_at);
            removed += before - bucket.len();
        }
        removed
    }

    /// Entries currently held in bucket `idx`
    pub fn bucket_len(&self, idx: usize) -> usize {
        self.buckets.get(idx).map_or(0, VecDeque::len)
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn queue_max_len(&self) -> usize {
        self.queue_max_len
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Total entries across all buckets
    pub fn len(&self) -> usize {
        self.buckets.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(VecDeque::is_empty)
    }

    /// Release every entry
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }
}
