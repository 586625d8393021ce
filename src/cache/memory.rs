//! In-process counter cache.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use super::CounterCache;
use crate::error::Result;
use crate::ratelimit::BucketKey;

/// A single counter and its optional deadline.
#[derive(Debug, Clone, Copy)]
struct Entry {
    count: i64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Counter cache held in process memory.
///
/// Increments are atomic per key through `DashMap` entry locking. Expired
/// counters read as absent and are dropped when touched, and every increment
/// sweeps the whole map, so storage stays bounded by the live buckets. Counts
/// are only shared between limiters holding the same instance, so this suits
/// tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryCounterCache {
    counters: DashMap<String, Entry>,
}

impl MemoryCounterCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) counters.
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.counters.len()
    }

    /// Whether no live counters are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time-to-live of a counter, if one is set and it is still live.
    pub fn ttl(&self, key: &BucketKey) -> Option<Duration> {
        let now = Instant::now();
        let entry = self.counters.get(&key.to_string())?;
        let deadline = entry.expires_at?;
        deadline.checked_duration_since(now).filter(|d| !d.is_zero())
    }

    /// Remove every counter.
    pub fn clear(&self) {
        self.counters.clear();
    }

    /// Drop every counter whose deadline has passed.
    fn purge_expired(&self) {
        let now = Instant::now();
        self.counters.retain(|_, e| !e.is_expired(now));
    }
}

#[async_trait]
impl CounterCache for MemoryCounterCache {
    async fn increment(&self, key: &BucketKey) -> Result<i64> {
        self.purge_expired();

        let now = Instant::now();
        let mut entry = self.counters.entry(key.to_string()).or_insert(Entry {
            count: 0,
            expires_at: None,
        });

        if entry.is_expired(now) {
            *entry = Entry {
                count: 0,
                expires_at: None,
            };
        }

        entry.count += 1;
        trace!(key = %key, count = entry.count, "Incremented in-memory counter");
        Ok(entry.count)
    }

    async fn get(&self, key: &BucketKey) -> Result<i64> {
        let now = Instant::now();
        let key = key.to_string();

        if let Some(entry) = self.counters.get(&key) {
            if !entry.is_expired(now) {
                return Ok(entry.count);
            }
        }

        // The read guard is released above; removing under it would deadlock.
        self.counters.remove_if(&key, |_, e| e.is_expired(now));
        Ok(0)
    }

    async fn expire(&self, key: &BucketKey, ttl_secs: u64) -> Result<()> {
        let now = Instant::now();
        let key = key.to_string();

        if let Some(mut entry) = self.counters.get_mut(&key) {
            if !entry.is_expired(now) {
                entry.expires_at = Some(now + Duration::from_secs(ttl_secs));
                return Ok(());
            }
        }

        self.counters.remove_if(&key, |_, e| e.is_expired(now));
        Ok(())
    }
}
