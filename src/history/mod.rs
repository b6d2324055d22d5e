//! Bounded per-interceptor hit history
//!
//! Each interceptor owns a ring buffer of its most recent hits plus a
//! cumulative counter. Appends come from the single ingestion worker; reads
//! may come from any thread at any time.

use crate::result::InterceptorHit;
use dashmap::DashMap;
use std::collections::VecDeque;

/// Default number of hits retained per interceptor
pub const DEFAULT_HIT_HISTORY_CAPACITY: usize = 500;

/// Registry key of an interceptor: `(owner server id, interceptor id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterceptorKey {
    /// Owning server id (blank for server-agnostic interceptors)
    pub server_id: String,
    /// Interceptor id
    pub interceptor_id: String,
}

impl InterceptorKey {
    /// Create a new key
    pub fn new(server_id: impl Into<String>, interceptor_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            interceptor_id: interceptor_id.into(),
        }
    }
}

#[derive(Debug, Default)]
struct HitLog {
    /// Oldest first
    entries: VecDeque<InterceptorHit>,
    /// Hits appended since creation or the last clear, including evicted ones
    total: u64,
}

/// Bounded, concurrently readable hit store
#[derive(Debug)]
pub struct HitHistory {
    capacity: usize,
    logs: DashMap<InterceptorKey, HitLog>,
}

impl HitHistory {
    /// Create a history retaining at most `capacity` hits per interceptor
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            logs: DashMap::new(),
        }
    }

    /// Per-interceptor retention bound
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a hit, evicting the oldest entry once the bound is exceeded
    ///
    /// Returns the interceptor's cumulative hit count after the append.
    pub fn append(&self, owner_server_id: &str, hit: InterceptorHit) -> u64 {
        let key = InterceptorKey::new(owner_server_id, hit.interceptor_id.clone());
        let mut log = self.logs.entry(key).or_default();
        log.entries.push_back(hit);
        while log.entries.len() > self.capacity {
            log.entries.pop_front();
        }
        log.total += 1;
        log.total
    }

    /// Up to `limit` most recent hits, newest first
    pub fn list_hits(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
        limit: usize,
    ) -> Vec<InterceptorHit> {
        let key = InterceptorKey::new(owner_server_id, interceptor_id);
        match self.logs.get(&key) {
            Some(log) => log.entries.iter().rev().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Drop every retained hit and reset the cumulative count
    ///
    /// Returns whether anything was recorded for the interceptor.
    pub fn clear_hits(&self, owner_server_id: &str, interceptor_id: &str) -> bool {
        let key = InterceptorKey::new(owner_server_id, interceptor_id);
        match self.logs.get_mut(&key) {
            Some(mut log) => {
                let had_hits = log.total > 0 || !log.entries.is_empty();
                log.entries.clear();
                log.total = 0;
                had_hits
            }
            None => false,
        }
    }

    /// Remove the interceptor's history entirely
    pub fn remove(&self, owner_server_id: &str, interceptor_id: &str) -> bool {
        let key = InterceptorKey::new(owner_server_id, interceptor_id);
        self.logs.remove(&key).is_some()
    }

    /// Cumulative hits since creation or the last clear, ignoring eviction
    pub fn total_hit_count(&self, owner_server_id: &str, interceptor_id: &str) -> u64 {
        let key = InterceptorKey::new(owner_server_id, interceptor_id);
        self.logs.get(&key).map(|log| log.total).unwrap_or(0)
    }

    /// Number of hits currently retrievable
    pub fn retained_count(&self, owner_server_id: &str, interceptor_id: &str) -> usize {
        let key = InterceptorKey::new(owner_server_id, interceptor_id);
        self.logs.get(&key).map(|log| log.entries.len()).unwrap_or(0)
    }
}

impl Default for HitHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HIT_HISTORY_CAPACITY)
    }
}
