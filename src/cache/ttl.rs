//! Bounded in-memory store with per-entry TTL
//!
//! Entries expire lazily: a read that finds a stale entry deletes it and
//! reports a miss. A full sweep is available via `cleanup` for the
//! background sweeper. When the store is full, inserting a new key evicts
//! the least-recently-used entry; `get` counts as use.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A single cached value with its expiry bookkeeping.
#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
    expires_at: Instant,
    /// Recency stamp, bumped on insert and on read.
    touched: u64,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

/// In-memory keyed store with TTL expiry and LRU capacity eviction.
///
/// All operations are synchronous; callers that share a store across tasks
/// wrap it in a mutex. Values are replaced wholesale, never mutated in
/// place.
#[derive(Debug)]
pub struct TtlStore<V> {
    entries: HashMap<String, Entry<V>>,
    max_entries: usize,
    /// Monotonic counter backing the recency stamps.
    clock: u64,
}

impl<V> TtlStore<V> {
    /// Creates a store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
            clock: 0,
        }
    }

    /// Stores `value` under `key`, expiring after `ttl`.
    ///
    /// Replaces any existing entry for the key. If the store is full and
    /// the key is new, the least-recently-used entry is evicted first.
    pub fn set(&mut self, key: &str, value: V, ttl: Duration) {
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.evict_lru();
        }

        let now = Instant::now();
        self.clock += 1;
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                stored_at: now,
                expires_at: now + ttl,
                touched: self.clock,
            },
        );
    }

    /// Returns the value under `key` if a live entry exists.
    ///
    /// A stale entry is deleted and reported as a miss. A hit refreshes the
    /// entry's recency for eviction purposes.
    pub fn get(&mut self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        if !self.expire_if_stale(key) {
            return None;
        }
        self.clock += 1;
        let entry = self.entries.get_mut(key)?;
        entry.touched = self.clock;
        Some(entry.value.clone())
    }

    /// Whether a live entry exists for `key`. Stale entries are deleted.
    pub fn has(&mut self, key: &str) -> bool {
        self.expire_if_stale(key)
    }

    /// Removes the entry for `key`, if any.
    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Deletes every expired entry. Called by the background sweeper.
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }

    /// Number of entries currently held, including not-yet-swept stale ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the live entry for `key` was stored, if one exists.
    pub fn stored_at(&self, key: &str) -> Option<Instant> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.stored_at)
    }

    /// Lazy expiry: deletes the entry for `key` if it is stale. Returns
    /// whether a live entry remains.
    fn expire_if_stale(&mut self, key: &str) -> bool {
        let now = Instant::now();
        let live = match self.entries.get(key) {
            Some(entry) => entry.is_live(now),
            None => return false,
        };
        if !live {
            self.entries.remove(key);
        }
        live
    }

    /// Reclaims an already-expired entry if one exists; only a store full
    /// of live entries evicts the least-recently-used one.
    fn evict_lru(&mut self) {
        let now = Instant::now();
        let victim = self
            .entries
            .iter()
            .find(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .or_else(|| {
                self.entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.touched)
                    .map(|(key, _)| key.clone())
            });
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}
