//! Two-tier read-through/write-through store
//!
//! Composes the in-memory TTL store (warm tier) with the durable on-disk
//! store (cold tier). Reads check memory first and fall back to disk,
//! repopulating memory on a disk hit; writes go to both tiers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::{lock_store, DurableStore, TtlStore};

/// Default TTL given to entries promoted from the durable tier. Kept short
/// so a long-lived disk entry is re-validated against the network before
/// the warm tier trusts it for a full caller-supplied TTL again.
const DEFAULT_PROMOTE_TTL: Duration = Duration::from_secs(5 * 60);

/// Read-through/write-through combinator over the warm and durable tiers.
///
/// Cloning shares the underlying stores, which is how independent
/// orchestrator instances see one cache. The durable tier is optional;
/// without it the store degrades to the in-memory tier alone.
#[derive(Debug, Clone)]
pub struct HybridStore<V> {
    fast: Arc<Mutex<TtlStore<V>>>,
    durable: Option<DurableStore>,
    promote_ttl: Duration,
}

impl<V> HybridStore<V> {
    /// Creates a hybrid store with a bounded warm tier and an optional
    /// durable tier.
    pub fn new(max_entries: usize, durable: Option<DurableStore>) -> Self {
        Self {
            fast: Arc::new(Mutex::new(TtlStore::new(max_entries))),
            durable,
            promote_ttl: DEFAULT_PROMOTE_TTL,
        }
    }

    /// Overrides the TTL used when promoting durable hits into memory.
    pub fn with_promote_ttl(mut self, promote_ttl: Duration) -> Self {
        self.promote_ttl = promote_ttl;
        self
    }

    /// Purges expired entries from the warm tier.
    pub fn cleanup(&self) {
        lock_store(&self.fast).cleanup();
    }

    /// Removes expired entries from the durable tier, if present.
    pub fn sweep_durable(&self) {
        if let Some(durable) = &self.durable {
            durable.sweep_expired();
        }
    }

    /// Number of entries currently held in the warm tier, including stale
    /// entries that have not been swept or lazily expired yet.
    pub fn warm_len(&self) -> usize {
        lock_store(&self.fast).len()
    }
}

impl<V: Clone + Serialize + DeserializeOwned> HybridStore<V> {
    /// Returns the value under `key`, reading through to the durable tier.
    ///
    /// A durable hit is written back into the warm tier with the promote
    /// TTL before being returned.
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(value) = lock_store(&self.fast).get(key) {
            return Some(value);
        }

        let value: V = self.durable.as_ref()?.get(key)?;
        debug!(key, "cache: durable hit, promoting to memory");
        lock_store(&self.fast).set(key, value.clone(), self.promote_ttl);
        Some(value)
    }

    /// Writes `value` to both tiers with independent TTLs.
    pub fn set(&self, key: &str, value: &V, fast_ttl: Duration, durable_ttl: Duration) {
        lock_store(&self.fast).set(key, value.clone(), fast_ttl);
        if let Some(durable) = &self.durable {
            durable.set(key, value, durable_ttl);
        }
    }

    /// Whether either tier holds a live entry for `key`.
    pub fn has(&self, key: &str) -> bool {
        if lock_store(&self.fast).has(key) {
            return true;
        }
        self.durable.as_ref().is_some_and(|durable| durable.has(key))
    }

    /// Removes `key` from both tiers.
    pub fn delete(&self, key: &str) {
        lock_store(&self.fast).delete(key);
        if let Some(durable) = &self.durable {
            durable.delete(key);
        }
    }

    /// Removes all entries from both tiers.
    pub fn clear(&self) {
        lock_store(&self.fast).clear();
        if let Some(durable) = &self.durable {
            durable.clear();
        }
    }
}
