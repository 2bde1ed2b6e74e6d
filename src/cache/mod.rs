//! Cache stores for API responses
//!
//! This module provides the keyed stores the fetch layer is built on: a
//! bounded in-memory TTL store, a durable on-disk store, a hybrid combinator
//! that reads through from memory to disk, and a negative cache that
//! remembers failures. Stores are constructed explicitly and shared by
//! cloning; there are no module-level singletons.

mod durable;
mod hybrid;
mod negative;
mod ttl;

pub use durable::DurableStore;
pub use hybrid::HybridStore;
pub use negative::{NegativeCache, NegativeCacheConfig};
pub use ttl::TtlStore;

use std::sync::{Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};

/// Locks a store mutex, recovering the inner state if a previous holder
/// panicked. Store operations never leave entries half-written, so the
/// recovered state is always usable.
pub(crate) fn lock_store<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The cache stores the fetch layer operates on, bundled for injection.
///
/// One `CacheService` is built per cache scope (normally one per process)
/// and handed to every orchestrator and to the background sweeper. Cloning
/// is cheap and shares the underlying stores.
#[derive(Debug, Clone)]
pub struct CacheService<V> {
    store: HybridStore<V>,
    negative: NegativeCache,
}

impl<V> CacheService<V> {
    /// Creates a cache service from explicitly constructed stores.
    pub fn new(store: HybridStore<V>, negative: NegativeCache) -> Self {
        Self { store, negative }
    }

    /// The positive (data) cache.
    pub fn store(&self) -> &HybridStore<V> {
        &self.store
    }

    /// The negative (failure memory) cache.
    pub fn negative(&self) -> &NegativeCache {
        &self.negative
    }

    /// Purges expired entries from the in-memory stores.
    ///
    /// Called periodically by the background sweeper; the read and write
    /// paths rely on lazy expiry instead.
    pub fn cleanup(&self) {
        self.store.cleanup();
        self.negative.cleanup();
    }

    /// Removes expired entries from the durable tier. Run once at startup.
    pub fn sweep_durable(&self) {
        self.store.sweep_durable();
    }
}

impl<V: Clone + Serialize + DeserializeOwned> CacheService<V> {
    /// Builds a service with a bounded in-memory store and, when a cache
    /// directory is available, a durable on-disk tier.
    pub fn with_defaults(max_entries: usize) -> Self {
        let store = HybridStore::new(max_entries, DurableStore::new());
        Self::new(store, NegativeCache::default())
    }
}
