//! Negative cache: failure memoization
//!
//! Remembers that a fetch for a key failed so the orchestrator can suppress
//! immediate re-attempts. Two records exist per logical key: a long-lived
//! *final* record for failures that will not resolve on their own, and a
//! short-lived *transient* record written on every failure to throttle
//! retries.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::fetch::Classification;

use super::{lock_store, TtlStore};

/// Derived-key suffix for final (non-retryable) failure records.
const FINAL_ERROR_SUFFIX: &str = ":final_error";
/// Derived-key suffix for transient failure records.
const TRANSIENT_ERROR_SUFFIX: &str = ":error";

const DEFAULT_MAX_RECORDS: usize = 512;

/// TTLs for the two failure-record flavors.
#[derive(Debug, Clone)]
pub struct NegativeCacheConfig {
    /// How long a non-retryable failure suppresses fetches.
    pub final_ttl: Duration,
    /// How long any failure throttles immediate re-attempts.
    pub transient_ttl: Duration,
}

impl Default for NegativeCacheConfig {
    fn default() -> Self {
        Self {
            final_ttl: Duration::from_secs(60 * 60),
            transient_ttl: Duration::from_secs(30),
        }
    }
}

/// Failure memory shared by all orchestrator instances in a cache scope.
#[derive(Debug, Clone)]
pub struct NegativeCache {
    records: Arc<Mutex<TtlStore<bool>>>,
    config: NegativeCacheConfig,
}

impl Default for NegativeCache {
    fn default() -> Self {
        Self::new(NegativeCacheConfig::default())
    }
}

impl NegativeCache {
    pub fn new(config: NegativeCacheConfig) -> Self {
        Self {
            records: Arc::new(Mutex::new(TtlStore::new(DEFAULT_MAX_RECORDS))),
            config,
        }
    }

    /// Records a classified failure for `key`.
    ///
    /// Every failure writes the transient record; a non-retryable failure
    /// additionally writes the final record.
    pub fn record_failure(&self, key: &str, classification: Classification) {
        let mut records = lock_store(&self.records);
        records.set(
            &format!("{key}{TRANSIENT_ERROR_SUFFIX}"),
            true,
            self.config.transient_ttl,
        );
        if classification == Classification::NonRetryable {
            records.set(
                &format!("{key}{FINAL_ERROR_SUFFIX}"),
                true,
                self.config.final_ttl,
            );
        }
    }

    /// Whether an unexpired final failure record exists for `key`.
    pub fn has_final(&self, key: &str) -> bool {
        lock_store(&self.records).has(&format!("{key}{FINAL_ERROR_SUFFIX}"))
    }

    /// Whether an unexpired transient failure record exists for `key`.
    pub fn has_transient(&self, key: &str) -> bool {
        lock_store(&self.records).has(&format!("{key}{TRANSIENT_ERROR_SUFFIX}"))
    }

    /// Forgets both failure records for `key`. Called on a subsequent
    /// success and by `force_refetch`.
    pub fn clear(&self, key: &str) {
        let mut records = lock_store(&self.records);
        records.delete(&format!("{key}{FINAL_ERROR_SUFFIX}"));
        records.delete(&format!("{key}{TRANSIENT_ERROR_SUFFIX}"));
    }

    /// Purges expired records. Called by the background sweeper.
    pub fn cleanup(&self) {
        lock_store(&self.records).cleanup();
    }
}
