//! Durable on-disk cache store
//!
//! Mirrors the TTL store contract on top of JSON files in an XDG-compliant
//! cache directory. Disk is a larger but slower tier, and durability is an
//! optimization: every persistence failure (missing directory, quota,
//! unreadable file) degrades to a no-op rather than an error.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

/// Fixed namespace prefix for cache files, so the store can identify its
/// own entries when sweeping or clearing a shared directory.
const FILE_PREFIX: &str = "placescout-";

/// On-disk record shape: the value plus its expiry as epoch milliseconds.
#[derive(Debug, Serialize, Deserialize)]
struct DurableEntry<T> {
    value: T,
    expires_at: i64,
}

/// Probe type for expiry checks that skips decoding the value.
#[derive(Debug, Deserialize)]
struct ExpiryProbe {
    expires_at: i64,
}

/// Persistence-backed keyed store with TTL expiry.
///
/// Entries are serialized as `{ value, expires_at }` JSON files. Expiry is
/// lazy on read, mirroring [`TtlStore`](super::TtlStore); a startup sweep
/// via [`sweep_expired`](Self::sweep_expired) removes leftovers from
/// previous runs.
#[derive(Debug, Clone)]
pub struct DurableStore {
    cache_dir: PathBuf,
}

impl DurableStore {
    /// Creates a store in the platform cache directory
    /// (`~/.cache/placescout/` on Linux).
    ///
    /// Returns `None` when no cache directory can be determined; callers
    /// then run without a durable tier.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "placescout")?;
        Some(Self {
            cache_dir: project_dirs.cache_dir().to_path_buf(),
        })
    }

    /// Creates a store in a specific directory. Used by tests.
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Stores `value` under `key`, expiring after `ttl`.
    ///
    /// Failures are swallowed: the entry is simply not persisted.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let expires_at = Utc::now()
            .timestamp_millis()
            .saturating_add(ttl.as_millis() as i64);
        let entry = DurableEntry { value, expires_at };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(err) => {
                warn!(key, error = %err, "durable cache: failed to serialize entry");
                return;
            }
        };

        if let Err(err) = fs::create_dir_all(&self.cache_dir) {
            warn!(key, error = %err, "durable cache: failed to create cache dir");
            return;
        }
        if let Err(err) = fs::write(self.entry_path(key), json) {
            warn!(key, error = %err, "durable cache: failed to write entry");
        }
    }

    /// Returns the value under `key` if a live entry exists on disk.
    ///
    /// A stale or unreadable entry is deleted and reported as a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;

        let entry: DurableEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(key, error = %err, "durable cache: dropping undecodable entry");
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if Utc::now().timestamp_millis() > entry.expires_at {
            let _ = fs::remove_file(&path);
            return None;
        }
        Some(entry.value)
    }

    /// Whether a live entry exists for `key`. Stale entries are deleted.
    pub fn has(&self, key: &str) -> bool {
        let path = self.entry_path(key);
        let Ok(content) = fs::read_to_string(&path) else {
            return false;
        };
        match serde_json::from_str::<ExpiryProbe>(&content) {
            Ok(probe) if Utc::now().timestamp_millis() <= probe.expires_at => true,
            _ => {
                let _ = fs::remove_file(&path);
                false
            }
        }
    }

    /// Removes the entry for `key`, if any.
    pub fn delete(&self, key: &str) {
        let _ = fs::remove_file(self.entry_path(key));
    }

    /// Removes every entry owned by this store.
    pub fn clear(&self) {
        for path in self.entry_files() {
            let _ = fs::remove_file(path);
        }
    }

    /// Deletes all expired entries. Run once at startup by the sweeper;
    /// after that, expiry on this tier is lazy on read.
    pub fn sweep_expired(&self) {
        let now = Utc::now().timestamp_millis();
        let mut removed = 0usize;

        for path in self.entry_files() {
            let live = fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<ExpiryProbe>(&content).ok())
                .is_some_and(|probe| now <= probe.expires_at);
            if !live && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "durable cache: swept expired entries");
        }
    }

    /// File path for a cache key: sanitized key fragment for legibility
    /// plus a hash of the full key for uniqueness.
    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let fragment: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .take(48)
            .collect();
        self.cache_dir
            .join(format!("{FILE_PREFIX}{fragment}-{:016x}.json", hasher.finish()))
    }

    /// All cache files owned by this store, identified by the name prefix.
    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(dir) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        dir.filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(FILE_PREFIX))
            })
            .collect()
    }
}
