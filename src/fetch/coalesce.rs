//! Cross-instance request coalescing
//!
//! A process-wide map from cache key to the shared future of an in-flight
//! network call. A caller that finds an existing in-flight entry awaits
//! that future instead of issuing a second call, so concurrent subscribers
//! to the same resource cost one request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::cache::lock_store;

use super::{FetchError, HttpRequest, HttpResponse, Transport};

type SharedFetch = Shared<BoxFuture<'static, Result<HttpResponse, FetchError>>>;

/// Registry of in-flight fetches, shared by all orchestrator instances in
/// a cache scope. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct InflightRegistry {
    inner: Arc<Mutex<HashMap<String, SharedFetch>>>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes `request` through `transport`, deduplicating against any
    /// in-flight call for the same `key`.
    ///
    /// The first caller for a key installs the shared future; later
    /// callers for the same key await the same future and receive a clone
    /// of its result. The entry removes itself from the map when the call
    /// resolves, no matter which caller ends up driving it — the installer
    /// may be torn down mid-flight.
    pub async fn fetch(
        &self,
        key: &str,
        transport: Arc<dyn Transport>,
        request: HttpRequest,
    ) -> Result<HttpResponse, FetchError> {
        let shared = {
            let mut inflight = lock_store(&self.inner);
            match inflight.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let registry = self.inner.clone();
                    let entry_key = key.to_string();
                    let fut = async move {
                        let result = transport.execute(&request).await;
                        lock_store(&registry).remove(&entry_key);
                        result
                    }
                    .boxed()
                    .shared();
                    inflight.insert(key.to_string(), fut.clone());
                    fut
                }
            }
        };

        shared.await
    }

    /// Number of fetches currently in flight.
    pub fn len(&self) -> usize {
        lock_store(&self.inner).len()
    }

    /// Whether no fetch is currently in flight.
    pub fn is_empty(&self) -> bool {
        lock_store(&self.inner).is_empty()
    }
}
