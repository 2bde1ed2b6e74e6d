//! Fetch orchestrator
//!
//! The controller a UI subscriber attaches to. On every activation it
//! decides, in order: serve the cached failure (final, then transient),
//! serve the cached value, or issue a network call through the in-flight
//! registry. Outcomes are classified, memoized, and published to
//! subscribers as [`FetchState`] through a watch channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::cache::CacheService;

use super::{
    classify, Classification, FetchError, HttpRequest, HttpResponse, InflightRegistry, Transport,
};

const DEFAULT_FRESH_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_DURABLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A resource to fetch: the HTTP request plus the TTLs a successful value
/// is cached under in the warm and durable tiers.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub request: HttpRequest,
    pub fresh_ttl: Duration,
    pub durable_ttl: Duration,
}

impl ResourceRequest {
    /// Wraps a request with the default cache TTLs (5 minutes warm, one
    /// day durable).
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            fresh_ttl: DEFAULT_FRESH_TTL,
            durable_ttl: DEFAULT_DURABLE_TTL,
        }
    }

    pub fn with_fresh_ttl(mut self, ttl: Duration) -> Self {
        self.fresh_ttl = ttl;
        self
    }

    pub fn with_durable_ttl(mut self, ttl: Duration) -> Self {
        self.durable_ttl = ttl;
        self
    }

    /// Cache key identifying this resource.
    pub fn cache_key(&self) -> String {
        self.request.cache_key()
    }
}

/// The state a subscriber observes.
#[derive(Debug, Clone)]
pub struct FetchState<V> {
    /// The decoded value, when a fetch or cache read succeeded.
    pub data: Option<V>,
    /// Whether a network call is currently in flight for this instance.
    pub loading: bool,
    /// The most recent failure, if any.
    pub error: Option<FetchError>,
    /// Whether `error` is final: no retry happens without a force-refresh.
    pub is_final_error: bool,
    /// Whether a network attempt has completed for this subscription.
    pub has_attempted: bool,
}

impl<V> Default for FetchState<V> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            is_final_error: false,
            has_attempted: false,
        }
    }
}

impl<V> FetchState<V> {
    /// Whether the current error may resolve on its own.
    pub fn is_temporary_error(&self) -> bool {
        self.error.is_some() && !self.is_final_error
    }
}

/// Per-subscriber fetch controller.
///
/// Each subscriber owns one orchestrator instance; instances share the
/// cache service, in-flight registry, and transport. The `loading` flag is
/// per instance, so independent subscribers never block each other, while
/// concurrent calls for the same key still coalesce into one request.
pub struct FetchOrchestrator<V> {
    service: CacheService<V>,
    inflight: InflightRegistry,
    transport: Arc<dyn Transport>,
    state_tx: watch::Sender<FetchState<V>>,
    loading: AtomicBool,
    detached: AtomicBool,
}

impl<V> FetchOrchestrator<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    pub fn new(
        service: CacheService<V>,
        transport: Arc<dyn Transport>,
        inflight: InflightRegistry,
    ) -> Self {
        let (state_tx, _) = watch::channel(FetchState::default());
        Self {
            service,
            inflight,
            transport,
            state_tx,
            loading: AtomicBool::new(false),
            detached: AtomicBool::new(false),
        }
    }

    /// A receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<V>> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState<V> {
        self.state_tx.borrow().clone()
    }

    /// Marks the subscription as torn down.
    ///
    /// An in-flight call still completes and updates the shared caches,
    /// but no further state is published to this instance's channel.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    /// Runs the full activation rule set for `resource`.
    ///
    /// Called on first attach, on key change, and by [`refetch`]
    /// (Self::refetch). Cached failures and cached values are served
    /// without touching the network.
    pub async fn activate(&self, resource: &ResourceRequest) {
        let key = resource.cache_key();

        // A remembered final failure suppresses the fetch entirely.
        if self.service.negative().has_final(&key) {
            self.commit(|state| {
                state.loading = false;
                state.is_final_error = true;
                if state.error.is_none() {
                    state.error = Some(FetchError::Suppressed);
                }
            });
            return;
        }

        // A transient failure throttles re-attempts until its record
        // expires; the subscriber keeps seeing the previous error.
        if self.service.negative().has_transient(&key) {
            self.commit(|state| {
                state.loading = false;
                // A retained error from a *final* failure must not be
                // re-displayed as temporary; show the marker instead.
                if state.error.is_none() || state.is_final_error {
                    state.error = Some(FetchError::Suppressed);
                }
                state.is_final_error = false;
            });
            return;
        }

        // A live cached value is served as-is.
        if let Some(value) = self.service.store().get(&key) {
            self.commit(|state| {
                state.data = Some(value);
                state.loading = false;
                state.error = None;
                state.is_final_error = false;
            });
            return;
        }

        self.run_fetch(resource).await;
    }

    /// Re-runs the full rule set; still suppressed by unexpired negative
    /// records.
    pub async fn refetch(&self, resource: &ResourceRequest) {
        self.activate(resource).await;
    }

    /// Unconditionally forgets both failure records and error state, then
    /// issues a fresh network call, bypassing every cache consultation.
    pub async fn force_refetch(&self, resource: &ResourceRequest) {
        let key = resource.cache_key();
        self.service.negative().clear(&key);
        self.commit(|state| {
            state.error = None;
            state.is_final_error = false;
            state.has_attempted = false;
        });
        self.run_fetch(resource).await;
    }

    /// Issues the network call and applies the outcome to the caches and
    /// the subscriber state.
    async fn run_fetch(&self, resource: &ResourceRequest) {
        // One call in flight per instance; re-entrant activations no-op.
        if self.loading.swap(true, Ordering::SeqCst) {
            return;
        }
        let key = resource.cache_key();
        self.commit(|state| {
            state.loading = true;
            state.error = None;
            state.is_final_error = false;
        });

        let result = self
            .inflight
            .fetch(&key, self.transport.clone(), resource.request.clone())
            .await;
        self.loading.store(false, Ordering::SeqCst);

        let outcome = match result {
            Ok(response) if response.is_success() => serde_json::from_str::<V>(&response.body)
                .map_err(|err| FetchError::Parse(err.to_string())),
            Ok(response) => Err(FetchError::Http {
                status: response.status,
                message: http_message(&response),
            }),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(value) => {
                self.service.negative().clear(&key);
                self.service
                    .store()
                    .set(&key, &value, resource.fresh_ttl, resource.durable_ttl);
                self.commit(move |state| {
                    state.data = Some(value);
                    state.loading = false;
                    state.error = None;
                    state.is_final_error = false;
                    state.has_attempted = true;
                });
            }
            Err(error) => {
                let classification = classify(&error);
                self.service.negative().record_failure(&key, classification);
                debug!(key = %key, error = %error, ?classification, "fetch failed");
                let is_final = classification == Classification::NonRetryable;
                self.commit(move |state| {
                    state.loading = false;
                    state.error = Some(error);
                    state.is_final_error = is_final;
                    state.has_attempted = true;
                });
            }
        }
    }

    /// Publishes a state transition unless the subscription was torn down.
    /// Cache writes never go through here, so a detached instance's
    /// completed fetch still benefits other subscribers.
    fn commit(&self, update: impl FnOnce(&mut FetchState<V>)) {
        if self.detached.load(Ordering::SeqCst) {
            return;
        }
        self.state_tx.send_modify(update);
    }
}

/// Subscriber-facing message for a non-2xx response: the trimmed body when
/// the server sent one, otherwise the bare status.
fn http_message(response: &HttpResponse) -> String {
    let trimmed = response.body.trim();
    if trimmed.is_empty() {
        format!("status {}", response.status)
    } else {
        trimmed.chars().take(200).collect()
    }
}
