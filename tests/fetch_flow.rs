//! End-to-end tests for the fetch orchestration flow
//!
//! Drives the public API with a scripted transport: negative caching for
//! final and transient failures, force-refresh semantics, cross-instance
//! request coalescing, and read-through from the durable tier after a
//! simulated reload.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use placescout::cache::{CacheService, DurableStore, HybridStore, NegativeCache, NegativeCacheConfig};
use placescout::fetch::{FetchError, HttpRequest, HttpResponse, Transport};
use placescout::places::{Place, PlacesClient};

/// Transport that plays back scripted responses and counts served calls.
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<HttpResponse, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        })
    }

    fn with_delay(
        responses: Vec<Result<HttpResponse, FetchError>>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transport("no scripted response".to_string())))
    }
}

fn place_json(id: u64, name: &str) -> String {
    format!(
        r#"{{"id":{id},"name":"{name}","country":"Canada","latitude":49.28,"longitude":-123.12,"rating":4.5,"tags":["beach"]}}"#
    )
}

fn ok(status: u16, body: String) -> Result<HttpResponse, FetchError> {
    Ok(HttpResponse { status, body })
}

/// A client whose cache scope lives purely in memory, with a configurable
/// transient-failure window.
fn memory_client(transport: Arc<ScriptedTransport>, transient_ttl: Duration) -> PlacesClient {
    let service = CacheService::new(
        HybridStore::new(16, None),
        NegativeCache::new(NegativeCacheConfig {
            final_ttl: Duration::from_secs(3600),
            transient_ttl,
        }),
    );
    PlacesClient::with_transport("https://api.placescout.io", transport).with_service(service)
}

#[tokio::test]
async fn missing_place_is_cached_as_final_until_forced() {
    let transport = ScriptedTransport::new(vec![
        ok(404, "place not found".to_string()),
        ok(200, place_json(999, "Wreck Beach")),
    ]);
    let client = memory_client(transport.clone(), Duration::from_secs(30));
    let (orch, resource) = client.place_detail(999);

    orch.activate(&resource).await;
    let state = orch.state();
    assert!(state.is_final_error);
    assert_eq!(state.error.as_ref().and_then(FetchError::status), Some(404));

    // Re-activating with the identical key performs zero fetches.
    orch.activate(&resource).await;
    orch.refetch(&resource).await;
    assert_eq!(transport.calls(), 1);

    // force_refetch clears both negative records and performs exactly one.
    orch.force_refetch(&resource).await;
    assert_eq!(transport.calls(), 2);

    let state = orch.state();
    assert!(state.error.is_none());
    assert!(!state.is_final_error);
    assert_eq!(state.data.as_ref().map(|p| p.name.as_str()), Some("Wreck Beach"));
}

#[tokio::test]
async fn server_error_throttles_until_transient_window_elapses() {
    let transport = ScriptedTransport::new(vec![
        ok(500, "internal error".to_string()),
        ok(200, place_json(42, "Lighthouse Park")),
    ]);
    let client = memory_client(transport.clone(), Duration::from_millis(50));
    let (orch, resource) = client.place_detail(42);

    orch.activate(&resource).await;
    assert!(orch.state().is_temporary_error());

    // Inside the window: suppressed without a network call.
    orch.activate(&resource).await;
    assert_eq!(transport.calls(), 1);

    // After the window: exactly one new call; success clears everything.
    tokio::time::sleep(Duration::from_millis(70)).await;
    orch.activate(&resource).await;
    assert_eq!(transport.calls(), 2);

    let state = orch.state();
    assert!(state.error.is_none());
    assert!(!state.is_final_error);
    assert_eq!(state.data.as_ref().map(|p| p.id), Some(42));

    let key = resource.cache_key();
    assert!(!client.service().negative().has_transient(&key));
    assert!(!client.service().negative().has_final(&key));
}

#[tokio::test]
async fn concurrent_subscribers_share_one_network_call() {
    let transport = ScriptedTransport::with_delay(
        vec![ok(200, place_json(7, "Kitsilano"))],
        Duration::from_millis(30),
    );
    let client = memory_client(transport.clone(), Duration::from_secs(30));

    let (first, resource_a) = client.place_detail(7);
    let (second, resource_b) = client.place_detail(7);

    tokio::join!(first.activate(&resource_a), second.activate(&resource_b));

    assert_eq!(transport.calls(), 1, "requests for one key must coalesce");
    assert_eq!(first.state().data.as_ref().map(|p| p.id), Some(7));
    assert_eq!(second.state().data.as_ref().map(|p| p.id), Some(7));
}

#[tokio::test]
async fn durable_tier_serves_after_simulated_reload() {
    let temp_dir = TempDir::new().unwrap();
    let durable_dir = temp_dir.path().to_path_buf();

    let transport = ScriptedTransport::new(vec![ok(200, place_json(7, "Kitsilano"))]);
    let service = CacheService::new(
        HybridStore::new(16, Some(DurableStore::with_dir(durable_dir.clone()))),
        NegativeCache::default(),
    );
    let client = PlacesClient::with_transport("https://api.placescout.io", transport.clone())
        .with_service(service);

    let (orch, resource) = client.place_detail(7);
    orch.activate(&resource).await;
    assert_eq!(transport.calls(), 1);

    // Reload: fresh memory tier, same durable directory, transport that
    // would fail if consulted.
    let offline = ScriptedTransport::new(vec![]);
    let reloaded_service = CacheService::new(
        HybridStore::new(16, Some(DurableStore::with_dir(durable_dir))),
        NegativeCache::default(),
    );
    let reloaded = PlacesClient::with_transport("https://api.placescout.io", offline.clone())
        .with_service(reloaded_service);

    let (orch, resource) = reloaded.place_detail(7);
    orch.activate(&resource).await;

    assert_eq!(offline.calls(), 0, "durable hit must not reach the network");
    let state = orch.state();
    assert_eq!(state.data.as_ref().map(|p| p.name.as_str()), Some("Kitsilano"));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn negative_records_are_shared_across_subscribers() {
    let transport = ScriptedTransport::new(vec![ok(410, "gone".to_string())]);
    let client = memory_client(transport.clone(), Duration::from_secs(30));

    let (first, resource) = client.place_detail(13);
    first.activate(&resource).await;
    assert!(first.state().is_final_error);

    // A second, independent subscriber is suppressed by the shared record.
    let (second, resource) = client.place_detail(13);
    second.activate(&resource).await;

    assert_eq!(transport.calls(), 1);
    let state = second.state();
    assert!(state.is_final_error);
    assert_eq!(state.error, Some(FetchError::Suppressed));
}

#[tokio::test]
async fn success_after_failure_clears_shared_failure_memory() {
    let transport = ScriptedTransport::new(vec![
        ok(404, "not found".to_string()),
        ok(200, place_json(5, "Deep Cove")),
    ]);
    let client = memory_client(transport.clone(), Duration::from_secs(30));

    let (orch, resource) = client.place_detail(5);
    orch.activate(&resource).await;
    orch.force_refetch(&resource).await;

    // A fresh subscriber now sees the cached value, not the old failure.
    let (second, resource) = client.place_detail(5);
    second.activate(&resource).await;

    assert_eq!(transport.calls(), 2);
    let state = second.state();
    assert!(state.error.is_none());
    assert_eq!(state.data.as_ref().map(|p| p.name.as_str()), Some("Deep Cove"));
}

#[tokio::test]
async fn failure_records_are_scoped_per_place() {
    let transport = ScriptedTransport::new(vec![
        ok(404, "not found".to_string()),
        ok(200, place_json(2, "Jericho Beach")),
    ]);
    let client = memory_client(transport.clone(), Duration::from_secs(30));

    let (first, missing) = client.place_detail(1);
    first.activate(&missing).await;
    assert!(first.state().is_final_error);

    // A different place is unaffected by place 1's failure record.
    let (second, present) = client.place_detail(2);
    second.activate(&present).await;

    assert_eq!(transport.calls(), 2);
    assert!(second.state().error.is_none());
    assert_eq!(second.state().data.as_ref().map(|p| p.id), Some(2));
}
