//! Place discovery API client
//!
//! Typed front end over the generic fetch layer for the places API. Each
//! UI subscriber asks the client for an orchestrator bound to a resource;
//! all orchestrators built by one client share the same cache scope,
//! in-flight registry, and transport.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheService;
use crate::fetch::{
    FetchOrchestrator, HttpRequest, HttpTransport, InflightRegistry, ResourceRequest, Transport,
};

/// Warm-tier TTL for place details. Place data changes rarely; the durable
/// default (one day) is kept as-is.
const PLACE_FRESH_TTL: Duration = Duration::from_secs(10 * 60);

const DEFAULT_MAX_CACHED_PLACES: usize = 256;

/// A discoverable place as returned by the places API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Unique identifier for the place
    pub id: u64,
    /// Human-readable name of the place
    pub name: String,
    /// Country the place is located in
    pub country: String,
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
    /// Aggregate visitor rating, if the place has been rated
    pub rating: Option<f32>,
    /// Free-form discovery tags ("beach", "hiking", ...)
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Client for fetching place details with caching and failure memoization.
#[derive(Clone)]
pub struct PlacesClient {
    base_url: String,
    service: CacheService<Place>,
    inflight: InflightRegistry,
    transport: Arc<dyn Transport>,
}

impl PlacesClient {
    /// Creates a client against `base_url` using the real HTTP transport
    /// and a default cache scope (bounded memory plus the platform cache
    /// directory when available).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, HttpTransport::shared())
    }

    /// Creates a client with a custom transport. Used by tests and by
    /// callers that preconfigure their HTTP client.
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            service: CacheService::with_defaults(DEFAULT_MAX_CACHED_PLACES),
            inflight: InflightRegistry::new(),
            transport,
        }
    }

    /// Replaces the cache scope, e.g. to point the durable tier at a
    /// specific directory.
    pub fn with_service(mut self, service: CacheService<Place>) -> Self {
        self.service = service;
        self
    }

    /// The cache scope shared by this client's orchestrators.
    pub fn service(&self) -> &CacheService<Place> {
        &self.service
    }

    /// The resource describing one place's detail endpoint.
    pub fn place_request(&self, place_id: u64) -> ResourceRequest {
        let url = format!("{}/api/places/{place_id}", self.base_url);
        ResourceRequest::new(HttpRequest::get(url)).with_fresh_ttl(PLACE_FRESH_TTL)
    }

    /// Builds an orchestrator for one place's details. One per subscriber;
    /// the caches behind it are shared.
    pub fn place_detail(&self, place_id: u64) -> (FetchOrchestrator<Place>, ResourceRequest) {
        let resource = self.place_request(place_id);
        let orchestrator = FetchOrchestrator::new(
            self.service.clone(),
            self.transport.clone(),
            self.inflight.clone(),
        );
        (orchestrator, resource)
    }
}
