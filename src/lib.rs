//! PlaceScout client data layer
//!
//! The caching and fetch-orchestration layer behind the PlaceScout travel
//! discovery UI. Provides a bounded in-memory TTL cache layered over a
//! durable on-disk cache, failure memoization (negative caching), and a
//! fetch orchestrator that UI subscribers attach to for resilient
//! read-through access to the places API.

pub mod cache;
pub mod fetch;
pub mod places;
pub mod sweeper;
