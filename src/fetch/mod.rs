//! Fetch orchestration
//!
//! Turns raw network calls into a resilient read-through cache: the
//! orchestrator consults the negative cache, then the positive cache, and
//! only then issues a network call, classifying any failure and memoizing
//! it. UI subscribers observe the resulting [`FetchState`] through a watch
//! channel and drive retries with `refetch` / `force_refetch`.

mod classify;
mod coalesce;
mod error;
mod orchestrator;
mod transport;

pub use classify::{classify, classify_status, Classification};
pub use coalesce::InflightRegistry;
pub use error::FetchError;
pub use orchestrator::{FetchOrchestrator, FetchState, ResourceRequest};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
