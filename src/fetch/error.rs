//! Fetch error taxonomy
//!
//! Errors are cloneable so they can live in subscriber-visible state and in
//! shared in-flight futures. Persistence failures are not represented here;
//! the durable store swallows them internally.

use thiserror::Error;

/// Errors a fetch can surface to a subscriber.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The network call never produced a response (DNS, connection
    /// refused, timeout).
    #[error("network request failed: {0}")]
    Transport(String),

    /// The server responded with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    /// A 2xx response body could not be decoded as the expected shape.
    #[error("failed to decode response body: {0}")]
    Parse(String),

    /// The fetch was suppressed by a cached failure recorded by another
    /// subscription; the original error is no longer available.
    #[error("request suppressed by a previously cached failure")]
    Suppressed,
}

impl FetchError {
    /// HTTP status code, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
