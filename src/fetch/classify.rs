//! Failure classification
//!
//! Decides whether a failed fetch may be retried on its own or requires an
//! explicit force-refresh. The classification picks which negative-cache
//! TTL a failure is memoized under.

use super::FetchError;

/// Client errors that will not change on their own. Everything else,
/// including all 5xx codes and 429, is considered retryable.
const NON_RETRYABLE_STATUSES: [u16; 7] = [400, 401, 403, 404, 405, 410, 422];

/// Whether a failure is expected to resolve without intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// May resolve on its own; memoized briefly.
    Retryable,
    /// Will not resolve without intervention; memoized long and suppressed
    /// until an explicit force-refresh.
    NonRetryable,
}

/// Classifies an HTTP status code. `None` means the call failed at the
/// transport level without producing a status, which is always retryable.
pub fn classify_status(status: Option<u16>) -> Classification {
    match status {
        Some(code) if NON_RETRYABLE_STATUSES.contains(&code) => Classification::NonRetryable,
        _ => Classification::Retryable,
    }
}

/// Classifies a fetch error. Transport and decode failures are retryable;
/// HTTP errors follow the status-code set.
pub fn classify(error: &FetchError) -> Classification {
    match error {
        FetchError::Http { status, .. } => classify_status(Some(*status)),
        FetchError::Transport(_) | FetchError::Parse(_) | FetchError::Suppressed => {
            Classification::Retryable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_non_retryable() {
        for code in [400, 401, 403, 404, 405, 410, 422] {
            assert_eq!(
                classify_status(Some(code)),
                Classification::NonRetryable,
                "status {code}"
            );
        }
    }

    #[test]
    fn test_server_errors_are_retryable() {
        for code in [500, 502, 503, 504] {
            assert_eq!(
                classify_status(Some(code)),
                Classification::Retryable,
                "status {code}"
            );
        }
    }

    #[test]
    fn test_rate_limiting_is_retryable() {
        // 429 gets only the short transient backoff.
        assert_eq!(classify_status(Some(429)), Classification::Retryable);
    }

    #[test]
    fn test_missing_status_is_retryable() {
        assert_eq!(classify_status(None), Classification::Retryable);
    }

    #[test]
    fn test_transport_and_parse_errors_are_retryable() {
        assert_eq!(
            classify(&FetchError::Transport("connection refused".to_string())),
            Classification::Retryable
        );
        assert_eq!(
            classify(&FetchError::Parse("unexpected token".to_string())),
            Classification::Retryable
        );
    }

    #[test]
    fn test_http_error_classified_by_status() {
        let not_found = FetchError::Http {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(classify(&not_found), Classification::NonRetryable);

        let unavailable = FetchError::Http {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(classify(&unavailable), Classification::Retryable);
    }
}
