use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use http::{Method, StatusCode};

use crate::config::method_key;
use crate::error::HttpClientError;

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(10);

/// Retry configuration: a global attempt budget with optional per-method
/// overrides, a fixed inter-attempt wait, and the set of status codes
/// that are allowed to trigger a retry.
///
/// No status code retries unless listed: transient statuses are opt-in.
/// Transport-wise, only timeouts retry; cancellation and deadline
/// expiry are always terminal.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: usize,
    retry_wait: Duration,
    retryable_status_codes: BTreeSet<u16>,
    method_attempt_overrides: BTreeMap<String, usize>,
}

impl RetryPolicy {
    pub fn standard() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_wait: DEFAULT_RETRY_WAIT,
            retryable_status_codes: BTreeSet::new(),
            method_attempt_overrides: BTreeMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            retry_wait: DEFAULT_RETRY_WAIT,
            retryable_status_codes: BTreeSet::new(),
            method_attempt_overrides: BTreeMap::new(),
        }
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn retry_wait(mut self, retry_wait: Duration) -> Self {
        self.retry_wait = retry_wait;
        self
    }

    pub fn retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Overrides the attempt budget for one method; the method name is
    /// normalized the same way ConfigStore lookups are.
    pub fn method_attempts(mut self, method: &str, attempts: usize) -> Self {
        self.method_attempt_overrides
            .insert(method_key(method), attempts.max(1));
        self
    }

    pub(crate) fn attempts_allowed(&self, method: &Method) -> usize {
        self.method_attempt_overrides
            .get(&method_key(method.as_str()))
            .copied()
            .unwrap_or(self.max_attempts)
            .max(1)
    }

    pub(crate) fn should_retry_status(&self, status: StatusCode) -> bool {
        self.retryable_status_codes.contains(&status.as_u16())
    }

    pub(crate) fn should_retry_error(&self, error: &HttpClientError) -> bool {
        matches!(error, HttpClientError::Timeout { .. })
    }

    pub(crate) fn retry_wait_value(&self) -> Duration {
        self.retry_wait
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::{Method, StatusCode};

    use super::RetryPolicy;
    use crate::error::{HttpClientError, TransportErrorKind};

    #[test]
    fn attempts_are_clamped_to_at_least_one() {
        let policy = RetryPolicy::standard().max_attempts(0);
        assert_eq!(policy.attempts_allowed(&Method::GET), 1);
    }

    #[test]
    fn method_override_wins_over_the_global_budget() {
        let policy = RetryPolicy::standard()
            .max_attempts(1)
            .method_attempts("get", 5);

        assert_eq!(policy.attempts_allowed(&Method::GET), 5);
        assert_eq!(policy.attempts_allowed(&Method::POST), 1);
    }

    #[test]
    fn no_status_retries_without_explicit_configuration() {
        let policy = RetryPolicy::standard();
        assert!(!policy.should_retry_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!policy.should_retry_status(StatusCode::TOO_MANY_REQUESTS));

        let policy = policy.retryable_status_codes([503]);
        assert!(policy.should_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!policy.should_retry_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn only_timeouts_are_retryable_transport_errors() {
        let policy = RetryPolicy::standard();
        let method = Method::GET;
        let uri = "http://api.example.com/v1/items".to_owned();

        assert!(policy.should_retry_error(&HttpClientError::Timeout {
            timeout_ms: 100,
            method: method.clone(),
            uri: uri.clone(),
        }));
        assert!(!policy.should_retry_error(&HttpClientError::Cancelled {
            method: method.clone(),
            uri: uri.clone(),
        }));
        assert!(!policy.should_retry_error(&HttpClientError::DeadlineExceeded {
            method: method.clone(),
            uri: uri.clone(),
        }));
        assert!(!policy.should_retry_error(&HttpClientError::Transport {
            kind: TransportErrorKind::Connect,
            method,
            uri,
            source: "connection refused".into(),
        }));
    }

    #[test]
    fn retry_wait_defaults_to_ten_seconds() {
        assert_eq!(
            RetryPolicy::standard().retry_wait_value(),
            Duration::from_secs(10)
        );
    }
}
