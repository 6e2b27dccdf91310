//! Retry policies and backoff for query fetches
//!
//! A policy is a pure function of `(failure_count, error)`. It never looks at
//! elapsed time or at the error message. `failure_count` is the number of
//! retries already performed, so it is 0 when the first attempt fails.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::query;
use crate::errors::ErrorInfo;

type RetryFn = dyn Fn(u32, &ErrorInfo) -> bool + Send + Sync;

/// Decides whether a failed fetch is tried again
#[derive(Clone)]
pub enum RetryPolicy {
    /// Never retry
    Never,
    /// Retry up to `n` times regardless of the error
    Limit(u32),
    /// Retry up to `max_retries` times unless the failure is a 401
    UnlessUnauthenticated { max_retries: u32 },
    /// Retry up to `max_retries` times, only for 5xx and transport failures
    TransientOnly { max_retries: u32 },
    /// Caller-supplied decision
    Custom(Arc<RetryFn>),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::UnlessUnauthenticated {
            max_retries: query::MAX_RETRIES,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::Never => f.write_str("Never"),
            RetryPolicy::Limit(n) => f.debug_tuple("Limit").field(n).finish(),
            RetryPolicy::UnlessUnauthenticated { max_retries } => f
                .debug_struct("UnlessUnauthenticated")
                .field("max_retries", max_retries)
                .finish(),
            RetryPolicy::TransientOnly { max_retries } => f
                .debug_struct("TransientOnly")
                .field("max_retries", max_retries)
                .finish(),
            RetryPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl RetryPolicy {
    pub fn custom(decide: impl Fn(u32, &ErrorInfo) -> bool + Send + Sync + 'static) -> Self {
        RetryPolicy::Custom(Arc::new(decide))
    }

    /// Opt-in variant that also treats every other 4xx as terminal
    pub fn never_client_errors() -> Self {
        RetryPolicy::TransientOnly {
            max_retries: query::MAX_RETRIES,
        }
    }

    pub fn should_retry(&self, failure_count: u32, error: &ErrorInfo) -> bool {
        match self {
            RetryPolicy::Never => false,
            RetryPolicy::Limit(n) => failure_count < *n,
            RetryPolicy::UnlessUnauthenticated { max_retries } => {
                !error.is_unauthenticated() && failure_count < *max_retries
            }
            RetryPolicy::TransientOnly { max_retries } => {
                !matches!(error.cause, Some(code) if (400..500).contains(&code))
                    && failure_count < *max_retries
            }
            RetryPolicy::Custom(decide) => decide(failure_count, error),
        }
    }
}

/// The default decision: up to 3 retries, none for a 401
pub fn default_retry(failure_count: u32, error: &ErrorInfo) -> bool {
    RetryPolicy::default().should_retry(failure_count, error)
}

/// Exponential delay between retries, capped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBackoff {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            base_delay: query::RETRY_BASE_DELAY,
            max_delay: query::MAX_RETRY_DELAY,
        }
    }
}

impl RetryBackoff {
    /// No waiting between attempts
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `failure_count + 1`
    pub fn delay(&self, failure_count: u32) -> Duration {
        let factor = 2_u32.saturating_pow(failure_count);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_never_retried() {
        let error = ErrorInfo::with_cause("Unauthorized", 401);
        for n in 0..10 {
            assert!(!default_retry(n, &error), "retried 401 at attempt {n}");
        }
    }

    #[test]
    fn test_server_error_retried_three_times() {
        let error = ErrorInfo::with_cause("Internal Server Error", 500);
        assert!(default_retry(0, &error));
        assert!(default_retry(1, &error));
        assert!(default_retry(2, &error));
        assert!(!default_retry(3, &error));
        assert!(!default_retry(4, &error));
    }

    #[test]
    fn test_other_client_errors_retried_by_default() {
        let error = ErrorInfo::with_cause("Invalid page", 400);
        assert!(default_retry(0, &error));
        assert!(!RetryPolicy::never_client_errors().should_retry(0, &error));
        assert!(RetryPolicy::never_client_errors()
            .should_retry(0, &ErrorInfo::with_cause("Bad Gateway", 502)));
    }

    #[test]
    fn test_message_text_is_ignored() {
        let a = ErrorInfo::with_cause("Unauthorized", 500);
        let b = ErrorInfo::with_cause("anything", 401);
        assert!(default_retry(0, &a));
        assert!(!default_retry(0, &b));
    }

    #[test]
    fn test_limit_and_never() {
        let error = ErrorInfo::with_cause("Unauthorized", 401);
        assert!(RetryPolicy::Limit(2).should_retry(1, &error));
        assert!(!RetryPolicy::Limit(2).should_retry(2, &error));
        assert!(!RetryPolicy::Never.should_retry(0, &error));
    }

    #[test]
    fn test_custom_policy() {
        let policy = RetryPolicy::custom(|n, e| e.cause == Some(503) && n < 1);
        assert!(policy.should_retry(0, &ErrorInfo::with_cause("x", 503)));
        assert!(!policy.should_retry(1, &ErrorInfo::with_cause("x", 503)));
        assert!(!policy.should_retry(0, &ErrorInfo::with_cause("x", 500)));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let backoff = RetryBackoff::default();
        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(10), Duration::from_secs(30));
        assert_eq!(backoff.delay(40), Duration::from_secs(30));
        assert_eq!(RetryBackoff::immediate().delay(3), Duration::ZERO);
    }
}
