//! Mutation runner: writes and the cache effects they declare
//!
//! A mutation is an imperative write. On success its declared
//! [`MutationEffects`] are applied to the query cache so the next read sees
//! fresh data; on failure the cache is left untouched and the caller gets a
//! [`MutationError`] it can show as a notice.

use std::fmt;
use std::future::Future;

use tracing::{info, warn};

use crate::app::query::{keys, QueryClient, QueryKey, RetryBackoff, RetryPolicy};
use crate::constants::query;
use crate::errors::{ErrorInfo, MutationError, MutationResult};

/// The writes this client performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    SaveReview,
    DeleteReview,
    Logout,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::SaveReview => "save review",
            MutationKind::DeleteReview => "delete review",
            MutationKind::Logout => "logout",
        })
    }
}

impl MutationKind {
    /// Retries allowed for this write
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            MutationKind::Logout => RetryPolicy::Limit(query::LOGOUT_RETRIES),
            MutationKind::SaveReview | MutationKind::DeleteReview => RetryPolicy::Never,
        }
    }
}

/// Cache changes applied after a successful mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationEffects {
    /// Key prefixes to mark stale
    pub invalidate: Vec<QueryKey>,
    /// Clear the whole cache
    pub reset_all: bool,
}

impl MutationEffects {
    /// Effects of saving or deleting a review for `movie_id`
    pub fn review_changed(movie_id: i64) -> Self {
        Self {
            invalidate: vec![keys::movie(movie_id), keys::my_review(movie_id)],
            reset_all: false,
        }
    }

    /// Effects of ending the session: nothing user-scoped may survive
    pub fn session_ended() -> Self {
        Self {
            invalidate: Vec::new(),
            reset_all: true,
        }
    }
}

/// Executes writes and applies their cache effects
#[derive(Debug, Clone)]
pub struct MutationRunner {
    queries: QueryClient,
    backoff: RetryBackoff,
}

impl MutationRunner {
    pub fn new(queries: QueryClient) -> Self {
        let backoff = queries.config().backoff;
        Self { queries, backoff }
    }

    /// Runs `mutate`, retrying per `kind`, then applies `effects` on success
    pub async fn run<T, F, Fut, E>(
        &self,
        kind: MutationKind,
        mutate: F,
        effects: MutationEffects,
    ) -> MutationResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<ErrorInfo>,
    {
        let retry = kind.retry_policy();
        let mut failure_count = 0;

        let value = loop {
            match mutate().await {
                Ok(value) => break value,
                Err(error) => {
                    let error: ErrorInfo = error.into();
                    if !retry.should_retry(failure_count, &error) {
                        warn!("Mutation '{}' failed: {}", kind, error);
                        return Err(MutationError::Failed { kind, error });
                    }
                    let delay = self.backoff.delay(failure_count);
                    warn!(
                        "Mutation '{}' failed (retry {}): {}. Retrying in {}ms",
                        kind,
                        failure_count + 1,
                        error,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    failure_count += 1;
                }
            }
        };

        self.apply(&effects).await;
        info!("Mutation '{}' succeeded", kind);
        Ok(value)
    }

    async fn apply(&self, effects: &MutationEffects) {
        if effects.reset_all {
            self.queries.reset_all().await;
            return;
        }
        for prefix in &effects.invalidate {
            self.queries.invalidate(prefix).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::{QueryConfig, QueryStatus};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn runner() -> (QueryClient, MutationRunner) {
        let queries = QueryClient::new(QueryConfig {
            backoff: RetryBackoff::immediate(),
            ..Default::default()
        });
        (queries.clone(), MutationRunner::new(queries))
    }

    #[test]
    fn test_review_effects_target_movie_and_my_review() {
        let effects = MutationEffects::review_changed(42);
        assert_eq!(
            effects.invalidate,
            vec![keys::movie(42), keys::my_review(42)]
        );
        assert!(!effects.reset_all);
    }

    #[tokio::test]
    async fn test_success_invalidates_declared_keys() {
        let (queries, runner) = runner();
        queries.set_query_data(keys::movie(42), 1_u32).await;
        queries.set_query_data(keys::my_review(42), 2_u32).await;
        queries.set_query_data(keys::movie(7), 3_u32).await;

        runner
            .run(
                MutationKind::SaveReview,
                || async { Ok::<(), ErrorInfo>(()) },
                MutationEffects::review_changed(42),
            )
            .await
            .unwrap();

        let cache = queries.cache();
        assert!(cache.get::<u32>(&keys::movie(42)).await.unwrap().is_invalidated);
        assert!(cache.get::<u32>(&keys::my_review(42)).await.unwrap().is_invalidated);
        assert!(!cache.get::<u32>(&keys::movie(7)).await.unwrap().is_invalidated);
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let (queries, runner) = runner();
        queries.set_query_data(keys::my_review(42), 2_u32).await;

        let result = runner
            .run(
                MutationKind::DeleteReview,
                || async { Err::<(), ErrorInfo>(ErrorInfo::with_cause("Internal", 500)) },
                MutationEffects::review_changed(42),
            )
            .await;

        match result {
            Err(MutationError::Failed { kind, error }) => {
                assert_eq!(kind, MutationKind::DeleteReview);
                assert_eq!(error.cause, Some(500));
            }
            other => panic!("expected failure, got {:?}", other),
        }

        let entry = queries.cache().get::<u32>(&keys::my_review(42)).await.unwrap();
        assert!(!entry.is_invalidated);
        assert_eq!(entry.status, QueryStatus::Success);
    }

    #[tokio::test]
    async fn test_logout_retries_twice_then_resets() {
        let (queries, runner) = runner();
        queries.set_query_data(keys::current_user(), 1_u32).await;
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        runner
            .run(
                MutationKind::Logout,
                move || {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt < 2 {
                            Err(ErrorInfo::with_cause("Internal", 500))
                        } else {
                            Ok(())
                        }
                    }
                },
                MutationEffects::session_ended(),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(queries.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_write_failures_are_not_retried() {
        let (_queries, runner) = runner();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = runner
            .run(
                MutationKind::SaveReview,
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), ErrorInfo>(ErrorInfo::with_cause("Internal", 500)) }
                },
                MutationEffects::review_changed(1),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
