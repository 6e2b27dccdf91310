//! Query orchestration: when to fetch, when to serve from cache
//!
//! [`QueryClient`] binds a key, a fetch function and [`QueryOptions`] and
//! drives the fetch lifecycle against the shared [`QueryCache`]:
//!
//! - disabled queries never fetch; they only observe the cache
//! - fresh entries are served without a network call
//! - absent or stale entries are fetched, retried per [`RetryPolicy`]
//! - concurrent reads of one key share a single in-flight fetch

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::cache::{Acquire, CachedValue, FetchResult, QueryCache, QueryEntry, QueryStatus};
use super::key::QueryKey;
use super::retry::{RetryBackoff, RetryPolicy};
use crate::constants::query;
use crate::errors::ErrorInfo;

/// Client-wide defaults applied to every query
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Freshness window when a query does not set its own
    pub default_stale_time: Duration,
    /// Retry policy when a query does not set its own
    pub retry: RetryPolicy,
    /// Delay schedule between retries
    pub backoff: RetryBackoff,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_stale_time: query::DEFAULT_STALE_TIME,
            retry: RetryPolicy::default(),
            backoff: RetryBackoff::default(),
        }
    }
}

/// Per-query options
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// When false the query never fetches on its own
    pub enabled: bool,
    pub stale_time: Option<Duration>,
    pub retry: Option<RetryPolicy>,
    /// Keep the last good data when a refetch fails
    pub keep_previous_data: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: None,
            retry: None,
            keep_previous_data: false,
        }
    }
}

impl QueryOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn keep_previous_data(mut self, keep: bool) -> Self {
        self.keep_previous_data = keep;
        self
    }
}

/// What a view renders from
#[derive(Debug)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<ErrorInfo>,
    /// A fetch for this key is in flight
    pub is_fetching: bool,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
        }
    }
}

impl<T> QueryState<T> {
    fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
        }
    }

    /// No data available yet and no error either
    pub fn is_pending(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    /// Pending with the first fetch in flight; a background refetch of
    /// cached data is not "loading"
    pub fn is_loading(&self) -> bool {
        self.is_pending() && self.is_fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

impl<T: Send + Sync + 'static> QueryState<T> {
    fn from_result(result: FetchResult) -> Self {
        match result {
            Ok(value) => Self {
                status: QueryStatus::Success,
                data: value.downcast::<T>().ok(),
                error: None,
                is_fetching: false,
            },
            Err(error) => Self {
                status: QueryStatus::Error,
                data: None,
                error: Some(error),
                is_fetching: false,
            },
        }
    }
}

impl<T> From<QueryEntry<T>> for QueryState<T> {
    fn from(entry: QueryEntry<T>) -> Self {
        Self {
            status: entry.status,
            data: entry.data,
            error: entry.error,
            is_fetching: entry.is_fetching,
        }
    }
}

/// Drives fetches against a shared [`QueryCache`]
#[derive(Debug, Clone)]
pub struct QueryClient {
    cache: QueryCache,
    config: QueryConfig,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl QueryClient {
    /// Creates a client with a fresh cache
    pub fn new(config: QueryConfig) -> Self {
        Self::with_cache(QueryCache::new(), config)
    }

    /// Creates a client over an existing cache
    pub fn with_cache(cache: QueryCache, config: QueryConfig) -> Self {
        Self { cache, config }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Reads `key`, fetching with `fetch_fn` when absent or stale
    ///
    /// Returns the settled state. A disabled query returns whatever the
    /// cache holds without fetching.
    pub async fn query<T, F, Fut, E>(
        &self,
        key: QueryKey,
        fetch_fn: F,
        options: QueryOptions,
    ) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<ErrorInfo> + Send + 'static,
    {
        if !options.enabled {
            let stale_time = self.stale_time(&options);
            self.cache.ensure(&key, stale_time).await;
            debug!("Query {} is disabled; observing only", key);
            return self.observe(&key).await;
        }

        let outcome = self.run(&key, fetch_fn, &options, false).await;
        self.settled_state(&key, outcome).await
    }

    /// Fetches `key` even if the cached entry is fresh
    pub async fn refetch<T, F, Fut, E>(
        &self,
        key: QueryKey,
        fetch_fn: F,
        options: QueryOptions,
    ) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<ErrorInfo> + Send + 'static,
    {
        let outcome = self.run(&key, fetch_fn, &options, true).await;
        self.settled_state(&key, outcome).await
    }

    /// Warms the cache for `key` without binding it to a view
    ///
    /// Respects freshness and dedup exactly like [`query`](Self::query);
    /// failures are logged and left in the cache.
    pub async fn prefetch<T, F, Fut, E>(&self, key: QueryKey, fetch_fn: F, options: QueryOptions)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<ErrorInfo> + Send + 'static,
    {
        debug!("Prefetching {}", key);
        if let Some(Err(error)) = self.run(&key, fetch_fn, &options, false).await {
            debug!("Prefetch of {} failed: {}", key, error);
        }
    }

    /// Runs [`prefetch`](Self::prefetch) on a spawned task
    pub fn prefetch_in_background<T, F, Fut, E>(
        &self,
        key: QueryKey,
        fetch_fn: F,
        options: QueryOptions,
    ) -> JoinHandle<()>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<ErrorInfo> + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move { client.prefetch(key, fetch_fn, options).await })
    }

    /// Current cache state for `key`, without fetching
    pub async fn observe<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        match self.cache.get::<T>(key).await {
            Some(entry) => entry.into(),
            None => QueryState::idle(),
        }
    }

    pub async fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.cache.get::<T>(key).await.and_then(|entry| entry.data)
    }

    pub async fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, data: T) {
        self.cache.set_data(key, data).await;
    }

    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        self.cache.invalidate(prefix).await
    }

    pub async fn reset_all(&self) {
        self.cache.reset_all().await;
    }

    fn stale_time(&self, options: &QueryOptions) -> Duration {
        options
            .stale_time
            .unwrap_or(self.config.default_stale_time)
    }

    /// Fetches or attaches; `None` when the cache was fresh
    async fn run<T, F, Fut, E>(
        &self,
        key: &QueryKey,
        fetch_fn: F,
        options: &QueryOptions,
        force: bool,
    ) -> Option<FetchResult>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<ErrorInfo> + Send + 'static,
    {
        let stale_time = self.stale_time(options);
        let retry = options
            .retry
            .clone()
            .unwrap_or_else(|| self.config.retry.clone());
        let backoff = self.config.backoff;
        let keep_previous_data = options.keep_previous_data;
        let cache = self.cache.clone();
        let fetch_key = key.clone();

        let acquired = self
            .cache
            .acquire(key, stale_time, force, move |generation| {
                async move {
                    let result = fetch_with_retry(&fetch_fn, &retry, backoff, &fetch_key)
                        .await
                        .map(|value| Arc::new(value) as CachedValue);
                    cache
                        .settle(&fetch_key, generation, &result, keep_previous_data)
                        .await;
                    result
                }
                .boxed()
                .shared()
            })
            .await;

        let mut pending = match acquired {
            Acquire::Fresh => return None,
            Acquire::Attached(future) | Acquire::Started(future) => future,
        };

        // Last request wins: if ours was superseded by a newer fetch, wait
        // for that one instead.
        loop {
            let result = pending.await;
            match self.cache.in_flight(key).await {
                Some(newer) => {
                    debug!("Following newer fetch for {}", key);
                    pending = newer;
                }
                None => return Some(result),
            }
        }
    }

    async fn settled_state<T: Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        outcome: Option<FetchResult>,
    ) -> QueryState<T> {
        let state = self.observe::<T>(key).await;
        match outcome {
            // The entry was reset while the fetch was in flight.
            Some(result) if state.status == QueryStatus::Idle => QueryState::from_result(result),
            _ => state,
        }
    }
}

async fn fetch_with_retry<T, F, Fut, E>(
    fetch_fn: &F,
    retry: &RetryPolicy,
    backoff: RetryBackoff,
    key: &QueryKey,
) -> Result<T, ErrorInfo>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<ErrorInfo>,
{
    let mut failure_count = 0;
    loop {
        match fetch_fn().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let error: ErrorInfo = error.into();
                if !retry.should_retry(failure_count, &error) {
                    if failure_count > 0 {
                        warn!(
                            "Fetch for {} failed after {} retries: {}",
                            key, failure_count, error
                        );
                    } else {
                        debug!("Fetch for {} failed: {}", key, error);
                    }
                    return Err(error);
                }

                let delay = backoff.delay(failure_count);
                warn!(
                    "Fetch for {} failed (retry {}): {}. Retrying in {}ms",
                    key,
                    failure_count + 1,
                    error,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                failure_count += 1;
            }
        }
    }
}
