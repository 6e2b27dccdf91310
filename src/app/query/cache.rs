//! Process-wide keyed query cache
//!
//! The cache maps a [`QueryKey`] to one slot holding the last settled result,
//! its freshness window, and at most one in-flight fetch. Readers that arrive
//! while a fetch is in flight attach to the same shared future instead of
//! issuing their own request.
//!
//! Every fetch is tagged with a cache-wide generation number. A settling fetch
//! is applied only if its generation is still the slot's current in-flight
//! generation; anything superseded by [`QueryCache::set_data`],
//! [`QueryCache::invalidate`] or [`QueryCache::reset_all`] is dropped.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::key::QueryKey;
use crate::errors::ErrorInfo;

/// Type-erased cached value
pub type CachedValue = Arc<dyn Any + Send + Sync>;

pub(crate) type FetchResult = Result<CachedValue, ErrorInfo>;
pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Lifecycle status of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Created but never fetched
    Idle,
    /// First fetch in flight, no data yet
    Loading,
    Success,
    Error,
}

/// Typed snapshot of one cache entry
#[derive(Debug, Clone)]
pub struct QueryEntry<T> {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<ErrorInfo>,
    pub fetched_at: Option<Instant>,
    pub stale_time: Duration,
    pub is_fetching: bool,
    pub is_invalidated: bool,
}

impl<T> QueryEntry<T> {
    /// Fresh iff settled successfully, not invalidated, and
    /// `now - fetched_at < stale_time`
    pub fn is_fresh(&self, now: Instant) -> bool {
        is_fresh(
            self.status,
            self.fetched_at,
            self.stale_time,
            self.is_invalidated,
            now,
        )
    }
}

fn is_fresh(
    status: QueryStatus,
    fetched_at: Option<Instant>,
    stale_time: Duration,
    invalidated: bool,
    now: Instant,
) -> bool {
    if invalidated || status != QueryStatus::Success {
        return false;
    }
    match fetched_at {
        Some(at) => now.saturating_duration_since(at) < stale_time,
        None => false,
    }
}

struct InFlight {
    generation: u64,
    future: SharedFetch,
}

struct Slot {
    status: QueryStatus,
    data: Option<CachedValue>,
    error: Option<ErrorInfo>,
    fetched_at: Option<Instant>,
    stale_time: Duration,
    invalidated: bool,
    in_flight: Option<InFlight>,
}

impl Slot {
    fn idle(stale_time: Duration) -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            stale_time,
            invalidated: false,
            in_flight: None,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        is_fresh(
            self.status,
            self.fetched_at,
            self.stale_time,
            self.invalidated,
            now,
        )
    }

    fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryEntry<T> {
        let data = self.data.clone().and_then(|value| match value.downcast::<T>() {
            Ok(typed) => Some(typed),
            Err(_) => {
                warn!(
                    "Cached value for {} is not a {}",
                    key,
                    std::any::type_name::<T>()
                );
                None
            }
        });

        QueryEntry {
            key: key.clone(),
            status: self.status,
            data,
            error: self.error.clone(),
            fetched_at: self.fetched_at,
            stale_time: self.stale_time,
            is_fetching: self.in_flight.is_some(),
            is_invalidated: self.invalidated,
        }
    }

    /// Drops the in-flight fetch so its eventual result is ignored
    fn supersede(&mut self) -> bool {
        let superseded = self.in_flight.take().is_some();
        if superseded && self.data.is_none() && self.status == QueryStatus::Loading {
            self.status = QueryStatus::Idle;
        }
        superseded
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Slot>,
    next_generation: u64,
}

/// Outcome of asking the cache whether a read needs a network call
pub(crate) enum Acquire {
    /// Cached data is fresh; no fetch needed
    Fresh,
    /// A fetch for this key was already in flight
    Attached(SharedFetch),
    /// A new fetch was registered
    Started(SharedFetch),
}

/// Shared, cloneable handle to the query cache
///
/// Create one per application (or per test) and pass clones to every
/// consumer; all clones see the same entries.
#[derive(Clone, Default)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache").finish_non_exhaustive()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed snapshot of the entry for `key`, if one exists
    pub async fn get<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<QueryEntry<T>> {
        let state = self.state.lock().await;
        state.entries.get(key).map(|slot| slot.snapshot(key))
    }

    /// Stores `data` as a fresh successful result for `key`
    ///
    /// Any fetch in flight for the key is superseded.
    pub async fn set_data<T: Send + Sync + 'static>(&self, key: QueryKey, data: T) {
        let mut state = self.state.lock().await;
        let slot = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| Slot::idle(Duration::ZERO));

        if slot.supersede() {
            debug!("Superseded in-flight fetch for {} with direct set", key);
        }
        slot.status = QueryStatus::Success;
        slot.data = Some(Arc::new(data));
        slot.error = None;
        slot.fetched_at = Some(Instant::now());
        slot.invalidated = false;
    }

    /// Marks every entry whose key starts with `prefix` as stale
    ///
    /// Data is kept so it can still be shown while the refetch runs. Fetches
    /// in flight for matching keys are superseded. Returns the number of
    /// entries marked.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut state = self.state.lock().await;
        let mut marked = 0;

        for (key, slot) in state.entries.iter_mut() {
            if key.starts_with(prefix) {
                slot.invalidated = true;
                if slot.supersede() {
                    debug!("Superseded in-flight fetch for {}", key);
                }
                marked += 1;
            }
        }

        debug!("Invalidated {} entries under {}", marked, prefix);
        marked
    }

    /// Removes every entry; in-flight fetches settle into nothing
    pub async fn reset_all(&self) {
        let mut state = self.state.lock().await;
        let cleared = state.entries.len();
        state.entries.clear();
        info!("Query cache reset ({} entries cleared)", cleared);
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    /// Keys currently present, in key order
    pub async fn keys(&self) -> Vec<QueryKey> {
        let state = self.state.lock().await;
        let mut keys: Vec<QueryKey> = state.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Creates an idle entry for `key` if none exists
    pub(crate) async fn ensure(&self, key: &QueryKey, stale_time: Duration) {
        let mut state = self.state.lock().await;
        state
            .entries
            .entry(key.clone())
            .or_insert_with(|| Slot::idle(stale_time));
    }

    /// Decides, atomically, whether `key` needs a fetch
    ///
    /// `start` builds the fetch future for the given generation; it is called
    /// only when a new fetch is registered and must not touch the cache.
    pub(crate) async fn acquire(
        &self,
        key: &QueryKey,
        stale_time: Duration,
        force: bool,
        start: impl FnOnce(u64) -> SharedFetch,
    ) -> Acquire {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Instant::now();

        let slot = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| Slot::idle(stale_time));
        slot.stale_time = stale_time;

        if let Some(in_flight) = &slot.in_flight {
            debug!("Attaching to in-flight fetch for {}", key);
            return Acquire::Attached(in_flight.future.clone());
        }

        if !force && slot.is_fresh(now) {
            debug!("Cache hit for {}", key);
            return Acquire::Fresh;
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let future = start(generation);

        slot.in_flight = Some(InFlight {
            generation,
            future: future.clone(),
        });
        if slot.data.is_none() {
            slot.status = QueryStatus::Loading;
        }

        debug!("Fetching {} (generation {})", key, generation);
        Acquire::Started(future)
    }

    /// The fetch currently in flight for `key`, if any
    pub(crate) async fn in_flight(&self, key: &QueryKey) -> Option<SharedFetch> {
        let state = self.state.lock().await;
        state
            .entries
            .get(key)
            .and_then(|slot| slot.in_flight.as_ref())
            .map(|in_flight| in_flight.future.clone())
    }

    /// Applies a settled fetch if it is still the current one for `key`
    pub(crate) async fn settle(
        &self,
        key: &QueryKey,
        generation: u64,
        result: &FetchResult,
        keep_previous_data: bool,
    ) -> bool {
        let mut state = self.state.lock().await;

        let Some(slot) = state.entries.get_mut(key) else {
            debug!("Dropping response for {}: entry was reset", key);
            return false;
        };

        match &slot.in_flight {
            Some(in_flight) if in_flight.generation == generation => {}
            _ => {
                debug!(
                    "Dropping superseded response for {} (generation {})",
                    key, generation
                );
                return false;
            }
        }

        slot.in_flight = None;
        match result {
            Ok(value) => {
                slot.status = QueryStatus::Success;
                slot.data = Some(Arc::clone(value));
                slot.error = None;
                slot.fetched_at = Some(Instant::now());
                slot.invalidated = false;
            }
            Err(error) => {
                slot.status = QueryStatus::Error;
                slot.error = Some(error.clone());
                if !keep_previous_data {
                    slot.data = None;
                }
            }
        }
        true
    }
}
