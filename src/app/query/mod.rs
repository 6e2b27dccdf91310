//! Client-side query cache and fetch orchestration
//!
//! # Module Organization
//!
//! - [`key`] - query keys and the key namespace
//! - [`cache`] - the shared keyed cache with in-flight dedup
//! - [`retry`] - retry policies and backoff
//! - [`orchestrator`] - [`QueryClient`], which decides when to fetch
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flickmeter::app::query::{keys, QueryClient, QueryOptions};
//! use flickmeter::app::MovieClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(MovieClient::new()?);
//! let queries = QueryClient::default();
//!
//! let movie = queries
//!     .query(
//!         keys::movie(42),
//!         move || {
//!             let api = api.clone();
//!             async move { api.fetch_movie(42).await }
//!         },
//!         QueryOptions::default(),
//!     )
//!     .await;
//!
//! if let Some(movie) = movie.data {
//!     println!("{}", movie.display_title());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod key;
pub mod orchestrator;
pub mod retry;

pub use cache::{CachedValue, QueryCache, QueryEntry, QueryStatus};
pub use key::{keys, KeySegment, QueryKey};
pub use orchestrator::{QueryClient, QueryConfig, QueryOptions, QueryState};
pub use retry::{default_retry, RetryBackoff, RetryPolicy};
