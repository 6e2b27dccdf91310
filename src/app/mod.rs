//! Core application logic for Flickmeter
//!
//! This module contains the movie API client, the resource records, the
//! query cache with its orchestrator, the mutation runner and the UI state
//! machines built on top of them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use flickmeter::app::{MovieClient, MovieQueries, QueryConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queries = MovieQueries::new(MovieClient::new()?, QueryConfig::default());
//!
//! let trending = queries.trending(false).await;
//! for movie in trending.data.iter().flat_map(|movies| movies.iter()) {
//!     println!("{}", movie.display_title());
//! }
//!
//! let mut pager = queries.review_pager(42);
//! let page = pager.load(None).await;
//! println!("{} reviews, more: {}", page.reviews.len(), page.has_next);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod models;
pub mod mutation;
pub mod notice;
pub mod pagination;
pub mod queries;
pub mod query;
pub mod ui;

// Re-export main public API
pub use client::{ClientConfig, MovieClient};
pub use models::{Movie, Review, ReviewDraft, ReviewPage, User, Video};
pub use mutation::{MutationEffects, MutationKind, MutationRunner};
pub use notice::{Notice, NoticeLevel, QueryContext};
pub use pagination::{MyReviewPanel, ReviewPageView, ReviewPager};
pub use queries::MovieQueries;
pub use query::{QueryClient, QueryConfig, QueryKey, QueryOptions, QueryState, RetryPolicy};
