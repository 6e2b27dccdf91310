//! Movie API reads and writes bound to the query cache
//!
//! [`MovieQueries`] pairs each [`MovieClient`] operation with its query key
//! and options, so every caller of a resource shares one cache entry and one
//! in-flight request.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::app::client::MovieClient;
use crate::app::models::{Movie, Review, ReviewDraft, User, Video};
use crate::app::mutation::{MutationEffects, MutationKind, MutationRunner};
use crate::app::pagination::ReviewPager;
use crate::app::query::{keys, QueryClient, QueryConfig, QueryOptions, QueryState};
use crate::constants::{query, reviews};
use crate::errors::MutationResult;

/// Cached access to the movie API
#[derive(Debug, Clone)]
pub struct MovieQueries {
    queries: QueryClient,
    mutations: MutationRunner,
    api: Arc<MovieClient>,
    page_size: usize,
    reviews_stale_time: Duration,
}

impl MovieQueries {
    pub fn new(api: MovieClient, config: QueryConfig) -> Self {
        Self::with_query_client(Arc::new(api), QueryClient::new(config))
    }

    /// Shares an existing cache, e.g. with another view of the same session
    pub fn with_query_client(api: Arc<MovieClient>, queries: QueryClient) -> Self {
        Self {
            mutations: MutationRunner::new(queries.clone()),
            queries,
            api,
            page_size: reviews::PAGE_SIZE,
            reviews_stale_time: query::REVIEWS_STALE_TIME,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_reviews_stale_time(mut self, stale_time: Duration) -> Self {
        self.reviews_stale_time = stale_time;
        self
    }

    pub fn query_client(&self) -> &QueryClient {
        &self.queries
    }

    pub fn api(&self) -> &MovieClient {
        &self.api
    }

    pub async fn trending(&self, weekly: bool) -> QueryState<Vec<Movie>> {
        let api = self.api.clone();
        self.queries
            .query(
                keys::trending(weekly),
                move || {
                    let api = api.clone();
                    async move { api.fetch_trending(weekly).await }
                },
                QueryOptions::default(),
            )
            .await
    }

    /// Searches by title; a blank query stays idle
    pub async fn search(&self, text: &str) -> QueryState<Vec<Movie>> {
        let text = text.trim().to_string();
        let api = self.api.clone();
        let enabled = !text.is_empty();
        self.queries
            .query(
                keys::search(&text),
                move || {
                    let api = api.clone();
                    let text = text.clone();
                    async move { api.search_movies(&text).await }
                },
                QueryOptions::default().enabled(enabled),
            )
            .await
    }

    pub async fn movie(&self, movie_id: i64) -> QueryState<Movie> {
        let api = self.api.clone();
        self.queries
            .query(
                keys::movie(movie_id),
                move || {
                    let api = api.clone();
                    async move { api.fetch_movie(movie_id).await }
                },
                QueryOptions::default(),
            )
            .await
    }

    pub async fn videos(&self, movie_id: i64) -> QueryState<Vec<Video>> {
        let api = self.api.clone();
        self.queries
            .query(
                keys::movie_videos(movie_id),
                move || {
                    let api = api.clone();
                    async move { api.fetch_videos(movie_id).await }
                },
                QueryOptions::default(),
            )
            .await
    }

    /// The viewer's review of `movie_id`; `Some(None)` data means none yet
    pub async fn my_review(&self, movie_id: i64) -> QueryState<Option<Review>> {
        let api = self.api.clone();
        self.queries
            .query(
                keys::my_review(movie_id),
                move || {
                    let api = api.clone();
                    async move { api.fetch_my_review(movie_id).await }
                },
                QueryOptions::default(),
            )
            .await
    }

    /// Id of the viewer's review of `movie_id`, for hiding it from lists
    ///
    /// Without a session there is no viewer, so nothing is fetched. A failed
    /// lookup hides nothing.
    pub async fn own_review_id(&self, movie_id: i64) -> Option<i64> {
        if !self.api.has_session() {
            return None;
        }
        let state = self.my_review(movie_id).await;
        if let Some(error) = &state.error {
            debug!("Own review of movie {} unavailable: {}", movie_id, error);
        }
        state
            .data
            .and_then(|review| review.as_ref().as_ref().map(|r| r.id))
    }

    /// The signed-in user; `Some(None)` data means signed out
    pub async fn current_user(&self) -> QueryState<Option<User>> {
        let api = self.api.clone();
        self.queries
            .query(
                keys::current_user(),
                move || {
                    let api = api.clone();
                    async move { api.fetch_current_user().await }
                },
                QueryOptions::default(),
            )
            .await
    }

    /// Warms the movie detail entry, e.g. when a card is hovered
    pub async fn prefetch_movie(&self, movie_id: i64) {
        let api = self.api.clone();
        self.queries
            .prefetch(
                keys::movie(movie_id),
                move || {
                    let api = api.clone();
                    async move { api.fetch_movie(movie_id).await }
                },
                QueryOptions::default(),
            )
            .await;
    }

    /// Pager over the review list of `movie_id`, starting at page 1
    pub fn review_pager(&self, movie_id: i64) -> ReviewPager {
        let api = self.api.clone();
        ReviewPager::new(self.queries.clone(), movie_id, move |page| {
            let api = api.clone();
            async move { api.fetch_reviews(movie_id, page).await }
        })
        .with_page_size(self.page_size)
        .with_stale_time(self.reviews_stale_time)
    }

    /// Creates (`review_id == None`) or updates the viewer's review
    ///
    /// The draft is validated first; an invalid draft never reaches the
    /// network. On success the movie and "my review" entries go stale.
    pub async fn save_review(
        &self,
        movie_id: i64,
        review_id: Option<i64>,
        draft: ReviewDraft,
    ) -> MutationResult<()> {
        draft.validate()?;
        debug!("Saving review for movie {} ({:?})", movie_id, review_id);

        let api = self.api.clone();
        self.mutations
            .run(
                MutationKind::SaveReview,
                move || {
                    let api = api.clone();
                    let draft = draft.clone();
                    async move { api.save_review(movie_id, review_id, &draft).await }
                },
                MutationEffects::review_changed(movie_id),
            )
            .await
    }

    pub async fn delete_review(&self, movie_id: i64, review_id: i64) -> MutationResult<()> {
        let api = self.api.clone();
        self.mutations
            .run(
                MutationKind::DeleteReview,
                move || {
                    let api = api.clone();
                    async move { api.delete_review(movie_id, review_id).await }
                },
                MutationEffects::review_changed(movie_id),
            )
            .await
    }

    /// Ends the session; on success every cached entry is dropped
    pub async fn logout(&self) -> MutationResult<()> {
        let api = self.api.clone();
        self.mutations
            .run(
                MutationKind::Logout,
                move || {
                    let api = api.clone();
                    async move { api.logout().await }
                },
                MutationEffects::session_ended(),
            )
            .await
    }
}
