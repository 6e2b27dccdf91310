//! Paginated review list with lookahead prefetch
//!
//! Pages are 1-based and cached under `["movies", id, "reviews", page]`.
//! The API returns no total count, so a full page is the only signal that a
//! next page may exist; when a page comes back full the next one is
//! prefetched in the background so paging forward is served from cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::models::{Review, ReviewPage};
use crate::app::notice::{Notice, QueryContext};
use crate::app::query::{keys, QueryClient, QueryOptions, QueryState};
use crate::constants::{query, reviews};
use crate::errors::ErrorInfo;

type PageFetch = Arc<dyn Fn(u32) -> BoxFuture<'static, Result<ReviewPage, ErrorInfo>> + Send + Sync>;

/// What the review list renders for one page
#[derive(Debug)]
pub struct ReviewPageView {
    pub page: u32,
    /// Reviews on this page, minus the viewer's own
    pub reviews: Vec<Review>,
    pub has_previous: bool,
    pub has_next: bool,
    pub error: Option<ErrorInfo>,
    /// Background fetch of the next page, started when this one is full
    pub prefetch: Option<JoinHandle<()>>,
}

impl ReviewPageView {
    /// Notice to show when the page failed to load
    pub fn notice(&self) -> Option<Notice> {
        self.error
            .as_ref()
            .and_then(|error| Notice::for_query_error(QueryContext::Reviews, error))
    }
}

/// Walks the review pages of one movie
pub struct ReviewPager {
    queries: QueryClient,
    movie_id: i64,
    page: u32,
    page_size: usize,
    stale_time: Duration,
    fetch_page: PageFetch,
    last_full: bool,
}

impl std::fmt::Debug for ReviewPager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewPager")
            .field("movie_id", &self.movie_id)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("stale_time", &self.stale_time)
            .finish()
    }
}

impl ReviewPager {
    /// Creates a pager starting at page 1
    ///
    /// `fetch_page` loads one page by number; it is called for the current
    /// page and for lookahead prefetches.
    pub fn new<F, Fut, E>(queries: QueryClient, movie_id: i64, fetch_page: F) -> Self
    where
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ReviewPage, E>> + Send + 'static,
        E: Into<ErrorInfo> + Send + 'static,
    {
        let fetch_page: PageFetch = Arc::new(move |page| {
            fetch_page(page)
                .map(|result| result.map_err(Into::<ErrorInfo>::into))
                .boxed()
        });

        Self {
            queries,
            movie_id,
            page: 1,
            page_size: reviews::PAGE_SIZE,
            stale_time: query::REVIEWS_STALE_TIME,
            fetch_page,
            last_full: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn movie_id(&self) -> i64 {
        self.movie_id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Jumps to `page`, clamped to 1
    pub fn go_to(&mut self, page: u32) {
        self.page = page.max(1);
        self.last_full = false;
    }

    /// Moves back one page; false on page 1
    pub fn previous(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        self.last_full = false;
        true
    }

    /// Moves forward one page; only allowed after a full page was loaded
    pub fn next(&mut self) -> bool {
        if !self.last_full {
            return false;
        }
        let Some(next) = self.page.checked_add(1) else {
            return false;
        };
        self.page = next;
        self.last_full = false;
        true
    }

    /// Loads the current page and prefetches the next one when it is full
    ///
    /// `hide_review` is the id of the viewer's own review, which the list
    /// leaves out because it is shown on its own.
    pub async fn load(&mut self, hide_review: Option<i64>) -> ReviewPageView {
        let page = self.page;
        let state: QueryState<ReviewPage> = self
            .queries
            .query(
                keys::movie_reviews(self.movie_id, page),
                self.fetcher(page),
                self.options(),
            )
            .await;

        let full = state
            .data
            .as_ref()
            .is_some_and(|reviews| reviews.is_full(self.page_size));
        // No page follows u32::MAX
        let next_page = page.checked_add(1).filter(|_| full);
        self.last_full = next_page.is_some();

        let prefetch = next_page.map(|next| {
            debug!(
                "Page {} of movie {} is full; prefetching page {}",
                page, self.movie_id, next
            );
            self.queries.prefetch_in_background(
                keys::movie_reviews(self.movie_id, next),
                self.fetcher(next),
                self.options(),
            )
        });

        let reviews = state
            .data
            .as_ref()
            .map(|reviews| {
                reviews
                    .iter()
                    .filter(|review| Some(review.id) != hide_review)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        ReviewPageView {
            page,
            reviews,
            has_previous: page > 1,
            has_next: next_page.is_some(),
            error: state.error,
            prefetch,
        }
    }

    fn options(&self) -> QueryOptions {
        QueryOptions::default().stale_time(self.stale_time)
    }

    fn fetcher(
        &self,
        page: u32,
    ) -> impl Fn() -> BoxFuture<'static, Result<ReviewPage, ErrorInfo>> + Send + Sync + 'static
    {
        let fetch_page = self.fetch_page.clone();
        move || fetch_page(page)
    }
}

/// The "my review" slot above the review list
#[derive(Debug, Clone, PartialEq)]
pub enum MyReviewPanel {
    Loading,
    /// Signed out: offer a sign-in instead of a form
    SignIn,
    /// Could not load; the list still renders
    Unavailable(Notice),
    Existing(Review),
    WriteNew,
}

impl MyReviewPanel {
    pub fn from_state(state: &QueryState<Option<Review>>) -> Self {
        if let Some(error) = &state.error {
            return match Notice::for_query_error(QueryContext::MyReview, error) {
                Some(notice) => MyReviewPanel::Unavailable(notice),
                None => MyReviewPanel::SignIn,
            };
        }
        match state.data.as_deref() {
            Some(Some(review)) => MyReviewPanel::Existing(review.clone()),
            Some(None) => MyReviewPanel::WriteNew,
            None => MyReviewPanel::Loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::fixtures;
    use crate::app::query::{QueryConfig, QueryStatus, RetryBackoff};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn test_client() -> QueryClient {
        QueryClient::new(QueryConfig {
            backoff: RetryBackoff::immediate(),
            ..Default::default()
        })
    }

    /// Serves `sizes[page - 1]` reviews per page and records requested pages
    fn pager_with_sizes(
        queries: QueryClient,
        sizes: Vec<usize>,
    ) -> (ReviewPager, Arc<Mutex<Vec<u32>>>) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let log = requested.clone();
        let pager = ReviewPager::new(queries, 42, move |page: u32| {
            log.lock().unwrap().push(page);
            let size = sizes.get(page as usize - 1).copied().unwrap_or(0);
            let reviews = (0..size)
                .map(|i| fixtures::review(page as i64 * 100 + i as i64, 42, i as i64 + 1))
                .collect();
            async move { Ok::<_, ErrorInfo>(ReviewPage(reviews)) }
        });
        (pager, requested)
    }

    #[tokio::test]
    async fn test_full_page_prefetches_next() {
        let queries = test_client();
        let (mut pager, requested) = pager_with_sizes(queries.clone(), vec![10, 4]);

        let view = pager.load(None).await;
        assert_eq!(view.reviews.len(), 10);
        assert!(view.has_next);
        assert!(!view.has_previous);
        view.prefetch.unwrap().await.unwrap();

        assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
        let next = queries
            .cache()
            .get::<ReviewPage>(&keys::movie_reviews(42, 2))
            .await
            .unwrap();
        assert_eq!(next.status, QueryStatus::Success);
    }

    #[tokio::test]
    async fn test_short_page_has_no_next() {
        let (mut pager, requested) = pager_with_sizes(test_client(), vec![7]);

        let view = pager.load(None).await;
        assert!(!view.has_next);
        assert!(view.prefetch.is_none());
        assert!(!pager.next());
        assert_eq!(*requested.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_paging_forward_uses_prefetched_page() {
        let (mut pager, requested) = pager_with_sizes(test_client(), vec![10, 10, 3]);

        let view = pager.load(None).await;
        view.prefetch.unwrap().await.unwrap();
        assert!(pager.next());

        let view = pager.load(None).await;
        assert_eq!(view.page, 2);
        assert!(view.has_previous);
        view.prefetch.unwrap().await.unwrap();

        // Page 2 came from the prefetch; page 3 is the new lookahead
        assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_fresh_for_five_minutes() {
        let (mut pager, requested) = pager_with_sizes(test_client(), vec![3]);

        pager.load(None).await;
        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        pager.load(None).await;
        assert_eq!(requested.lock().unwrap().len(), 1);

        tokio::time::advance(Duration::from_secs(2 * 60)).await;
        pager.load(None).await;
        assert_eq!(requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_own_review_hidden_from_list() {
        let (mut pager, _) = pager_with_sizes(test_client(), vec![3]);
        let view = pager.load(Some(101)).await;
        assert_eq!(view.reviews.len(), 2);
        assert!(view.reviews.iter().all(|review| review.id != 101));
    }

    #[tokio::test]
    async fn test_failed_page_reports_notice() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut pager = ReviewPager::new(test_client(), 1, move |_page: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<ReviewPage, _>(ErrorInfo::with_cause("Internal", 500)) }
        });

        let view = pager.load(None).await;
        assert!(view.reviews.is_empty());
        assert!(!view.has_next);
        assert_eq!(view.notice().unwrap().title, "Couldn't load reviews");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_full_last_page_number_stops_paging() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let log = requested.clone();
        let mut pager = ReviewPager::new(test_client(), 42, move |page: u32| {
            log.lock().unwrap().push(page);
            let reviews = (0..10).map(|i| fixtures::review(i + 1, 42, i + 1)).collect();
            async move { Ok::<_, ErrorInfo>(ReviewPage(reviews)) }
        });
        pager.go_to(u32::MAX);

        let view = pager.load(None).await;
        assert_eq!(view.page, u32::MAX);
        assert_eq!(view.reviews.len(), 10);
        assert!(!view.has_next);
        assert!(view.prefetch.is_none());
        assert!(!pager.next());
        assert_eq!(pager.page(), u32::MAX);
        assert_eq!(*requested.lock().unwrap(), vec![u32::MAX]);
    }

    #[test]
    fn test_previous_stops_at_first_page() {
        let (mut pager, _) = pager_with_sizes(test_client(), vec![]);
        assert!(!pager.previous());
        pager.go_to(3);
        assert!(pager.previous());
        assert_eq!(pager.page(), 2);
        pager.go_to(0);
        assert_eq!(pager.page(), 1);
    }

    fn state(data: Option<Option<Review>>, error: Option<ErrorInfo>) -> QueryState<Option<Review>> {
        QueryState {
            status: if error.is_some() {
                QueryStatus::Error
            } else if data.is_some() {
                QueryStatus::Success
            } else {
                QueryStatus::Loading
            },
            data: data.map(Arc::new),
            error,
            is_fetching: false,
        }
    }

    #[test]
    fn test_my_review_panel() {
        assert_eq!(
            MyReviewPanel::from_state(&state(None, Some(ErrorInfo::with_cause("x", 401)))),
            MyReviewPanel::SignIn
        );
        assert_eq!(
            MyReviewPanel::from_state(&state(None, Some(ErrorInfo::with_cause("x", 500)))),
            MyReviewPanel::Unavailable(Notice::error("Couldn't load your review"))
        );
        assert_eq!(
            MyReviewPanel::from_state(&state(Some(None), None)),
            MyReviewPanel::WriteNew
        );
        let review = fixtures::review(1, 2, 3);
        assert_eq!(
            MyReviewPanel::from_state(&state(Some(Some(review.clone())), None)),
            MyReviewPanel::Existing(review)
        );
        assert_eq!(MyReviewPanel::from_state(&state(None, None)), MyReviewPanel::Loading);
    }
}
