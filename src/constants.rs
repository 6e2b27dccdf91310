//! Application constants for Flickmeter
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the API base URL
    pub const API_URL: &str = "FLICKMETER_API_URL";

    /// Session token sent as the `session` cookie
    pub const SESSION: &str = "FLICKMETER_SESSION";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("Flickmeter/", env!("CARGO_PKG_VERSION"));

    /// Default API base URL
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Default client-side rate limit (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 20;

    /// Name of the session cookie issued by the API
    pub const SESSION_COOKIE: &str = "session";
}

/// HTTP status codes the client dispatches on
pub mod status {
    pub const UNAUTHORIZED: u16 = 401;
    pub const NOT_FOUND: u16 = 404;
}

/// API paths, relative to the base URL
///
/// No leading slash, so a path prefix on the base URL is kept.
pub mod api {
    pub const TRENDING: &str = "api/movies/trending";
    pub const SEARCH: &str = "api/movies/search";
    pub const MOVIES: &str = "api/movies";
    pub const CURRENT_USER: &str = "api/users/me";
    pub const LOGOUT: &str = "api/users/logout";
}

/// Query cache and orchestration defaults
pub mod query {
    use super::Duration;

    /// Default freshness window: always refetch on mount
    pub const DEFAULT_STALE_TIME: Duration = Duration::ZERO;

    /// Freshness window for paginated review lists
    pub const REVIEWS_STALE_TIME: Duration = Duration::from_secs(5 * 60);

    /// Number of retries the default policy allows after the first failure
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential retry backoff
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

    /// Upper bound on a single retry delay
    pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

    /// Retries allowed for the logout mutation
    pub const LOGOUT_RETRIES: u32 = 2;
}

/// Query key segments shared between readers and invalidators
pub mod keys {
    pub const MOVIES: &str = "movies";
    pub const REVIEWS: &str = "reviews";
    pub const VIDEOS: &str = "videos";
    pub const ME: &str = "me";
    pub const TRENDING: &str = "trending";
    pub const DAILY: &str = "daily";
    pub const WEEKLY: &str = "weekly";
    pub const USERS: &str = "users";
}

/// Review constraints and pagination
pub mod reviews {
    /// Reviews per page; a full page is the only hint that another exists
    pub const PAGE_SIZE: usize = 10;

    pub const MAX_TITLE_LENGTH: usize = 100;
    pub const MAX_REVIEW_LENGTH: usize = 1000;

    pub const MIN_RATING: i32 = 1;
    pub const MAX_RATING: i32 = 10;
    pub const DEFAULT_RATING: i32 = 5;
}

/// UI behaviour constants
pub mod ui {
    use super::Duration;

    /// Quiet window before a search-as-you-type request fires
    pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

    /// Scroll position assumed before the first scroll event
    pub const NAV_INITIAL_SCROLL_Y: f64 = 5000.0;
}

/// Re-export commonly used constants at module level
pub use http::{DEFAULT_RATE_LIMIT_RPS, USER_AGENT};
pub use reviews::PAGE_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        assert_eq!(query::DEFAULT_STALE_TIME, Duration::ZERO);
        assert_eq!(query::REVIEWS_STALE_TIME, Duration::from_secs(300));
        assert_eq!(query::MAX_RETRIES, 3);
    }

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("Flickmeter/"));
    }

    #[test]
    fn test_review_limits() {
        assert_eq!(PAGE_SIZE, 10);
        assert!(reviews::MIN_RATING <= reviews::DEFAULT_RATING);
        assert!(reviews::DEFAULT_RATING <= reviews::MAX_RATING);
    }
}
