//! Flickmeter Library
//!
//! A client for a movie discovery and review API. Reads go through a keyed
//! query cache with request deduplication, staleness windows and
//! status-aware retries; writes go through a mutation runner that
//! invalidates exactly the cache entries they affect.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(PAGE_SIZE, 10);
        assert_eq!(env::API_URL, "FLICKMETER_API_URL");
        assert!(USER_AGENT.contains("Flickmeter"));
    }

    #[test]
    fn test_error_types() {
        let error = errors::ErrorInfo::with_cause("Unauthorized", 401);
        let app_error = AppError::Query(error);

        assert_eq!(app_error.category(), "authentication");
        assert!(!app_error.is_recoverable());
    }
}
