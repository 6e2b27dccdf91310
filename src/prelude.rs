//! Prelude module for Flickmeter Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use flickmeter::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use flickmeter::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = MovieClient::with_config(ClientConfig::default())?;
//!     let queries = MovieQueries::new(client, QueryConfig::default());
//!
//!     let movie = queries.movie(42).await;
//!     if let Some(error) = movie.error {
//!         eprintln!("{error}");
//!     }
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, ErrorInfo, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    // Client
    ClientConfig,
    MovieClient,
    // Cache and orchestration
    MovieQueries,
    MutationKind,
    QueryClient,
    QueryConfig,
    QueryKey,
    QueryOptions,
    QueryState,
    RetryPolicy,
    // Records
    Movie,
    Review,
    ReviewDraft,
    User,
    Video,
};
pub use crate::app::query::keys;

// Commonly used constants
pub use crate::constants::{DEFAULT_RATE_LIMIT_RPS, PAGE_SIZE, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::sync::Arc;

// Common external crate re-exports for convenience
pub use tokio;
