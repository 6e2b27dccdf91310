//! Command-line argument parsing for Flickmeter
//!
//! This module defines the CLI structure using clap derive macros:
//! browsing trending and searched movies, reading movie details and review
//! pages, writing reviews and managing the session.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Flickmeter - browse movies and reviews from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "flickmeter",
    version,
    about = "Browse movies and manage your reviews",
    long_about = "A terminal client for the Flickmeter movie API.
Reads are cached per session and deduplicated; review pages are prefetched ahead of paging."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// API base URL (overrides config and environment)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Session token (overrides config and environment)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub session: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List trending movies
    Trending {
        /// Weekly instead of daily trending
        #[arg(long)]
        weekly: bool,
    },

    /// Search movies by title
    Search {
        /// Search text
        query: String,
    },

    /// Show movie details, videos and your review
    Movie {
        /// Movie id
        id: i64,
    },

    /// Page through the reviews of a movie
    Reviews(ReviewsArgs),

    /// Write or delete your review
    Review(ReviewArgs),

    /// Show the signed-in user
    Whoami,

    /// End the current session
    Logout,

    /// Write a default configuration file
    InitConfig,
}

/// Arguments for the reviews command
#[derive(Args, Debug, Clone)]
pub struct ReviewsArgs {
    /// Movie id
    pub id: i64,

    /// First page to show (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Number of pages to walk
    #[arg(long, default_value = "1")]
    pub pages: u32,
}

/// Arguments for review management
#[derive(Args, Debug)]
pub struct ReviewArgs {
    #[command(subcommand)]
    pub action: ReviewAction,
}

/// Review management actions
#[derive(Subcommand, Debug)]
pub enum ReviewAction {
    /// Create or update your review
    Save {
        /// Movie id
        movie_id: i64,

        /// Review title (required, at most 100 characters)
        #[arg(long)]
        title: String,

        /// Rating from 1 to 10
        #[arg(long, default_value = "5")]
        rating: i32,

        /// Review text (at most 1000 characters)
        #[arg(long, default_value = "")]
        body: String,

        /// Existing review id; updates instead of creating
        #[arg(long)]
        id: Option<i64>,
    },

    /// Delete one of your reviews
    Delete {
        /// Movie id
        movie_id: i64,

        /// Review id
        review_id: i64,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

impl ReviewsArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.page == 0 {
            return Err("Pages are numbered from 1".to_string());
        }
        if self.pages == 0 {
            return Err("Number of pages must be greater than 0".to_string());
        }
        Ok(())
    }
}
