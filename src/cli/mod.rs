//! Command-line interface components
//!
//! This module contains CLI-specific code for the Flickmeter application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, GlobalArgs, ReviewAction, ReviewArgs, ReviewsArgs};
pub use commands::{
    handle_init_config, handle_logout, handle_movie, handle_review, handle_reviews,
    handle_search, handle_trending, handle_whoami,
};
