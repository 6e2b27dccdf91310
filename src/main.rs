//! Flickmeter CLI application
//!
//! Command-line interface for browsing movies and managing reviews against
//! the Flickmeter movie API.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library
use flickmeter::app::{MovieClient, MovieQueries};
use flickmeter::cli::{
    handle_init_config, handle_logout, handle_movie, handle_review, handle_reviews,
    handle_search, handle_trending, handle_whoami, Cli, Commands,
};
use flickmeter::config::AppConfig;
use flickmeter::constants::env;
use flickmeter::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        if e.is_unauthenticated() {
            eprintln!("🔒 Sign in required.");
            eprintln!(
                "   Pass --session <TOKEN> or set {} to your session token.",
                env::SESSION
            );
        } else {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    config.apply_overrides(cli.global.api_url.clone(), cli.global.session.clone());
    config.validate()?;

    init_logging(&cli, &config);

    info!("Flickmeter v{} starting", env!("CARGO_PKG_VERSION"));

    if let Commands::InitConfig = cli.command {
        return handle_init_config().await;
    }

    let queries = build_queries(&config)?;

    match cli.command {
        Commands::Trending { weekly } => {
            info!("Executing trending command");
            handle_trending(&queries, weekly).await
        }
        Commands::Search { query } => {
            info!("Executing search command");
            handle_search(&queries, &query, config.ui.search_debounce).await
        }
        Commands::Movie { id } => {
            info!("Executing movie command");
            handle_movie(&queries, id).await
        }
        Commands::Reviews(args) => {
            info!("Executing reviews command");
            handle_reviews(&queries, args).await
        }
        Commands::Review(args) => {
            info!("Executing review command");
            handle_review(&queries, args).await
        }
        Commands::Whoami => handle_whoami(&queries).await,
        Commands::Logout => {
            info!("Executing logout command");
            handle_logout(&queries).await
        }
        Commands::InitConfig => Ok(()),
    }
}

fn build_queries(config: &AppConfig) -> Result<MovieQueries> {
    let client = MovieClient::with_config(config.client_config()?)?;
    Ok(MovieQueries::new(client, config.query_config())
        .with_page_size(config.ui.review_page_size)
        .with_reviews_stale_time(config.query.reviews_stale_time))
}

/// Initialize logging from CLI verbosity, falling back to the configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let flags_set = cli.global.quiet || cli.global.verbose || cli.global.very_verbose;
    let log_level = if flags_set {
        cli.log_level().to_string().to_lowercase()
    } else {
        config.logging.level.clone()
    };

    let mut filter = EnvFilter::from_default_env();
    match format!("flickmeter={}", log_level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", log_level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}

