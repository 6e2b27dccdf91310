//! Command handlers for Flickmeter CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments and the cached movie API. All handlers of one invocation share
//! a single [`MovieQueries`], so repeated reads within a command are served
//! from its cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::app::models::{Movie, Review, ReviewDraft};
use crate::app::ui::{Debouncer, SearchBox, SearchEvent};
use crate::app::{MovieQueries, MyReviewPanel, Notice, QueryContext, QueryState};
use crate::cli::{ReviewAction, ReviewArgs, ReviewsArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, MutationError, Result};

/// Handle the trending command
pub async fn handle_trending(queries: &MovieQueries, weekly: bool) -> Result<()> {
    let state = queries.trending(weekly).await;
    let movies = settled(state, QueryContext::Trending)?;

    let window = if weekly { "this week" } else { "today" };
    println!("🔥 Trending {window}");
    print_movies(&movies);
    Ok(())
}

/// Handle the search command
///
/// The query is typed into a search box one character at a time; the
/// debouncer coalesces the keystrokes so only the full query is sent.
pub async fn handle_search(
    queries: &MovieQueries,
    query: &str,
    debounce: Duration,
) -> Result<()> {
    let results: Arc<Mutex<Vec<(String, QueryState<Vec<Movie>>)>>> =
        Arc::new(Mutex::new(Vec::new()));

    let sink = results.clone();
    let searcher = queries.clone();
    let debouncer = Debouncer::spawn(debounce, move |text: String| {
        let sink = sink.clone();
        let searcher = searcher.clone();
        async move {
            debug!("Searching for '{}'", text);
            let state = searcher.search(&text).await;
            sink.lock().await.push((text, state));
        }
    });

    let mut search_box = SearchBox::new();
    let mut typed = String::new();
    for ch in query.chars() {
        typed.push(ch);
        if let Some(text) = search_box.handle(SearchEvent::Input(typed.clone())) {
            debouncer.push(text);
        }
    }
    debouncer.finish().await;

    let mut results = results.lock().await;
    info!("Search issued {} request(s)", results.len());

    let Some((text, state)) = results.pop() else {
        println!("Nothing to search for");
        return Ok(());
    };

    let movies = settled(state, QueryContext::Search)?;
    if movies.is_empty() {
        println!("No movies match '{text}'");
    } else {
        println!("🔎 Results for '{text}'");
        print_movies(&movies);
    }
    Ok(())
}

/// Handle the movie command
pub async fn handle_movie(queries: &MovieQueries, movie_id: i64) -> Result<()> {
    let (movie, videos, my_review) = tokio::join!(
        queries.movie(movie_id),
        queries.videos(movie_id),
        queries.my_review(movie_id),
    );

    let movie = settled(movie, QueryContext::Movie)?;
    print_movie_details(&movie);

    match settled(videos, QueryContext::Videos) {
        Ok(videos) if !videos.is_empty() => {
            println!();
            println!("🎬 Videos");
            for video in videos.iter() {
                match video.watch_url() {
                    Some(url) => println!("   {} - {}", video.name, url),
                    None => println!("   {} ({})", video.name, video.site),
                }
            }
        }
        Ok(_) => {}
        Err(e) => debug!("Videos unavailable: {}", e),
    }

    println!();
    let panel = MyReviewPanel::from_state(&my_review);
    let hide_review = match &panel {
        MyReviewPanel::Existing(review) => {
            println!("📝 Your review");
            print_review(review);
            Some(review.id)
        }
        MyReviewPanel::WriteNew => {
            println!("📝 You haven't reviewed this movie yet.");
            println!("   Run 'flickmeter review save {movie_id} --title ...' to write one.");
            None
        }
        MyReviewPanel::SignIn => {
            println!("🔒 Sign in to write a review.");
            None
        }
        MyReviewPanel::Unavailable(notice) => {
            print_notice(notice);
            None
        }
        MyReviewPanel::Loading => None,
    };

    let mut pager = queries.review_pager(movie_id);
    let page = pager.load(hide_review).await;
    if let Some(notice) = page.notice() {
        print_notice(&notice);
        return Ok(());
    }

    println!();
    println!("💬 Reviews");
    if page.reviews.is_empty() {
        println!("   No other reviews yet.");
    }
    for review in &page.reviews {
        print_review(review);
    }
    if page.has_next {
        println!("   More: flickmeter reviews {movie_id} --page 2");
    }
    Ok(())
}

/// Handle the reviews command
///
/// Walks up to `pages` pages. Each full page prefetches the next one, so
/// every page after the first is served from cache.
pub async fn handle_reviews(queries: &MovieQueries, args: ReviewsArgs) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let hide_review = queries.own_review_id(args.id).await;

    let mut pager = queries.review_pager(args.id);
    pager.go_to(args.page);

    for _ in 0..args.pages {
        let view = pager.load(hide_review).await;
        if let Some(error) = view.error.clone() {
            if let Some(notice) = view.notice() {
                print_notice(&notice);
            }
            return Err(AppError::Query(error));
        }

        println!("💬 Page {}", view.page);
        if view.reviews.is_empty() {
            println!("   No reviews on this page.");
        }
        for review in &view.reviews {
            print_review(review);
        }

        if let Some(prefetch) = view.prefetch {
            if let Err(e) = prefetch.await {
                debug!("Prefetch task failed: {}", e);
            }
        }

        if !view.has_next || !pager.next() {
            break;
        }
    }
    Ok(())
}

/// Handle review writes
pub async fn handle_review(queries: &MovieQueries, args: ReviewArgs) -> Result<()> {
    let result = match args.action {
        ReviewAction::Save {
            movie_id,
            title,
            rating,
            body,
            id,
        } => {
            let draft = ReviewDraft::new(title, rating, body);
            queries
                .save_review(movie_id, id, draft)
                .await
                .map(|()| "✅ Review saved")
        }
        ReviewAction::Delete {
            movie_id,
            review_id,
        } => queries
            .delete_review(movie_id, review_id)
            .await
            .map(|()| "🗑️  Review deleted"),
    };

    report_mutation(result)
}

/// Handle the whoami command
pub async fn handle_whoami(queries: &MovieQueries) -> Result<()> {
    let user = settled(queries.current_user().await, QueryContext::CurrentUser)?;
    match user.as_ref() {
        Some(user) => println!("👤 Signed in as {} (id {})", user.username, user.id),
        None => println!("👤 Not signed in"),
    }
    Ok(())
}

/// Handle the logout command
pub async fn handle_logout(queries: &MovieQueries) -> Result<()> {
    report_mutation(queries.logout().await.map(|()| "👋 Logged out"))
}

/// Handle the init-config command
pub async fn handle_init_config() -> Result<()> {
    let (path, created) = AppConfig::initialize_default_file().await?;
    if created {
        println!("📁 Created default configuration file:");
    } else {
        println!("📁 Configuration file already exists:");
    }
    println!("   {}", path.display());
    Ok(())
}

fn report_mutation(result: std::result::Result<&str, MutationError>) -> Result<()> {
    match result {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(MutationError::Failed { kind, error }) if !error.is_unauthenticated() => {
            print_notice(&Notice::for_mutation_error(kind));
            Err(MutationError::Failed { kind, error }.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Data of a settled query, or its error with the matching notice printed
fn settled<T>(state: QueryState<T>, context: QueryContext) -> Result<Arc<T>> {
    if let Some(error) = state.error {
        if let Some(notice) = Notice::for_query_error(context, &error) {
            print_notice(&notice);
        }
        return Err(AppError::Query(error));
    }
    state
        .data
        .ok_or_else(|| AppError::generic("Query finished without data"))
}

fn print_notice(notice: &Notice) {
    eprintln!("⚠️  {notice}");
}

fn print_movies(movies: &[Movie]) {
    for movie in movies {
        let year = movie.release_year().unwrap_or("----");
        println!(
            "{:>8}  {} ({})  ★ {:.1}",
            movie.id,
            movie.display_title(),
            year,
            movie.vote_average
        );
    }
}

fn print_movie_details(movie: &Movie) {
    println!("🎞️  {}", movie.display_title());
    let mut facts = Vec::new();
    if let Some(year) = movie.release_year() {
        facts.push(year.to_string());
    }
    let runtime = movie.formatted_runtime();
    if !runtime.is_empty() {
        facts.push(runtime.trim_end().to_string());
    }
    if !movie.genres.is_empty() {
        facts.push(
            movie
                .genres
                .iter()
                .map(|genre| genre.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    if !facts.is_empty() {
        println!("   {}", facts.join(" · "));
    }
    println!("   ★ {:.1} ({} votes)", movie.vote_average, movie.vote_count);
    if !movie.tagline.is_empty() {
        println!("   \"{}\"", movie.tagline);
    }
    if !movie.overview.is_empty() {
        println!("   {}", movie.overview);
    }
}

fn print_review(review: &Review) {
    println!(
        "   [{}/10] {} - by {} on {}",
        review.rating,
        review.title,
        review.user.username,
        review.created_at.format("%Y-%m-%d")
    );
    if !review.review.is_empty() {
        println!("          {}", review.review);
    }
}
