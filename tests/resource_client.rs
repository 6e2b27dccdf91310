//! Integration tests for the movie API client
//!
//! A mock server stands in for the API; each test checks how one status
//! code maps to a typed outcome.

use flickmeter::app::{ClientConfig, MovieClient, ReviewDraft};
use flickmeter::errors::{ClientError, ErrorInfo};
use httpmock::Method::{DELETE, GET, PATCH, POST};
use httpmock::MockServer;
use serde_json::{json, Value};
use std::net::TcpListener;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client_for(server: &MockServer, session: Option<&str>) -> MovieClient {
    let mut config = ClientConfig::for_base_url(&server.base_url()).unwrap();
    config.session = session.map(str::to_string);
    MovieClient::with_config(config).unwrap()
}

fn movie_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "original_title": title,
        "overview": "",
        "release_date": "1985-06-01",
        "runtime": 162,
        "vote_average": 8.2,
        "vote_count": 1200,
        "genres": [{"id": 18, "name": "Drama"}]
    })
}

fn review_json(id: i64, movie_id: i64, user_id: i64) -> Value {
    json!({
        "id": id,
        "movie_id": movie_id,
        "user_id": user_id,
        "title": "Masterpiece",
        "rating": 9,
        "review": "Epic in every sense.",
        "created_at": "2024-01-01T00:00:00Z",
        "user": {"id": user_id, "username": "kurosawa", "avatar_url": ""}
    })
}

#[tokio::test]
async fn decodes_movie_on_success() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/movies/42");
        then.status(200).json_body(movie_json(42, "Ran"));
    });

    let movie = client_for(&server, None).fetch_movie(42).await.unwrap();
    mock.assert();
    assert_eq!(movie.display_title(), "Ran");
    assert_eq!(movie.release_year(), Some("1985"));
    assert_eq!(movie.formatted_runtime(), "2h 42m");
}

#[tokio::test]
async fn missing_movie_fails_with_cause_404() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/movies/7");
        then.status(404).json_body(json!({"message": "Movie not found"}));
    });

    let error = client_for(&server, None).fetch_movie(7).await.unwrap_err();
    assert!(matches!(error, ClientError::Status { status: 404, .. }));

    let info: ErrorInfo = error.into();
    assert_eq!(info.cause, Some(404));
    assert_eq!(info.message, "Movie not found");
}

#[tokio::test]
async fn my_review_404_is_absent() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/movies/42/reviews/me");
        then.status(404);
    });

    let review = client_for(&server, Some("abc"))
        .fetch_my_review(42)
        .await
        .unwrap();
    assert!(review.is_none());
}

#[tokio::test]
async fn my_review_401_is_an_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/movies/42/reviews/me");
        then.status(401).json_body(json!({"message": "Unauthorized"}));
    });

    let error = client_for(&server, None)
        .fetch_my_review(42)
        .await
        .unwrap_err();
    assert_eq!(error.cause(), Some(401));
}

#[tokio::test]
async fn current_user_401_is_signed_out() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/users/me");
        then.status(401);
    });

    let user = client_for(&server, None).fetch_current_user().await.unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn session_cookie_is_sent() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/users/me")
            .header("cookie", "session=abc123");
        then.status(200)
            .json_body(json!({"id": 3, "username": "mifune", "avatar_url": ""}));
    });

    let user = client_for(&server, Some("abc123"))
        .fetch_current_user()
        .await
        .unwrap()
        .unwrap();
    mock.assert();
    assert_eq!(user.username, "mifune");
}

#[tokio::test]
async fn search_query_is_encoded() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/movies/search")
            .query_param("query", "seven samurai & co");
        then.status(200).json_body(json!([movie_json(1, "Seven Samurai")]));
    });

    let movies = client_for(&server, None)
        .search_movies("seven samurai & co")
        .await
        .unwrap();
    mock.assert();
    assert_eq!(movies.len(), 1);
}

#[tokio::test]
async fn review_page_null_body_is_empty() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/movies/42/reviews")
            .query_param("page", "3");
        then.status(200).body("null");
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/movies/42/reviews")
            .query_param("page", "1");
        then.status(200).json_body(json!([review_json(1, 42, 5)]));
    });

    let client = client_for(&server, None);
    assert!(client.fetch_reviews(42, 3).await.unwrap().is_empty());
    let page = client.fetch_reviews(42, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.0[0].user.username, "kurosawa");
}

#[tokio::test]
async fn save_creates_then_updates() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let body = json!({"title": "Great", "rating": 8, "review": "Loved it"});
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/movies/42/reviews")
            .json_body(body.clone());
        then.status(201);
    });
    let update = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/movies/42/reviews/9")
            .json_body(body.clone());
        then.status(200);
    });

    let client = client_for(&server, Some("abc"));
    let draft = ReviewDraft::new("Great", 8, "Loved it");
    client.save_review(42, None, &draft).await.unwrap();
    client.save_review(42, Some(9), &draft).await.unwrap();

    create.assert();
    update.assert();
}

#[tokio::test]
async fn delete_failure_keeps_status() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/api/movies/42/reviews/9");
        then.status(403).json_body(json!({"error": "Not your review"}));
    });

    let error = client_for(&server, Some("abc"))
        .delete_review(42, 9)
        .await
        .unwrap_err();
    assert_eq!(error.cause(), Some(403));
    assert_eq!(error.to_string(), "Not your review");
}

#[tokio::test]
async fn undecodable_body_has_no_cause() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/movies/trending");
        then.status(200).body("<html>oops</html>");
    });

    let error = client_for(&server, None)
        .fetch_trending(false)
        .await
        .unwrap_err();
    assert!(matches!(error, ClientError::Decode(_)));
    assert_eq!(error.cause(), None);
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/flick/api/movies/42");
        then.status(200).json_body(movie_json(42, "Ran"));
    });

    let config = ClientConfig::for_base_url(&format!("{}/flick", server.base_url())).unwrap();
    let movie = MovieClient::with_config(config)
        .unwrap()
        .fetch_movie(42)
        .await
        .unwrap();
    mock.assert();
    assert_eq!(movie.id, 42);
}

#[tokio::test]
async fn videos_without_key_are_skipped() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/movies/42/videos");
        then.status(200).json_body(json!([
            {"id": "v1", "name": "Trailer", "key": "abc", "site": "YouTube", "type": "Trailer"},
            {"id": "v2", "name": "Teaser", "key": "", "site": "YouTube", "type": "Teaser"}
        ]));
    });

    let videos = client_for(&server, None).fetch_videos(42).await.unwrap();
    mock.assert_hits(1);
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].name, "Trailer");
}
