//! Typed client for the movie API
//!
//! Each operation issues exactly one HTTP call and maps the response to a
//! typed outcome:
//! - 2xx: body decoded and schema-checked as the declared type
//! - 404 on "my review" and 401 on "current user": a valid `None`
//! - any other status: `ClientError::Status` carrying the HTTP status
//!
//! The module is organized into:
//! - `config`: client configuration and reqwest client building
//! - `http`: rate-limited transport and status mapping

use reqwest::StatusCode;
use url::Url;

use crate::app::models::{retain_playable, Movie, Review, ReviewDraft, ReviewPage, User, Video};
use crate::constants::api;
use crate::errors::{ClientError, ClientResult};

pub mod config;
pub mod http;

pub use config::ClientConfig;

use http::HttpHandler;

/// Ends the path with `/` so relative joins append to it
fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// HTTP client for the movie API
#[derive(Debug)]
pub struct MovieClient {
    http_handler: HttpHandler,
    base_url: Url,
    has_session: bool,
}

impl MovieClient {
    /// Creates a client with default configuration
    pub fn new() -> ClientResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the reqwest client cannot be built or the
    /// rate limit is zero
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        let base_url = as_directory(config.base_url);
        tracing::debug!("Created movie API client for {}", base_url);

        Ok(Self {
            http_handler,
            base_url,
            has_session: config.session.is_some(),
        })
    }

    /// Base URL of the API server
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a session cookie is sent with every request
    pub fn has_session(&self) -> bool {
        self.has_session
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                error: e.to_string(),
            })
    }

    fn movie_endpoint(&self, movie_id: i64, rest: &str) -> ClientResult<Url> {
        self.endpoint(&format!("{}/{}{}", api::MOVIES, movie_id, rest))
    }

    /// `GET /api/movies/trending?weekly=bool`
    pub async fn fetch_trending(&self, weekly: bool) -> ClientResult<Vec<Movie>> {
        let mut url = self.endpoint(api::TRENDING)?;
        url.query_pairs_mut()
            .append_pair("weekly", if weekly { "true" } else { "false" });

        let response = self.http_handler.send(self.http_handler.client().get(url)).await?;
        self.http_handler.decode(response).await
    }

    /// `GET /api/movies/search?query=str`
    pub async fn search_movies(&self, query: &str) -> ClientResult<Vec<Movie>> {
        let mut url = self.endpoint(api::SEARCH)?;
        url.query_pairs_mut().append_pair("query", query);

        let response = self.http_handler.send(self.http_handler.client().get(url)).await?;
        self.http_handler.decode(response).await
    }

    /// `GET /api/movies/:id`
    pub async fn fetch_movie(&self, movie_id: i64) -> ClientResult<Movie> {
        let url = self.movie_endpoint(movie_id, "")?;
        let response = self.http_handler.send(self.http_handler.client().get(url)).await?;
        let mut movie: Movie = self.http_handler.decode(response).await?;
        if let Some(videos) = movie.videos.as_mut() {
            retain_playable(videos);
        }
        Ok(movie)
    }

    /// `GET /api/movies/:id/videos`
    pub async fn fetch_videos(&self, movie_id: i64) -> ClientResult<Vec<Video>> {
        let url = self.movie_endpoint(movie_id, "/videos")?;
        let response = self.http_handler.send(self.http_handler.client().get(url)).await?;
        let mut videos: Vec<Video> = self.http_handler.decode(response).await?;
        retain_playable(&mut videos);
        Ok(videos)
    }

    /// `GET /api/movies/:id/reviews?page=n` (1-based pages)
    pub async fn fetch_reviews(&self, movie_id: i64, page: u32) -> ClientResult<ReviewPage> {
        let mut url = self.movie_endpoint(movie_id, "/reviews")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let response = self.http_handler.send(self.http_handler.client().get(url)).await?;
        self.http_handler.decode(response).await
    }

    /// `GET /api/movies/:id/reviews/me`; 404 means the user has not reviewed
    pub async fn fetch_my_review(&self, movie_id: i64) -> ClientResult<Option<Review>> {
        let url = self.movie_endpoint(movie_id, "/reviews/me")?;
        let response = self.http_handler.send(self.http_handler.client().get(url)).await?;
        self.http_handler
            .decode_optional(response, StatusCode::NOT_FOUND)
            .await
    }

    /// Creates the review when `review_id` is `None`, updates it otherwise
    pub async fn save_review(
        &self,
        movie_id: i64,
        review_id: Option<i64>,
        draft: &ReviewDraft,
    ) -> ClientResult<()> {
        let request = match review_id {
            None => {
                let url = self.movie_endpoint(movie_id, "/reviews")?;
                self.http_handler.client().post(url)
            }
            Some(review_id) => {
                let url = self.movie_endpoint(movie_id, &format!("/reviews/{review_id}"))?;
                self.http_handler.client().patch(url)
            }
        };

        let response = self.http_handler.send(request.json(draft)).await?;
        self.http_handler.expect_success(response).await
    }

    /// `DELETE /api/movies/:id/reviews/:rid`
    pub async fn delete_review(&self, movie_id: i64, review_id: i64) -> ClientResult<()> {
        let url = self.movie_endpoint(movie_id, &format!("/reviews/{review_id}"))?;
        let response = self
            .http_handler
            .send(self.http_handler.client().delete(url))
            .await?;
        self.http_handler.expect_success(response).await
    }

    /// `GET /api/users/me`; 401 means nobody is signed in
    pub async fn fetch_current_user(&self) -> ClientResult<Option<User>> {
        let url = self.endpoint(api::CURRENT_USER)?;
        let response = self.http_handler.send(self.http_handler.client().get(url)).await?;
        self.http_handler
            .decode_optional(response, StatusCode::UNAUTHORIZED)
            .await
    }

    /// `POST /api/users/logout`
    pub async fn logout(&self) -> ClientResult<()> {
        let url = self.endpoint(api::LOGOUT)?;
        let response = self
            .http_handler
            .send(self.http_handler.client().post(url))
            .await?;
        self.http_handler.expect_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = MovieClient::new().unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = ClientConfig {
            rate_limit_rps: 0,
            ..Default::default()
        };
        assert!(MovieClient::with_config(config).is_err());
    }

    #[test]
    fn test_movie_endpoint_paths() {
        let client = MovieClient::new().unwrap();
        assert_eq!(
            client.movie_endpoint(42, "/reviews/me").unwrap().as_str(),
            "http://localhost:8080/api/movies/42/reviews/me"
        );
        assert_eq!(
            client.endpoint(api::CURRENT_USER).unwrap().path(),
            "/api/users/me"
        );
    }

    #[test]
    fn test_base_url_path_prefix_kept() {
        for base in ["http://host.test/flick", "http://host.test/flick/"] {
            let config = ClientConfig::for_base_url(base).unwrap();
            let client = MovieClient::with_config(config).unwrap();
            assert_eq!(
                client.movie_endpoint(42, "/reviews").unwrap().as_str(),
                "http://host.test/flick/api/movies/42/reviews"
            );
            assert_eq!(
                client.endpoint(api::LOGOUT).unwrap().as_str(),
                "http://host.test/flick/api/users/logout"
            );
        }
    }
}
