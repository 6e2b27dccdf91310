//! Core HTTP operations with rate limiting and status mapping
//!
//! Every resource call goes through [`HttpHandler`]: one rate-limited
//! attempt, then a uniform mapping from status code to typed outcome.
//! Retrying is the query orchestrator's job, not the transport's.

use std::num::NonZeroU32;

use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::app::models::Validate;
use crate::errors::{ClientError, ClientResult};

/// Error body shape returned by the API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP operations handler with a politeness rate limit
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` if the rate limit is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> ClientResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> ClientResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let quota = Quota::per_second(NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            ClientError::InvalidConfig {
                reason: "Rate limit must be non-zero".to_string(),
            }
        })?);
        Ok(RateLimiter::direct(quota))
    }

    /// Sends a request once, after waiting for a rate limiter slot
    pub async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        self.rate_limiter.until_ready().await;

        let response = request.send().await.map_err(|e| {
            tracing::warn!("Request failed before a response arrived: {}", e);
            ClientError::Http(e)
        })?;

        tracing::debug!("{} {}", response.status().as_u16(), response.url());
        Ok(response)
    }

    /// Decodes a 2xx body as `T`, or fails with the status as cause
    pub async fn decode<T>(&self, response: Response) -> ClientResult<T>
    where
        T: DeserializeOwned + Validate,
    {
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let bytes = response.bytes().await?;
        let value: T = serde_json::from_slice(&bytes)?;
        value.validate()?;
        Ok(value)
    }

    /// Like [`decode`](Self::decode), but `absent` is a valid empty result
    pub async fn decode_optional<T>(
        &self,
        response: Response,
        absent: StatusCode,
    ) -> ClientResult<Option<T>>
    where
        T: DeserializeOwned + Validate,
    {
        if response.status() == absent {
            tracing::debug!("{} treated as absent: {}", absent.as_u16(), response.url());
            return Ok(None);
        }
        self.decode(response).await.map(Some)
    }

    /// Fails unless the response is 2xx; the body is discarded
    pub async fn expect_success(&self, response: Response) -> ClientResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(response).await)
        }
    }

    /// Builds a status error from a non-2xx response, using its body if present
    async fn status_error(response: Response) -> ClientError {
        let status = response.status();
        let fallback = status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string();

        let message = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message.or(body.error))
                .unwrap_or(fallback),
            Err(_) => fallback,
        };

        ClientError::Status {
            status: status.as_u16(),
            message,
        }
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}
