//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the reqwest
//! client used for every call to the movie API, including the session cookie
//! that authenticates the current user.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::http;
use crate::errors::{ClientError, ClientResult};

/// Configuration for the API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API server; paths are joined onto it
    pub base_url: Url,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Client-side rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// User agent header
    pub user_agent: String,
    /// Session token, sent as the `session` cookie
    pub session: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            rate_limit_rps: http::DEFAULT_RATE_LIMIT_RPS,
            user_agent: http::USER_AGENT.to_string(),
            session: None,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(http::DEFAULT_BASE_URL).expect("Default base URL should be valid")
}

impl ClientConfig {
    /// Config pointed at `base_url` with every other setting defaulted
    pub fn for_base_url(base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            error: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            ..Default::default()
        })
    }

    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> ClientResult<Client> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig {
                reason: format!("unsupported URL scheme: {}", self.base_url.scheme()),
            });
        }

        let jar = Arc::new(Jar::default());
        if let Some(session) = &self.session {
            let cookie = format!("{}={}; Path=/", http::SESSION_COOKIE, session);
            jar.add_cookie_str(&cookie, &self.base_url);
        }

        let mut client_builder = Client::builder()
            .cookie_provider(jar)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str());

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(ClientError::Http)
    }
}
