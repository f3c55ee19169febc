//! HTTP client for portal queries and webhook delivery
//!
//! Requests made through one client share its rate limiter and cancellation
//! token, and every call is bounded by the configured timeout.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::{
    Client, Url,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::config::HttpConfig;

/// HTTP client configuration
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_http_config(&HttpConfig::default())
    }
}

impl HttpClientConfig {
    /// Create HttpClientConfig from the loaded configuration section
    pub fn from_http_config(config: &HttpConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.timeout_seconds,
            max_requests_per_second: config.max_requests_per_second,
            follow_redirects: config.follow_redirects,
        }
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request cancelled")]
    Cancelled,
}

/// Rate-limited, cancellable JSON client
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    cancellation: CancellationToken,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig, cancellation: CancellationToken) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| HttpError::Build(format!("invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .ok_or_else(|| HttpError::Build("rate limit must be greater than 0".to_string()))?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            cancellation,
        })
    }

    /// POST a JSON body and return the full response body on a 2xx status
    pub async fn post_json<B: Serialize + Sync + ?Sized>(
        &self,
        url: &Url,
        headers: HeaderMap,
        body: &B,
    ) -> Result<Vec<u8>, HttpError> {
        if self.cancellation.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        tokio::select! {
            _ = self.rate_limiter.until_ready() => {},
            _ = self.cancellation.cancelled() => return Err(HttpError::Cancelled),
        }

        tracing::debug!("POST {}", url);

        let request = self.client.post(url.clone()).headers(headers).json(body);
        let response = tokio::select! {
            result = request.send() => result.map_err(|source| HttpError::Request {
                url: url.to_string(),
                source,
            })?,
            _ = self.cancellation.cancelled() => {
                tracing::warn!("🛑 HTTP request cancelled for URL: {}", url);
                return Err(HttpError::Cancelled);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = tokio::select! {
            result = response.bytes() => result.map_err(|source| HttpError::Body {
                url: url.to_string(),
                source,
            })?,
            _ = self.cancellation.cancelled() => {
                tracing::warn!("🛑 Response reading cancelled for URL: {}", url);
                return Err(HttpError::Cancelled);
            }
        };

        tracing::debug!("Successfully posted: {} ({}, {} bytes)", url, status, bytes.len());
        Ok(bytes.to_vec())
    }
}
