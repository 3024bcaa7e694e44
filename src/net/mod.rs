//! HTTP client and request pacing for catalog adapters.
//!
//! - **HTTP Client**: A global, configured reqwest client with connection pooling
//! - **Rate Limiting**: A per-source minimum delay between requests
//! - **Typed responses**: JSON bodies are deserialized straight into serde structs
//!
//! Requests are never retried. A failed request surfaces as an error and the
//! caller decides what to do; the command-line tool aborts.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mangarank::net::HttpClient;
//!
//! # async fn example() -> mangarank::Result<()> {
//! let client = HttpClient::new("mgd").with_rate_limit(250);
//!
//! let json: serde_json::Value = client.get_json("https://api.mangadex.org/manga/tag").await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, StatusCode, header::HeaderMap};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{Error, Result};

/// Global HTTP client instance.
///
/// Configured with a 30-second timeout, connection pooling, gzip/brotli
/// decompression and a custom User-Agent. Built lazily on first use.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("mangarank/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// Per-source rate limiter.
///
/// Tracks the last request time for each source and sleeps until the minimum
/// delay has passed.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<HashMap<String, Instant>>,
    delay: Duration,
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            delay: self.delay,
        }
    }
}

impl RateLimiter {
    /// Creates a rate limiter enforcing `delay_ms` milliseconds between requests.
    ///
    /// ```rust
    /// use mangarank::net::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(250);
    /// assert_eq!(limiter.delay().as_millis(), 250);
    /// ```
    pub fn new(delay_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            delay: Duration::from_millis(delay_ms),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits if necessary before allowing a request for `source_id`.
    ///
    /// The first request for a source never waits.
    pub async fn wait(&self, source_id: &str) {
        let now = Instant::now();
        let wait_duration = {
            let last_map = self.last_request.lock();
            last_map.get(source_id).and_then(|&last| {
                let elapsed = now.duration_since(last);
                (elapsed < self.delay).then(|| self.delay - elapsed)
            })
        };

        if let Some(duration) = wait_duration {
            tokio::time::sleep(duration).await;
        }

        self.last_request
            .lock()
            .insert(source_id.to_string(), Instant::now());
    }
}

/// HTTP client wrapper with rate limiting, default headers and typed JSON.
///
/// Each client belongs to one source; the source ID is used for pacing and
/// for labelling [`Error::Remote`] errors.
///
/// ```rust
/// use mangarank::net::HttpClient;
///
/// let client = HttpClient::new("mgd")
///     .with_rate_limit(1000)
///     .with_header("Accept-Language", "en");
/// assert_eq!(client.source_id(), "mgd");
/// ```
#[derive(Clone, Debug)]
pub struct HttpClient {
    source_id: String,
    rate_limiter: RateLimiter,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a client for `source_id` with a 200ms default delay.
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            rate_limiter: RateLimiter::new(200),
            headers: HeaderMap::new(),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Sets the minimum delay between requests in milliseconds.
    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limiter = RateLimiter::new(delay_ms);
        self
    }

    /// Adds a header sent with every request. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<reqwest::header::HeaderName>(),
            value.parse::<reqwest::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Authenticates every later request with a bearer token.
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Returns `true` if an `Authorization` header is set.
    pub fn is_authenticated(&self) -> bool {
        self.headers.contains_key(reqwest::header::AUTHORIZATION)
    }

    /// Sends a request once, after rate limiting, and returns the body.
    ///
    /// # Errors
    ///
    /// * [`Error::RateLimit`] - The service answered 429
    /// * [`Error::Remote`] - Any other non-success status
    /// * [`Error::Network`] - Transport failures
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Bytes> {
        self.rate_limiter.wait(&self.source_id).await;

        debug!(source = %self.source_id, url = %url, "Sending request");
        let response = request.headers(self.headers.clone()).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.bytes().await?);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(Error::rate_limit(retry_after));
        }

        debug!(source = %self.source_id, url = %url, status = %status, "Request failed");
        Err(Error::remote(&self.source_id, format!("HTTP {}", status)))
    }

    /// Performs a GET request and returns the raw body.
    pub async fn get(&self, url: &str) -> Result<Bytes> {
        self.send(CLIENT.get(url), url).await
    }

    /// Performs a GET request and deserializes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// All errors from the request, plus [`Error::Json`] if the body does not
    /// match `T`.
    pub async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.get(url).await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Performs a POST request with a JSON body and deserializes the JSON reply.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.send(CLIENT.post(url).json(body), url).await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }
}

/// Builds a query string from key/value pairs, percent-encoding each value.
///
/// Repeated keys are kept, which is how array parameters such as
/// `includedTags[]` are expressed.
///
/// ```rust
/// use mangarank::net::query_string;
///
/// let query = query_string(&[("title", "one piece"), ("ids[]", "a"), ("ids[]", "b")]);
/// assert_eq!(query, "title=one%20piece&ids[]=a&ids[]=b");
/// ```
pub fn query_string<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key.as_ref(), urlencoding::encode(value.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}
