//! Error types and result handling for mangarank operations.
//!
//! All fallible operations return a [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! Errors fall into two groups:
//!
//! - **Remote service errors**: the catalog could not be reached, answered with a
//!   non-success status, throttled the client, or sent a payload that does not
//!   match the expected shape. [`Error::is_remote()`] returns `true` for these.
//! - **Invalid filters**: the requested tag filters are contradictory, malformed
//!   or unknown to the catalog. Contradictions are detected before any request
//!   is made.
//!
//! Ranking itself never fails.
//!
//! # Examples
//!
//! ```rust
//! use mangarank::{Error, SearchFiltersBuilder};
//!
//! let filters = SearchFiltersBuilder::default()
//!     .include_tags(["action".to_string()])
//!     .exclude_tags(["Action".to_string()])
//!     .build()
//!     .unwrap();
//!
//! match filters.validate() {
//!     Err(Error::InvalidFilter(msg)) => println!("Bad filters: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//!     Ok(()) => println!("Filters look fine"),
//! }
//! ```

use thiserror::Error;

/// Type alias for Results with mangarank errors.
///
/// ```rust
/// use mangarank::{Result, Error};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::parse("Something went wrong"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all mangarank operations.
///
/// # Variants
///
/// * [`Network`](Error::Network) - HTTP client and connection errors
/// * [`Remote`](Error::Remote) - Catalog answered with an error or an unusable payload
/// * [`RateLimit`](Error::RateLimit) - Catalog throttled the client
/// * [`Parse`](Error::Parse) - Data did not have the expected shape
/// * [`Json`](Error::Json) - JSON deserialization errors
/// * [`InvalidFilter`](Error::InvalidFilter) - Contradictory or unknown tag filters
/// * [`Yaml`](Error::Yaml) - YAML encoding of the ranked list failed
/// * [`Io`](Error::Io) - Writing the output failed
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from reqwest: connection failures, DNS resolution,
    /// TLS problems and transport timeouts.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Errors reported by a remote catalog service.
    ///
    /// # Fields
    ///
    /// * `service` - The identifier of the catalog that failed
    /// * `message` - What went wrong
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mangarank::Error;
    ///
    /// let error = Error::remote("mgd", "HTTP 503 Service Unavailable");
    /// assert!(error.is_remote());
    /// ```
    #[error("Remote service error [{service}]: {message}")]
    Remote { service: String, message: String },

    /// The catalog rate-limited the client.
    ///
    /// `retry_after` carries the `Retry-After` header when the service sent one.
    /// The tool never retries on its own.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimit { retry_after: Option<u64> },

    /// Data format errors.
    ///
    /// Used when a response deserializes but its content is unusable, such as
    /// a search hit with no matching statistics entry.
    ///
    /// ```rust
    /// use mangarank::Error;
    ///
    /// let error = Error::parse("Missing statistics for manga 'abc'");
    /// ```
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON deserialization errors.
    ///
    /// Raised when a response body does not match the typed structure expected
    /// at the catalog boundary.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tag filters are contradictory, malformed or unknown.
    ///
    /// ```rust
    /// use mangarank::Error;
    ///
    /// let error = Error::invalid_filter("tag 'romance' is both included and excluded");
    /// assert!(!error.is_remote());
    /// ```
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// YAML serialization errors from the `yaml` output format.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors, typically while writing the ranked list.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a remote service error with service ID and message.
    ///
    /// ```rust
    /// use mangarank::Error;
    ///
    /// let error = Error::remote("mgd", "Login rejected");
    /// assert_eq!(error.to_string(), "Remote service error [mgd]: Login rejected");
    /// ```
    pub fn remote(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Remote {
            service: service.into(),
            message: msg.into(),
        }
    }

    /// Creates a rate limit error with optional retry-after time.
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Error::RateLimit { retry_after }
    }

    /// Creates an invalid filter error with the given message.
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Error::InvalidFilter(msg.into())
    }

    /// Returns `true` if the error means the catalog service could not be
    /// reached or returned data that could not be used.
    ///
    /// ```rust
    /// use mangarank::Error;
    ///
    /// assert!(Error::rate_limit(Some(10)).is_remote());
    /// assert!(Error::parse("bad payload").is_remote());
    /// assert!(!Error::invalid_filter("empty tag").is_remote());
    /// ```
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Network(_)
                | Error::Remote { .. }
                | Error::RateLimit { .. }
                | Error::Parse(_)
                | Error::Json(_)
        )
    }
}
