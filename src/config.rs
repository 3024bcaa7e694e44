//! Catalog configuration and account credentials.
//!
//! Credentials come from the process environment once, at startup, and are
//! handed to the catalog at construction. Nothing else in the crate reads the
//! environment.
//!
//! | Variable            | Meaning                                     |
//! |---------------------|---------------------------------------------|
//! | `MANGADEX_USERNAME` | Account name (optional)                     |
//! | `MANGADEX_PASSWORD` | Account password (optional)                 |
//! | `MANGADEX_API_URL`  | API base URL, defaults to the public API    |
//!
//! # Examples
//!
//! ```rust
//! use mangarank::config::{CatalogConfig, Credentials};
//!
//! let config = CatalogConfig::default()
//!     .with_api_base("http://localhost:8080")
//!     .with_credentials(Credentials::new("reader", "hunter2"));
//!
//! assert!(config.credentials.is_some());
//! ```

use std::fmt;

/// Environment variable holding the account name.
pub const USERNAME_VAR: &str = "MANGADEX_USERNAME";
/// Environment variable holding the account password.
pub const PASSWORD_VAR: &str = "MANGADEX_PASSWORD";
/// Environment variable overriding the API base URL.
pub const API_URL_VAR: &str = "MANGADEX_API_URL";

/// Public MangaDex API.
pub const DEFAULT_API_BASE: &str = "https://api.mangadex.org";
/// Results per search page. The API caps this at 100.
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Minimum delay between two requests, in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 250;

/// Account credentials for authenticated searches.
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials from an optional username/password pair.
    ///
    /// Both values must be present and non-empty; otherwise the catalog is used
    /// unauthenticated.
    ///
    /// ```rust
    /// use mangarank::config::Credentials;
    ///
    /// assert!(Credentials::from_pair(Some("a".into()), Some("b".into())).is_some());
    /// assert!(Credentials::from_pair(Some("a".into()), None).is_none());
    /// assert!(Credentials::from_pair(Some("".into()), Some("b".into())).is_none());
    /// ```
    pub fn from_pair(username: Option<String>, password: Option<String>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Self::new(username, password))
            }
            _ => None,
        }
    }

    /// Reads `MANGADEX_USERNAME` and `MANGADEX_PASSWORD`.
    pub fn from_env() -> Option<Self> {
        Self::from_pair(
            std::env::var(USERNAME_VAR).ok(),
            std::env::var(PASSWORD_VAR).ok(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings for a catalog adapter.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// API base URL without trailing slash
    pub api_base: String,
    /// Results requested per search page
    pub page_size: u32,
    /// Minimum delay between requests in milliseconds
    pub rate_limit_ms: u64,
    /// Optional account credentials
    pub credentials: Option<Credentials>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            credentials: None,
        }
    }
}

impl CatalogConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(api_base) = std::env::var(API_URL_VAR) {
            if !api_base.trim().is_empty() {
                config = config.with_api_base(api_base);
            }
        }
        config.credentials = Credentials::from_env();
        config
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the page size, clamped to the 1-100 range the API accepts.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limit_ms = delay_ms;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }
}
