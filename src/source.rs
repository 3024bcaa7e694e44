//! The catalog trait: the boundary between the ranker and a remote manga service.
//!
//! A [`Catalog`] turns [`SearchFilters`] into a list of [`Candidate`]s. It is a
//! thin adapter: it talks to the service, validates the responses and shapes
//! them into candidates. Ranking happens elsewhere.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mangarank::prelude::*;
//! use mangarank::sources::MangaDexCatalog;
//!
//! # async fn example() -> mangarank::Result<()> {
//! let catalog = MangaDexCatalog::new(CatalogConfig::from_env())
//!     .authenticate()
//!     .await?;
//!
//! let candidates = catalog
//!     .search()
//!     .include_tags(["Romance"])
//!     .pages(2)
//!     .fetch()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::{
    error::Result,
    search::SearchBuilder,
    types::{Candidate, SearchFilters, Tag},
};

/// Trait that every catalog adapter implements.
///
/// # Required Methods
///
/// * [`id()`](Catalog::id) - Short identifier, used in logs and errors
/// * [`name()`](Catalog::name) - Human-readable name
/// * [`base_url()`](Catalog::base_url) - Base URL of the API
/// * [`tags()`](Catalog::tags) - Tags available for filtering
/// * [`fetch()`](Catalog::fetch) - Candidates matching the filters
///
/// # Implementation Guidelines
///
/// - Use [`net::HttpClient`](crate::net::HttpClient) for requests
/// - Deserialize responses into typed structs; report shape mismatches as
///   remote-service errors instead of passing partial data on
/// - Do not retry failed requests
/// - Return candidates in the order the service listed them, without duplicates
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the short identifier of this catalog, e.g. `"mgd"`.
    fn id(&self) -> &'static str;

    /// Returns the human-readable name of this catalog.
    fn name(&self) -> &'static str;

    /// Returns the base URL of the catalog's API, without trailing slash.
    fn base_url(&self) -> &str;

    /// Lists the tags the catalog accepts in filters.
    ///
    /// # Errors
    ///
    /// Any remote-service error from the request.
    async fn tags(&self) -> Result<Vec<Tag>>;

    /// Fetches the candidates matching `filters`.
    ///
    /// Results contain every include-tag and none of the exclude-tags. They
    /// are unordered with respect to rank.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidFilter`](crate::Error::InvalidFilter) - The filters are
    ///   contradictory or name a tag the catalog does not know
    /// * Remote-service errors (see [`Error::is_remote`](crate::Error::is_remote))
    ///   for unreachable services and malformed responses
    async fn fetch(&self, filters: &SearchFilters) -> Result<Vec<Candidate>>;

    /// Starts a fluent search against this catalog.
    fn search(&self) -> SearchBuilder<'_>
    where
        Self: Sized,
    {
        SearchBuilder::new(self)
    }
}
