//! Fluent search builder and candidate list helpers.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mangarank::prelude::*;
//! use mangarank::sources::MangaDexCatalog;
//!
//! # async fn example() -> mangarank::Result<()> {
//! let catalog = MangaDexCatalog::new(CatalogConfig::default());
//!
//! let ranked = catalog
//!     .search()
//!     .include_tags(["Action", "Adventure"])
//!     .exclude_tags(["Tragedy"])
//!     .pages(3)
//!     .rank(&Ranker::default())
//!     .await?
//!     .above(7.5)
//!     .top(20);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use tracing::info;

use crate::{
    error::Result,
    rank::Ranker,
    source::Catalog,
    types::{Candidate, RankedCandidate, SearchFilters},
};

/// A fluent builder that collects [`SearchFilters`] and runs them against a
/// [`Catalog`].
///
/// # Execution
///
/// - [`fetch()`](SearchBuilder::fetch) - Validated candidates in fetch order
/// - [`rank()`](SearchBuilder::rank) - Fetch, then rank with a [`Ranker`]
/// - [`build()`](SearchBuilder::build) - Just the filters
pub struct SearchBuilder<'a> {
    catalog: &'a dyn Catalog,
    filters: SearchFilters,
}

impl<'a> SearchBuilder<'a> {
    /// Creates a search builder with default filters.
    ///
    /// Usually reached through [`Catalog::search()`].
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self {
            catalog,
            filters: SearchFilters::default(),
        }
    }

    /// Replaces all filters at once.
    pub fn filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Requires results to carry all of these tags.
    pub fn include_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.include_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Requires results to carry none of these tags.
    pub fn exclude_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.exclude_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets how many result pages are requested.
    pub fn pages(mut self, pages: usize) -> Self {
        self.filters.pages = pages;
        self
    }

    /// Validates the filters and fetches the matching candidates.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFilter`](crate::Error::InvalidFilter) before any request
    /// is made if the filters are malformed; otherwise whatever the catalog
    /// returns.
    pub async fn fetch(self) -> Result<Vec<Candidate>> {
        self.filters.validate()?;

        let candidates = self.catalog.fetch(&self.filters).await?.dedupe_by_id();
        info!(
            catalog = self.catalog.id(),
            candidates = candidates.len(),
            "Fetched candidates"
        );
        Ok(candidates)
    }

    /// Fetches the candidates and ranks them.
    pub async fn rank(self, ranker: &Ranker) -> Result<Vec<RankedCandidate>> {
        let candidates = self.fetch().await?;
        Ok(ranker.rank(candidates))
    }

    /// Returns the filters without running the search.
    pub fn build(self) -> SearchFilters {
        self.filters
    }
}

/// Extension trait with post-processing for fetched candidates.
pub trait CandidateListExt {
    /// Removes candidates whose id was already seen, keeping the first occurrence.
    fn dedupe_by_id(self) -> Self;
}

impl CandidateListExt for Vec<Candidate> {
    fn dedupe_by_id(mut self) -> Self {
        let mut seen = HashSet::new();
        self.retain(|candidate| seen.insert(candidate.id.clone()));
        self
    }
}
