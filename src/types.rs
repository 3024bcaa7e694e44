//! Core data types for candidates, ranked results, tags and search filters.
//!
//! - [`Candidate`] - A manga title with its raw rating statistics
//! - [`RankedCandidate`] - A candidate paired with its adjusted score
//! - [`Tag`] - A catalog tag that can be used in filters
//! - [`SearchFilters`] - Include/exclude tag filters for a search
//!
//! # Examples
//!
//! ```rust
//! use mangarank::types::*;
//!
//! let candidate = Candidate {
//!     id: "a1c7c817-4e59-43b7-9365-09675a149a6f".to_string(),
//!     title: "One Piece".to_string(),
//!     rating: 9.1,
//!     votes: 12_480,
//!     follows: 210_000,
//! };
//! assert!(candidate.has_votes());
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// Website the candidate URLs point to.
pub const TITLE_BASE_URL: &str = "https://mangadex.org/title";

/// A manga title as returned by the catalog, with its rating statistics.
///
/// # Fields
///
/// * `id` - Opaque identifier within the catalog
/// * `title` - Display title
/// * `rating` - Average rating on a 0-10 scale, meaningful only when `votes > 0`
/// * `votes` - Number of votes contributing to `rating`
/// * `follows` - Number of accounts following the title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Identifier within the catalog
    pub id: String,

    /// Display title
    pub title: String,

    /// Average rating (0-10)
    pub rating: f64,

    /// Number of votes behind `rating`
    pub votes: u64,

    /// Follower count
    #[serde(default)]
    pub follows: u64,
}

impl Candidate {
    /// Returns `true` if at least one vote contributes to the average rating.
    pub fn has_votes(&self) -> bool {
        self.votes > 0
    }

    /// Link to the title's page on the catalog website.
    ///
    /// ```rust
    /// # use mangarank::Candidate;
    /// let candidate = Candidate {
    ///     id: "abc".to_string(),
    ///     title: "Test".to_string(),
    ///     rating: 0.0,
    ///     votes: 0,
    ///     follows: 0,
    /// };
    /// assert_eq!(candidate.url(), "https://mangadex.org/title/abc");
    /// ```
    pub fn url(&self) -> String {
        format!("{}/{}", TITLE_BASE_URL, self.id)
    }
}

/// A candidate paired with the score computed by the [`Ranker`](crate::rank::Ranker).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// The underlying candidate
    #[serde(flatten)]
    pub candidate: Candidate,

    /// Bayesian-adjusted score
    pub score: f64,
}

/// A tag offered by the catalog for filtering searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Catalog-internal identifier used in search requests
    pub id: String,

    /// Display name, matched case-insensitively against user input
    pub name: String,

    /// Tag group such as `genre`, `theme`, `format` or `content`
    pub group: String,
}

/// Tag filters for a catalog search.
///
/// Results must carry every tag in `include_tags` and none of the tags in
/// `exclude_tags`. Tag names are compared case-insensitively. `pages` bounds
/// how many result pages the catalog is asked for.
///
/// # Builder Usage
///
/// ```rust
/// use mangarank::types::SearchFiltersBuilder;
///
/// let filters = SearchFiltersBuilder::default()
///     .include_tags(["Romance".to_string(), "Comedy".to_string()])
///     .exclude_tags(["Tragedy".to_string()])
///     .pages(3usize)
///     .build()
///     .unwrap();
///
/// assert!(filters.validate().is_ok());
/// assert_eq!(filters.pages, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into))]
pub struct SearchFilters {
    #[builder(default)]
    pub include_tags: BTreeSet<String>,
    #[builder(default)]
    pub exclude_tags: BTreeSet<String>,
    #[builder(default = "DEFAULT_PAGES")]
    pub pages: usize,
}

/// Number of result pages requested when nothing else is specified.
pub const DEFAULT_PAGES: usize = 10;

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            include_tags: BTreeSet::new(),
            exclude_tags: BTreeSet::new(),
            pages: DEFAULT_PAGES,
        }
    }
}

impl SearchFilters {
    /// Checks that the filters are well-formed without contacting the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if a tag name is blank, if `pages` is
    /// zero, or if a tag appears in both the include and exclude sets.
    pub fn validate(&self) -> Result<()> {
        if self.pages == 0 {
            return Err(Error::invalid_filter("at least one page must be requested"));
        }

        for tag in self.include_tags.iter().chain(&self.exclude_tags) {
            if tag.trim().is_empty() {
                return Err(Error::invalid_filter("tag names must not be blank"));
            }
        }

        let excluded: BTreeSet<String> = self
            .exclude_tags
            .iter()
            .map(|tag| normalize_tag(tag))
            .collect();

        let conflicts: Vec<&str> = self
            .include_tags
            .iter()
            .filter(|tag| excluded.contains(&normalize_tag(tag)))
            .map(String::as_str)
            .collect();

        if !conflicts.is_empty() {
            return Err(Error::invalid_filter(format!(
                "tags both included and excluded: {}",
                conflicts.join(", ")
            )));
        }

        Ok(())
    }

    /// Returns `true` if neither include nor exclude tags are set.
    pub fn is_unfiltered(&self) -> bool {
        self.include_tags.is_empty() && self.exclude_tags.is_empty()
    }
}

/// Canonical form of a tag name used for comparisons.
pub fn normalize_tag(name: &str) -> String {
    name.trim().to_lowercase()
}
