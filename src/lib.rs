//! # mangarank - Rank MangaDex titles by a Bayesian-averaged rating
//!
//! mangarank searches the MangaDex catalog by tag, collects the rating
//! statistics of every hit and ranks the titles by a score that accounts for
//! how many votes back each average. A title with two perfect votes no longer
//! outranks one with thousands of good ones.
//!
//! ## Features
//!
//! - **Tag filters**: include and exclude tags by name, validated before any request
//! - **Typed catalog boundary**: responses are deserialized into typed structs;
//!   anything malformed is a remote-service error
//! - **Bayesian ranking**: scores shrink toward the corpus mean in proportion to
//!   vote scarcity
//! - **Several output formats**: simple, wide, JSON and CSV
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mangarank::prelude::*;
//! use mangarank::sources::MangaDexCatalog;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> mangarank::Result<()> {
//!     let catalog = MangaDexCatalog::new(CatalogConfig::from_env())
//!         .authenticate()
//!         .await?;
//!
//!     let ranked = catalog
//!         .search()
//!         .include_tags(["Slice of Life"])
//!         .exclude_tags(["Tragedy"])
//!         .pages(5)
//!         .rank(&Ranker::default())
//!         .await?
//!         .top(25);
//!
//!     for entry in &ranked {
//!         println!("{:.2} {}", entry.score, entry.candidate.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`source`]: The [`Catalog`] trait, the fetcher boundary
//! - [`sources`]: Catalog implementations (MangaDex)
//! - [`search`]: Fluent search builder
//! - [`rank`]: Bayesian ranking
//! - [`output`]: Output formats
//! - [`types`]: Candidates, ranked candidates, tags and filters
//! - [`config`]: Catalog configuration and credentials
//! - [`net`]: HTTP client and rate limiting
//! - [`error`]: Error handling

pub mod config;
pub mod error;
pub mod net;
pub mod output;
pub mod rank;
pub mod search;
pub mod source;
pub mod sources;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use mangarank::prelude::*;
///
/// // Now you have access to:
/// // - Catalog, SearchBuilder, CandidateListExt
/// // - Ranker, ConfidenceThreshold, RankedListExt
/// // - Candidate, RankedCandidate, SearchFilters, Tag
/// // - CatalogConfig, Credentials, OutputFormat
/// ```
pub mod prelude {
    pub use crate::{
        config::{CatalogConfig, Credentials},
        output::{OutputFormat, write_ranked},
        rank::{ConfidenceThreshold, RankedListExt, Ranker},
        search::{CandidateListExt, SearchBuilder},
        source::Catalog,
        types::{Candidate, RankedCandidate, SearchFilters, SearchFiltersBuilder, Tag},
    };
}

// Re-export main types at crate root for direct access
pub use error::{Error, Result};
pub use rank::{ConfidenceThreshold, Ranker};
pub use source::Catalog;
pub use types::{Candidate, RankedCandidate, SearchFilters, SearchFiltersBuilder, Tag};
