//! Catalog implementations with conditional compilation support.
//!
//! Each catalog is behind its own feature flag:
//! - `source-mangadex` - Enables the MangaDex catalog (default)
//!
//! ```bash
//! cargo build --no-default-features --features source-mangadex
//! ```

#[cfg(feature = "source-mangadex")]
pub mod mangadex;

#[cfg(feature = "source-mangadex")]
pub use mangadex::MangaDexCatalog;
