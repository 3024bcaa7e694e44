use crate::{
    config::{CatalogConfig, Credentials},
    error::{Error, Result},
    net::{HttpClient, query_string},
    source::Catalog,
    types::{Candidate, SearchFilters, Tag, normalize_tag},
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Largest `offset + limit` the search endpoint accepts.
const MAX_SEARCH_WINDOW: usize = 10_000;

/// Most ids accepted by one statistics request.
const STATISTICS_CHUNK: usize = 100;

/// Title of the catalog's placeholder entry, which never shows up in results.
const PLACEHOLDER_TITLE: &str = "Test";

/// Decorative suffixes stripped from display titles.
static TITLE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(\[official colored\]|\((anthology|doujinshi|web ?comic)\))\s*$")
        .expect("title suffix pattern is valid")
});

/// MangaDex tag list response
#[derive(Debug, Deserialize)]
struct MangaDexTagListResponse {
    data: Vec<MangaDexTagData>,
}

/// MangaDex tag structure
#[derive(Debug, Deserialize)]
struct MangaDexTagData {
    id: String,
    attributes: MangaDexTagAttributes,
}

/// MangaDex tag attributes
#[derive(Debug, Deserialize)]
struct MangaDexTagAttributes {
    name: HashMap<String, String>,
    group: String,
}

/// MangaDex API search response
#[derive(Debug, Deserialize)]
struct MangaDexSearchResponse {
    data: Vec<MangaDexMangaData>,
    offset: u32,
    total: u32,
}

/// MangaDex manga data structure
#[derive(Debug, Deserialize)]
struct MangaDexMangaData {
    id: String,
    attributes: MangaDexMangaAttributes,
}

/// MangaDex manga attributes
#[derive(Debug, Deserialize)]
struct MangaDexMangaAttributes {
    title: HashMap<String, String>,
    #[serde(rename = "altTitles", default)]
    alt_titles: Vec<HashMap<String, String>>,
}

/// MangaDex statistics response, keyed by manga id
#[derive(Debug, Deserialize)]
struct MangaDexStatisticsResponse {
    statistics: HashMap<String, MangaDexStatistics>,
}

/// MangaDex statistics for one manga
#[derive(Debug, Deserialize)]
struct MangaDexStatistics {
    rating: MangaDexRating,
    #[serde(default)]
    follows: Option<u64>,
}

/// MangaDex rating block. The batch endpoint may leave out the distribution.
#[derive(Debug, Deserialize)]
struct MangaDexRating {
    average: Option<f64>,
    #[serde(default)]
    distribution: Option<HashMap<String, u64>>,
}

/// Login request body
#[derive(Debug, Serialize)]
struct MangaDexLoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login response
#[derive(Debug, Deserialize)]
struct MangaDexLoginResponse {
    token: MangaDexLoginToken,
}

/// Login session token
#[derive(Debug, Deserialize)]
struct MangaDexLoginToken {
    session: String,
}

/// A search hit before its statistics are known.
#[derive(Debug)]
struct Listing {
    id: String,
    title: String,
}

/// Catalog adapter for the MangaDex JSON API.
///
/// Searches are ordered by follower count, so the first pages hold the titles
/// most people read. Each page is followed by nothing but the next page; the
/// statistics for all hits are then fetched in chunks.
///
/// # Authentication
///
/// With credentials, [`authenticate()`](MangaDexCatalog::authenticate) logs in
/// and every later request carries the session token. Authenticated searches
/// let the account's content preferences apply; anonymous searches are pinned
/// to `safe` and `suggestive` content.
///
/// # Rate Limiting
///
/// Requests are spaced by the configured delay (250ms by default), well below
/// the API's limit of five requests per second.
///
/// # Examples
///
/// ```rust,no_run
/// use mangarank::prelude::*;
/// use mangarank::sources::MangaDexCatalog;
///
/// # async fn example() -> mangarank::Result<()> {
/// let catalog = MangaDexCatalog::new(CatalogConfig::from_env())
///     .authenticate()
///     .await?;
///
/// let filters = SearchFiltersBuilder::default()
///     .include_tags(["Romance".to_string()])
///     .pages(2usize)
///     .build()
///     .unwrap();
/// let candidates = catalog.fetch(&filters).await?;
/// # Ok(())
/// # }
/// ```
pub struct MangaDexCatalog {
    client: HttpClient,
    api_base: String,
    page_size: u32,
    credentials: Option<Credentials>,
}

impl MangaDexCatalog {
    /// Create a new MangaDex catalog from a configuration.
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            client: HttpClient::new("mgd").with_rate_limit(config.rate_limit_ms),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
            credentials: config.credentials,
        }
    }

    /// Logs in if credentials were configured; otherwise returns the catalog unchanged.
    ///
    /// # Errors
    ///
    /// A remote-service error if the login request fails or the response has
    /// no session token.
    pub async fn authenticate(mut self) -> Result<Self> {
        let Some(credentials) = self.credentials.take() else {
            debug!("No credentials configured, searching anonymously");
            return Ok(self);
        };

        let url = format!("{}/auth/login", self.api_base);
        let body = MangaDexLoginRequest {
            username: &credentials.username,
            password: &credentials.password,
        };

        let response: MangaDexLoginResponse =
            self.client.post_json(&url, &body).await.map_err(|e| match e {
                Error::Remote { service, message } => {
                    Error::remote(service, format!("login failed: {}", message))
                }
                other => other,
            })?;

        if response.token.session.is_empty() {
            return Err(Error::remote(self.id(), "login returned an empty session token"));
        }

        info!(username = %credentials.username, "Authenticated with MangaDex");
        self.client = self.client.with_bearer_token(&response.token.session);
        Ok(self)
    }

    /// Returns `true` once [`authenticate()`](MangaDexCatalog::authenticate) logged in.
    pub fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }

    /// Pick the best title from a multi-language title map
    fn extract_best_title(title_map: &HashMap<String, String>) -> Option<String> {
        let priority_langs = ["en", "en-us", "ja-ro", "ja"];

        for lang in &priority_langs {
            if let Some(title) = title_map.get(*lang) {
                if !title.trim().is_empty() {
                    return Some(title.trim().to_string());
                }
            }
        }

        // Smallest key wins so the choice does not depend on map iteration order
        let mut rest: Vec<(&String, &String)> = title_map
            .iter()
            .filter(|(_, title)| !title.trim().is_empty())
            .collect();
        rest.sort();
        rest.first().map(|(_, title)| title.trim().to_string())
    }

    /// Display title for a search hit: main title, then alternative titles.
    fn display_title(attributes: &MangaDexMangaAttributes) -> String {
        let title = Self::extract_best_title(&attributes.title)
            .or_else(|| {
                attributes
                    .alt_titles
                    .iter()
                    .find_map(|alt| alt.get("en").filter(|t| !t.trim().is_empty()))
                    .map(|t| t.trim().to_string())
            })
            .or_else(|| attributes.alt_titles.iter().find_map(Self::extract_best_title))
            .unwrap_or_else(|| "Unknown Title".to_string());

        clean_title(&title)
    }

    /// Map tag names to tag ids, failing on names the catalog does not know.
    async fn resolve_tags(&self, filters: &SearchFilters) -> Result<(Vec<String>, Vec<String>)> {
        if filters.is_unfiltered() {
            return Ok((Vec::new(), Vec::new()));
        }

        let by_name: HashMap<String, String> = self
            .tags()
            .await?
            .into_iter()
            .map(|tag| (normalize_tag(&tag.name), tag.id))
            .collect();

        let lookup = |names: &std::collections::BTreeSet<String>| -> Result<Vec<String>> {
            names
                .iter()
                .map(|name| {
                    by_name
                        .get(&normalize_tag(name))
                        .cloned()
                        .ok_or_else(|| Error::invalid_filter(format!("unknown tag '{}'", name)))
                })
                .collect()
        };

        Ok((lookup(&filters.include_tags)?, lookup(&filters.exclude_tags)?))
    }

    /// Format search query parameters for one page
    fn format_search_query(
        &self,
        include_ids: &[String],
        exclude_ids: &[String],
        offset: usize,
        limit: usize,
    ) -> String {
        let mut params: Vec<(&str, String)> = vec![
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("order[followedCount]", "desc".to_string()),
            ("includedTagsMode", "AND".to_string()),
            ("excludedTagsMode", "OR".to_string()),
        ];

        for id in include_ids {
            params.push(("includedTags[]", id.clone()));
        }
        for id in exclude_ids {
            params.push(("excludedTags[]", id.clone()));
        }

        // Accounts carry their own content preferences
        if !self.is_authenticated() {
            for rating in ["safe", "suggestive"] {
                params.push(("contentRating[]", rating.to_string()));
            }
        }

        query_string(&params)
    }

    /// Read up to `pages` search pages, one request after another.
    async fn search_pages(
        &self,
        include_ids: &[String],
        exclude_ids: &[String],
        pages: usize,
    ) -> Result<Vec<Listing>> {
        let mut listings = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0usize;
        let page_size = self.page_size as usize;

        for page in 0..pages {
            let limit = window_limit(offset, page_size);
            if limit == 0 {
                debug!(offset, "Reached the end of the search window");
                break;
            }

            let query = self.format_search_query(include_ids, exclude_ids, offset, limit);
            let url = format!("{}/manga?{}", self.api_base, query);
            let response: MangaDexSearchResponse = self.client.get_json(&url).await?;

            debug!(
                page = page + 1,
                hits = response.data.len(),
                total = response.total,
                "Read search page"
            );

            if response.data.is_empty() {
                break;
            }

            let received = response.data.len();
            for manga in response.data {
                let title = Self::display_title(&manga.attributes);
                if title == PLACEHOLDER_TITLE {
                    debug!(id = %manga.id, "Skipping placeholder entry");
                    continue;
                }
                if seen.insert(manga.id.clone()) {
                    listings.push(Listing { id: manga.id, title });
                }
            }

            offset = response.offset as usize + received;
            if offset >= response.total as usize {
                break;
            }
        }

        Ok(listings)
    }

    /// Fetch statistics for the given ids, in chunks.
    async fn fetch_statistics(&self, ids: &[&str]) -> Result<HashMap<String, MangaDexStatistics>> {
        let mut statistics = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(STATISTICS_CHUNK) {
            let params: Vec<(&str, &str)> = chunk.iter().map(|id| ("manga[]", *id)).collect();
            let url = format!("{}/statistics/manga?{}", self.api_base, query_string(&params));
            let response: MangaDexStatisticsResponse = self.client.get_json(&url).await?;
            statistics.extend(response.statistics);
        }

        // The batch endpoint can omit vote distributions; the single endpoint has them
        let incomplete: Vec<String> = statistics
            .iter()
            .filter(|(_, stats)| stats.rating.distribution.is_none())
            .map(|(id, _)| id.clone())
            .collect();

        if !incomplete.is_empty() {
            info!(
                titles = incomplete.len(),
                "Batch statistics lack vote distributions, fetching them one title at a time"
            );
        }

        for id in incomplete {
            let url = format!("{}/statistics/manga/{}", self.api_base, id);
            let mut response: MangaDexStatisticsResponse = self.client.get_json(&url).await?;
            let stats = response.statistics.remove(&id).ok_or_else(|| {
                Error::parse(format!("statistics response for manga '{}' has no entry", id))
            })?;
            statistics.insert(id, stats);
        }

        Ok(statistics)
    }

    /// Combine a listing with its statistics into a candidate
    fn to_candidate(listing: Listing, stats: &MangaDexStatistics) -> Result<Candidate> {
        let distribution = stats.rating.distribution.as_ref().ok_or_else(|| {
            Error::parse(format!("statistics for manga '{}' have no vote distribution", listing.id))
        })?;
        let votes: u64 = distribution.values().sum();

        let rating = match stats.rating.average {
            Some(average) if votes > 0 => {
                if !average.is_finite() {
                    return Err(Error::parse(format!(
                        "manga '{}' has a non-finite average rating",
                        listing.id
                    )));
                }
                average
            }
            _ => 0.0,
        };

        Ok(Candidate {
            id: listing.id,
            title: listing.title,
            rating,
            votes,
            follows: stats.follows.unwrap_or(0),
        })
    }
}

impl Default for MangaDexCatalog {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}

#[async_trait]
impl Catalog for MangaDexCatalog {
    fn id(&self) -> &'static str {
        "mgd"
    }

    fn name(&self) -> &'static str {
        "MangaDex"
    }

    fn base_url(&self) -> &str {
        &self.api_base
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        let url = format!("{}/manga/tag", self.api_base);
        let response: MangaDexTagListResponse = self.client.get_json(&url).await?;

        let mut tags: Vec<Tag> = response
            .data
            .into_iter()
            .filter_map(|tag| {
                let name = Self::extract_best_title(&tag.attributes.name);
                if name.is_none() {
                    warn!(id = %tag.id, "Skipping tag without a name");
                }
                name.map(|name| Tag {
                    id: tag.id,
                    name,
                    group: tag.attributes.group,
                })
            })
            .collect();

        tags.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(tags)
    }

    async fn fetch(&self, filters: &SearchFilters) -> Result<Vec<Candidate>> {
        filters.validate()?;

        let (include_ids, exclude_ids) = self.resolve_tags(filters).await?;
        let listings = self
            .search_pages(&include_ids, &exclude_ids, filters.pages)
            .await?;

        if listings.is_empty() {
            info!("Search returned no titles");
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        let statistics = self.fetch_statistics(&ids).await?;

        listings
            .into_iter()
            .map(|listing| {
                let stats = statistics.get(&listing.id).ok_or_else(|| {
                    Error::parse(format!("no statistics returned for manga '{}'", listing.id))
                })?;
                Self::to_candidate(listing, stats)
            })
            .collect()
    }
}

/// Page size for a search page starting at `offset`, shrunk so the request
/// stays inside the search window. `0` once the window is exhausted.
fn window_limit(offset: usize, page_size: usize) -> usize {
    page_size.min(MAX_SEARCH_WINDOW.saturating_sub(offset))
}

/// Strip decorative suffixes such as `(Doujinshi)` from a title.
fn clean_title(title: &str) -> String {
    let mut cleaned = title.trim().to_string();
    loop {
        let stripped = TITLE_SUFFIX.replace(&cleaned, "").trim().to_string();
        if stripped == cleaned || stripped.is_empty() {
            return cleaned;
        }
        cleaned = stripped;
    }
}
