//! Common test utilities
//!
//! Shared candidates, an in-memory catalog and MangaDex payload builders.

use async_trait::async_trait;
use mangarank::prelude::*;
use mangarank::sources::MangaDexCatalog;
use mangarank::{Error, Result};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};

#[allow(dead_code)]
pub const TOLERANCE: f64 = 1e-9;

/// Builds a candidate with a title derived from its id.
#[allow(dead_code)]
pub fn candidate(id: &str, rating: f64, votes: u64) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: format!("Manga {}", id),
        rating,
        votes,
        follows: votes * 10,
    }
}

/// The five-title corpus used by several ranking tests. Its prior mean is 7.62.
#[allow(dead_code)]
pub fn mixed_corpus() -> Vec<Candidate> {
    vec![
        candidate("hyped", 9.9, 2),
        candidate("classic", 8.7, 5000),
        candidate("niche", 8.0, 100),
        candidate("meh", 6.0, 800),
        candidate("bad", 5.5, 1200),
    ]
}

/// An in-memory catalog that serves a fixed candidate list.
#[allow(dead_code)]
pub struct StaticCatalog {
    pub tags: Vec<Tag>,
    pub candidates: Vec<Candidate>,
    pub fail_with: Option<String>,
    pub fetch_calls: AtomicUsize,
}

#[allow(dead_code)]
impl StaticCatalog {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            tags: vec![
                Tag {
                    id: "t-romance".to_string(),
                    name: "Romance".to_string(),
                    group: "genre".to_string(),
                },
                Tag {
                    id: "t-comedy".to_string(),
                    name: "Comedy".to_string(),
                    group: "genre".to_string(),
                },
            ],
            candidates,
            fail_with: None,
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    fn id(&self) -> &'static str {
        "static"
    }

    fn name(&self) -> &'static str {
        "Static Catalog"
    }

    fn base_url(&self) -> &str {
        "memory://static"
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags.clone())
    }

    async fn fetch(&self, _filters: &SearchFilters) -> Result<Vec<Candidate>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(Error::remote(self.id(), message.clone())),
            None => Ok(self.candidates.clone()),
        }
    }
}

/// A MangaDex catalog pointed at a mock server, without request pacing.
#[allow(dead_code)]
pub fn mock_catalog(uri: &str) -> MangaDexCatalog {
    MangaDexCatalog::new(
        CatalogConfig::default()
            .with_api_base(uri)
            .with_rate_limit(0),
    )
}

/// `GET /manga/tag` payload.
#[allow(dead_code)]
pub fn tag_list_body() -> Value {
    json!({
        "result": "ok",
        "response": "collection",
        "data": [
            {"id": "tag-romance", "type": "tag", "attributes": {"name": {"en": "Romance"}, "group": "genre"}},
            {"id": "tag-comedy", "type": "tag", "attributes": {"name": {"en": "Comedy"}, "group": "genre"}},
            {"id": "tag-tragedy", "type": "tag", "attributes": {"name": {"en": "Tragedy"}, "group": "genre"}},
            {"id": "tag-isekai", "type": "tag", "attributes": {"name": {"en": "Isekai"}, "group": "theme"}}
        ],
        "limit": 100,
        "offset": 0,
        "total": 4
    })
}

/// `GET /manga` payload with one entry per `(id, english title)`.
#[allow(dead_code)]
pub fn search_body(entries: &[(&str, &str)], offset: u32, total: u32) -> Value {
    let data: Vec<Value> = entries
        .iter()
        .map(|(id, title)| {
            json!({
                "id": id,
                "type": "manga",
                "attributes": {
                    "title": {"en": title},
                    "altTitles": [],
                    "description": {},
                    "status": "ongoing"
                },
                "relationships": []
            })
        })
        .collect();

    json!({
        "result": "ok",
        "response": "collection",
        "data": data,
        "limit": entries.len(),
        "offset": offset,
        "total": total
    })
}

/// Statistics entry whose distribution puts every vote in the `bucket` bucket.
#[allow(dead_code)]
pub fn stats_entry(average: Option<f64>, votes: u64, follows: u64) -> Value {
    let bucket = average.map(|a| a.round().clamp(1.0, 10.0) as u64).unwrap_or(10);
    let mut distribution = serde_json::Map::new();
    for i in 1..=10u64 {
        let count = if i == bucket { votes } else { 0 };
        distribution.insert(i.to_string(), json!(count));
    }

    json!({
        "comments": null,
        "rating": {
            "average": average,
            "bayesian": average.unwrap_or(0.0),
            "distribution": distribution
        },
        "follows": follows
    })
}

/// `GET /statistics/manga` payload from `(id, entry)` pairs.
#[allow(dead_code)]
pub fn statistics_body(entries: Vec<(&str, Value)>) -> Value {
    let statistics: serde_json::Map<String, Value> = entries
        .into_iter()
        .map(|(id, entry)| (id.to_string(), entry))
        .collect();
    json!({"result": "ok", "statistics": statistics})
}
