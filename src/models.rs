//! Core data models used throughout the analyzer.
//!
//! These types represent the posts that flow from the search source through
//! the ingestion pipeline into SQLite, and back out to the analytics layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized post, as produced by the ingestion pipeline and as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Identifier assigned by the source. Primary key and dedup key.
    pub id: String,
    /// The search term that first produced this post.
    pub query_term: String,
    pub title: String,
    pub body: String,
    /// Community label the post belongs to (e.g. a subreddit name).
    pub category: String,
    pub score: i64,
    pub source_url: String,
    /// Set by the database on insert; `None` for freshly fetched posts.
    pub retrieved_at: Option<DateTime<Utc>>,
}

impl PostRecord {
    /// Title and body joined for text analysis.
    pub fn full_text(&self) -> String {
        match (self.title.is_empty(), self.body.is_empty()) {
            (false, false) => format!("{} {}", self.title, self.body),
            (false, true) => self.title.clone(),
            (true, _) => self.body.clone(),
        }
    }
}
