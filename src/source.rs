//! Search source abstraction and the HTTP implementation.
//!
//! The ingestion pipeline talks to a [`SearchSource`], one page at a time.
//! [`RedditSource`] calls the public `search.json` endpoint; tests plug in
//! scripted sources.
//!
//! # Wire format
//!
//! ```text
//! GET {base_url}?q=<query>&sort=relevance&limit=<n>[&after=<cursor>]
//! User-Agent: <configured>
//!
//! { "data": { "children": [ { "kind": "t3", "data": { "id": ..., "name": ..., ... } } ] } }
//! ```
//!
//! Any failure (connection error, timeout, non-2xx status, body that is not a
//! listing envelope) is returned as an error; the pipeline decides whether to
//! retry.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::SourceConfig;

/// Result ordering requested from the source.
pub const SORT_RELEVANCE: &str = "relevance";

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub query: String,
    pub sort: &'static str,
    pub limit: usize,
    /// Opaque cursor: fully-qualified identifier of the last item already seen.
    pub after: Option<String>,
}

/// One item of a listing page, exactly as the source sent it.
///
/// Every field is optional; normalization fills in fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPost {
    pub id: Option<String>,
    /// Fully-qualified identifier (`t3_<id>`), used as the pagination cursor.
    pub name: Option<String>,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub subreddit: Option<String>,
    pub score: Option<serde_json::Value>,
    pub permalink: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    #[serde(default)]
    data: Option<RawPost>,
}

/// Parse a listing envelope into the posts it wraps.
///
/// Children without a nested `data` object are dropped.
pub fn parse_listing(body: &str) -> Result<Vec<RawPost>> {
    let listing: Listing =
        serde_json::from_str(body).context("Response is not a listing envelope")?;
    Ok(listing
        .data
        .children
        .into_iter()
        .filter_map(|child| child.data)
        .collect())
}

/// A paginated search endpoint.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Fetch a single page of results.
    ///
    /// An empty vector means the source has nothing more for this query.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<RawPost>>;
}

/// [`SearchSource`] backed by the public Reddit search endpoint.
pub struct RedditSource {
    client: reqwest::Client,
    base_url: String,
}

impl RedditSource {
    /// Build the HTTP client with the configured user agent and timeout.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl SearchSource for RedditSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<RawPost>> {
        let limit = request.limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", request.query.as_str()),
            ("sort", request.sort),
            ("limit", limit.as_str()),
        ];
        if let Some(ref after) = request.after {
            params.push(("after", after.as_str()));
        }

        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Search request to {} failed", self.base_url))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Search endpoint returned HTTP {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        let body = resp.text().await.context("Failed to read search response")?;
        parse_listing(&body)
    }
}
