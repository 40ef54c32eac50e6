//! Ingestion pipeline orchestration.
//!
//! Drives paginated retrieval against a [`SearchSource`], normalizes every
//! item into a [`PostRecord`], and hands the completed batch to the storage
//! gateway in one call.
//!
//! # Fetch loop
//!
//! ```text
//! cursor = None
//! loop:
//!   limit = min(max_page_size, target - fetched)      limit == 0 → stop
//!   page  = source.fetch_page(query, relevance, limit, cursor)
//!     ok, empty      → stop (exhausted)
//!     ok, items      → normalize, append (stop mid-page at target),
//!                      cursor = last item's fullname, retries = 0,
//!                      sleep(page_delay) if more is needed
//!     err            → retries += 1; retries == max → stop
//!                      else sleep(retry_delay), same cursor again
//! ```
//!
//! None of the three terminal states is an error: the pipeline always
//! returns whatever it accumulated and relies on logging for diagnosis.
//! Requests are strictly sequential; delays are awaited on the running task.

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{Config, SourceConfig};
use crate::migrate;
use crate::models::PostRecord;
use crate::normalize::collapse_whitespace;
use crate::progress::{FetchProgressEvent, FetchProgressReporter, NoProgress, StopReason};
use crate::source::{PageRequest, RawPost, RedditSource, SearchSource, SORT_RELEVANCE};
use crate::store;

/// Fallback for identifier, title, and category when the source omits them.
pub const MISSING: &str = "N/A";

/// Pagination, pacing, and normalization settings for one fetch run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub max_page_size: usize,
    pub max_retries: u32,
    pub page_delay: Duration,
    pub retry_delay: Duration,
    pub site_origin: String,
}

impl FetchOptions {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            max_page_size: config.max_page_size,
            max_retries: config.max_retries,
            page_delay: config.page_delay(),
            retry_delay: config.retry_delay(),
            site_origin: config.site_origin.clone(),
        }
    }
}

/// Result of a fetch-and-store run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IngestOutcome {
    pub query: String,
    /// Posts returned by the source.
    pub fetched: usize,
    /// Posts newly persisted (duplicates excluded).
    pub inserted: u64,
}

/// Fetch up to `target` posts for `query`.
pub async fn fetch_posts(
    source: &dyn SearchSource,
    options: &FetchOptions,
    query: &str,
    target: usize,
) -> Vec<PostRecord> {
    fetch_posts_with_progress(source, options, query, target, &NoProgress).await
}

/// [`fetch_posts`] with a progress reporter.
pub async fn fetch_posts_with_progress(
    source: &dyn SearchSource,
    options: &FetchOptions,
    query: &str,
    target: usize,
    progress: &dyn FetchProgressReporter,
) -> Vec<PostRecord> {
    info!(query, target, "starting fetch");

    let mut posts: Vec<PostRecord> = Vec::with_capacity(target.min(1000));
    let mut cursor: Option<String> = None;
    let mut retries: u32 = 0;

    let reason = loop {
        let limit = options.max_page_size.min(target.saturating_sub(posts.len()));
        if limit == 0 {
            break StopReason::TargetReached;
        }

        let request = PageRequest {
            query: query.to_string(),
            sort: SORT_RELEVANCE,
            limit,
            after: cursor.clone(),
        };
        debug!(query, limit, after = ?request.after, attempt = retries + 1, "requesting page");

        match source.fetch_page(&request).await {
            Ok(page) => {
                retries = 0;
                if page.is_empty() {
                    info!(query, fetched = posts.len(), "no more results");
                    break StopReason::Exhausted;
                }

                match page.iter().rev().find_map(cursor_of) {
                    Some(next) => cursor = Some(next),
                    None => warn!(query, "page carries no identifiers, cursor not advanced"),
                }

                for raw in &page {
                    if posts.len() >= target {
                        break;
                    }
                    posts.push(normalize_post(raw, query, &options.site_origin));
                }

                progress.report(FetchProgressEvent::Page {
                    query: query.to_string(),
                    fetched: posts.len() as u64,
                    target: target as u64,
                });

                if posts.len() < target {
                    debug!(query, fetched = posts.len(), delay = ?options.page_delay, "pacing");
                    pause(options.page_delay).await;
                }
            }
            Err(e) => {
                retries += 1;
                warn!(query, attempt = retries, max = options.max_retries, error = %e, "page request failed");
                if retries >= options.max_retries {
                    error!(query, fetched = posts.len(), "giving up after {} failed attempts", retries);
                    break StopReason::RetriesExhausted;
                }
                progress.report(FetchProgressEvent::Retrying {
                    query: query.to_string(),
                    attempt: retries,
                    max: options.max_retries,
                });
                pause(options.retry_delay).await;
            }
        }
    };

    progress.report(FetchProgressEvent::Finished {
        query: query.to_string(),
        fetched: posts.len() as u64,
        reason,
    });
    info!(query, fetched = posts.len(), reason = reason.as_str(), "fetch finished");

    posts
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Cursor token for the item: its fullname, or its bare id if absent.
fn cursor_of(raw: &RawPost) -> Option<String> {
    raw.name.clone().or_else(|| raw.id.clone())
}

/// Turn a raw listing item into a [`PostRecord`] for `query`.
pub fn normalize_post(raw: &RawPost, query: &str, site_origin: &str) -> PostRecord {
    PostRecord {
        id: raw.id.clone().unwrap_or_else(|| MISSING.to_string()),
        query_term: query.to_string(),
        title: collapse_whitespace(raw.title.as_deref().unwrap_or(MISSING)),
        body: collapse_whitespace(raw.selftext.as_deref().unwrap_or("")),
        category: raw.subreddit.clone().unwrap_or_else(|| MISSING.to_string()),
        score: coerce_score(raw.score.as_ref()),
        source_url: format!("{}{}", site_origin, raw.permalink.as_deref().unwrap_or("")),
        retrieved_at: None,
    }
}

/// Integer view of a popularity value; anything unusable becomes 0.
fn coerce_score(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Fetch posts for `query` and store them under that term.
///
/// Never fails: source problems shrink `fetched`, storage problems zero
/// `inserted`, and both are logged.
pub async fn ingest(
    config: &Config,
    source: &dyn SearchSource,
    query: &str,
    target: usize,
    progress: &dyn FetchProgressReporter,
) -> IngestOutcome {
    if let Err(e) = migrate::run_migrations(config).await {
        error!(error = %e, "could not prepare the posts table");
    }

    let options = FetchOptions::from_config(&config.source);
    let posts = fetch_posts_with_progress(source, &options, query, target, progress).await;

    let inserted = if posts.is_empty() {
        info!(query, "nothing fetched, nothing to store");
        0
    } else {
        store::insert_batch(config, &posts, query).await
    };

    IngestOutcome {
        query: query.to_string(),
        fetched: posts.len(),
        inserted,
    }
}

/// CLI entry point for `post-analyzer fetch`.
pub async fn run_fetch(
    config: &Config,
    query: &str,
    count: usize,
    progress: &dyn FetchProgressReporter,
) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        bail!("query must not be empty");
    }
    if count == 0 {
        bail!("--count must be >= 1");
    }

    let source = RedditSource::new(&config.source)?;
    let outcome = ingest(config, &source, query, count, progress).await;

    println!("fetch '{}'", outcome.query);
    println!("  requested: {} posts", count);
    println!("  fetched: {} posts", outcome.fetched);
    println!("  inserted: {} new posts", outcome.inserted);
    println!("ok");

    Ok(())
}
