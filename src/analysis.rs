//! Descriptive analytics over a set of stored posts.
//!
//! Used by `post-analyzer analyze` and by the dashboard's `/api/analysis`
//! endpoint. Every function tolerates an empty input and returns empty
//! aggregates for it.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

use crate::cache::Selection;
use crate::config::Config;
use crate::keywords::KeywordExtractor;
use crate::models::PostRecord;
use crate::sentiment::{SentimentAnalyzer, SentimentLabel};
use crate::store;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: SentimentLabel,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: String,
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub term: String,
    pub weight: f64,
}

/// Everything the dashboard shows for one selection of posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub selection: String,
    pub total_posts: usize,
    pub average_sentiment: f64,
    pub sentiment_distribution: Vec<LabelCount>,
    pub category_distribution: Vec<CategoryCount>,
    pub average_score_per_category: Vec<CategoryScore>,
    pub scores: Vec<i64>,
    pub keywords: Vec<Keyword>,
}

/// Label counts, most frequent first; labels with no posts are omitted.
pub fn sentiment_distribution(labels: &[SentimentLabel]) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = SentimentLabel::ALL
        .iter()
        .map(|label| LabelCount {
            label: *label,
            count: labels.iter().filter(|l| *l == label).count(),
        })
        .filter(|lc| lc.count > 0)
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.label.cmp(&b.label)));
    counts
}

/// Posts per category, most frequent first.
pub fn category_distribution(posts: &[PostRecord]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        *counts.entry(post.category.as_str()).or_default() += 1;
    }
    let mut result: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    result
}

/// Mean score per category, highest first.
pub fn average_score_per_category(posts: &[PostRecord]) -> Vec<CategoryScore> {
    let mut sums: HashMap<&str, (i64, usize)> = HashMap::new();
    for post in posts {
        let entry = sums.entry(post.category.as_str()).or_default();
        entry.0 += post.score;
        entry.1 += 1;
    }
    let mut result: Vec<CategoryScore> = sums
        .into_iter()
        .map(|(category, (sum, n))| CategoryScore {
            category: category.to_string(),
            average_score: sum as f64 / n as f64,
        })
        .collect();
    result.sort_by(|a, b| {
        b.average_score
            .total_cmp(&a.average_score)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

/// Score every post on its title and body, and aggregate.
pub fn analyze_posts(
    selection: &Selection,
    posts: &[PostRecord],
    sentiment: &SentimentAnalyzer,
    keywords: &KeywordExtractor,
    top_keywords: usize,
) -> AnalysisReport {
    let scored: Vec<_> = posts
        .iter()
        .map(|post| sentiment.score(&post.full_text()))
        .collect();
    let labels: Vec<SentimentLabel> = scored.iter().map(|s| s.label).collect();
    let average_sentiment = if scored.is_empty() {
        0.0
    } else {
        scored.iter().map(|s| s.compound).sum::<f64>() / scored.len() as f64
    };

    let bodies: Vec<&str> = posts.iter().map(|p| p.body.as_str()).collect();
    let keywords = keywords
        .top_keywords(&bodies, top_keywords)
        .into_iter()
        .map(|(term, weight)| Keyword { term, weight })
        .collect();

    tracing::debug!(selection = selection.label(), posts = posts.len(), "analysis computed");

    AnalysisReport {
        selection: selection.label().to_string(),
        total_posts: posts.len(),
        average_sentiment,
        sentiment_distribution: sentiment_distribution(&labels),
        category_distribution: category_distribution(posts),
        average_score_per_category: average_score_per_category(posts),
        scores: posts.iter().map(|p| p.score).collect(),
        keywords,
    }
}

/// Posts for a selection, read through the storage gateway.
pub async fn load_posts(config: &Config, selection: &Selection) -> Vec<PostRecord> {
    match selection {
        Selection::All => store::read_all(config).await,
        Selection::Query(term) => store::read_by_query(config, term).await,
    }
}

/// [`load_posts`] that reports storage failures instead of degrading.
pub async fn try_load_posts(config: &Config, selection: &Selection) -> Result<Vec<PostRecord>> {
    match selection {
        Selection::All => store::try_read_all(config).await,
        Selection::Query(term) => store::try_read_by_query(config, term).await,
    }
}

/// CLI entry point for `post-analyzer analyze`.
pub async fn run_analyze(config: &Config, query: Option<&str>) -> Result<()> {
    let selection = Selection::from_param(query);
    let posts = load_posts(config, &selection).await;

    if posts.is_empty() {
        println!("No posts stored for '{}'.", selection.label());
        return Ok(());
    }

    let sentiment = SentimentAnalyzer::new(&config.analysis);
    let keywords = KeywordExtractor::new(&config.analysis);
    let report = analyze_posts(
        &selection,
        &posts,
        &sentiment,
        &keywords,
        config.analysis.top_keywords,
    );

    println!("Analysis: {}", report.selection);
    println!("================================");
    println!();
    println!("  Posts:              {}", report.total_posts);
    println!("  Average sentiment:  {:+.3}", report.average_sentiment);
    println!();
    println!("  Sentiment:");
    for lc in &report.sentiment_distribution {
        println!("    {:<10} {:>6}", lc.label.as_str(), lc.count);
    }
    println!();
    println!("  {:<28} {:>6} {:>10}", "CATEGORY", "POSTS", "AVG SCORE");
    println!("  {}", "-".repeat(46));
    for cc in report.category_distribution.iter().take(10) {
        let avg = report
            .average_score_per_category
            .iter()
            .find(|cs| cs.category == cc.category)
            .map(|cs| cs.average_score)
            .unwrap_or(0.0);
        println!("  {:<28} {:>6} {:>10.1}", cc.category, cc.count, avg);
    }
    if !report.keywords.is_empty() {
        println!();
        println!("  Keywords:");
        for kw in &report.keywords {
            println!("    {:<28} {:.3}", kw.term, kw.weight);
        }
    }
    println!();

    Ok(())
}
