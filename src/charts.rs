//! Vega-Lite chart specs for the dashboard.
//!
//! Each function takes an aggregate table from [`crate::analysis`] and returns
//! a self-contained spec with inline data. The browser draws them with
//! vega-embed; nothing here renders pixels.

use serde::Serialize;
use serde_json::{json, Value};

use crate::analysis::{AnalysisReport, CategoryCount, CategoryScore, LabelCount};
use crate::sentiment::SentimentLabel;

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
const TOP_CATEGORIES: usize = 10;
const HISTOGRAM_BINS: u32 = 30;

/// Pastel colour for a sentiment label.
pub fn label_colour(label: SentimentLabel) -> &'static str {
    match label {
        SentimentLabel::Positive => "#A8D8B9",
        SentimentLabel::Negative => "#F8BBD0",
        SentimentLabel::Neutral => "#E0E0E0",
    }
}

/// Every chart the dashboard shows for one report.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSet {
    pub sentiment: Value,
    pub categories: Value,
    pub category_scores: Value,
    pub score_histogram: Value,
}

impl ChartSet {
    pub fn from_report(report: &AnalysisReport) -> Self {
        Self {
            sentiment: sentiment_chart(&report.sentiment_distribution),
            categories: category_chart(&report.category_distribution),
            category_scores: category_score_chart(&report.average_score_per_category),
            score_histogram: score_histogram(&report.scores),
        }
    }
}

/// Horizontal bar of label counts, one pastel colour per label.
pub fn sentiment_chart(distribution: &[LabelCount]) -> Value {
    let values: Vec<Value> = distribution
        .iter()
        .map(|lc| json!({ "sentiment": lc.label.as_str(), "count": lc.count }))
        .collect();
    let domain: Vec<&str> = SentimentLabel::ALL.iter().map(|l| l.as_str()).collect();
    let range: Vec<&str> = SentimentLabel::ALL.iter().map(|l| label_colour(*l)).collect();

    json!({
        "$schema": SCHEMA,
        "title": "Sentiment distribution",
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "y": { "field": "sentiment", "type": "nominal", "sort": "-x", "title": null },
            "x": { "field": "count", "type": "quantitative", "title": "Posts" },
            "color": {
                "field": "sentiment",
                "type": "nominal",
                "scale": { "domain": domain, "range": range },
                "legend": null
            }
        }
    })
}

/// Top categories by post count.
pub fn category_chart(distribution: &[CategoryCount]) -> Value {
    let values: Vec<Value> = distribution
        .iter()
        .take(TOP_CATEGORIES)
        .map(|cc| json!({ "category": cc.category, "count": cc.count }))
        .collect();

    json!({
        "$schema": SCHEMA,
        "title": "Top categories",
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": { "field": "category", "type": "nominal", "sort": "-y", "title": null },
            "y": { "field": "count", "type": "quantitative", "title": "Posts" }
        }
    })
}

/// Top categories by average score.
pub fn category_score_chart(averages: &[CategoryScore]) -> Value {
    let values: Vec<Value> = averages
        .iter()
        .take(TOP_CATEGORIES)
        .map(|cs| json!({ "category": cs.category, "average_score": cs.average_score }))
        .collect();

    json!({
        "$schema": SCHEMA,
        "title": "Average score per category",
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": { "field": "category", "type": "nominal", "sort": "-y", "title": null },
            "y": { "field": "average_score", "type": "quantitative", "title": "Average score" }
        }
    })
}

pub fn score_histogram(scores: &[i64]) -> Value {
    let values: Vec<Value> = scores.iter().map(|s| json!({ "score": s })).collect();

    json!({
        "$schema": SCHEMA,
        "title": "Score distribution",
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": {
                "field": "score",
                "type": "quantitative",
                "bin": { "maxbins": HISTOGRAM_BINS },
                "title": "Score"
            },
            "y": { "aggregate": "count", "type": "quantitative", "title": "Posts" }
        }
    })
}
