//! Database statistics and health overview.
//!
//! Summarizes what has been collected: total posts, per-term counts and when
//! each term was last fetched. Used by `post-analyzer stats`.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-term breakdown of stored posts.
struct QueryStats {
    query_term: String,
    post_count: i64,
    category_count: i64,
    last_retrieved_ts: Option<i64>,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&pool)
        .await?;

    let total_categories: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT category) FROM posts")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Post Analyzer Database Stats");
    println!("================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Posts:       {}", total_posts);
    println!("  Categories:  {}", total_categories);

    let rows = sqlx::query(
        r#"
        SELECT
            query_term,
            COUNT(*) AS post_count,
            COUNT(DISTINCT category) AS category_count,
            MAX(retrieved_at) AS last_retrieved
        FROM posts
        GROUP BY query_term
        ORDER BY post_count DESC, query_term
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let query_stats: Vec<QueryStats> = rows
        .iter()
        .map(|row| QueryStats {
            query_term: row.get("query_term"),
            post_count: row.get("post_count"),
            category_count: row.get("category_count"),
            last_retrieved_ts: row.get("last_retrieved"),
        })
        .collect();

    if !query_stats.is_empty() {
        println!();
        println!("  By search term:");
        println!(
            "  {:<28} {:>6} {:>11}   {}",
            "TERM", "POSTS", "CATEGORIES", "LAST FETCH"
        );
        println!("  {}", "-".repeat(68));

        for q in &query_stats {
            let fetch_display = match q.last_retrieved_ts {
                Some(ts) => format_ts_relative(ts),
                None => "never".to_string(),
            };
            println!(
                "  {:<28} {:>6} {:>11}   {}",
                q.query_term, q.post_count, q.category_count, fetch_display
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_format_ts_relative() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 7200), "2 hours ago");
        assert_eq!(format_ts_relative(now - 86400), "1 day ago");
        assert_eq!(format_ts_relative(0), "1970-01-01 00:00");
    }
}
