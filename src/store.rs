//! Storage gateway for the `posts` table.
//!
//! Every operation opens its own connection, performs one logical read or
//! write, and closes it. Errors never cross this boundary: they are logged
//! and reported as an empty result, zero, or `None`, so callers (the CLI and
//! the dashboard) keep working when the database misbehaves.
//!
//! Deduplication is explicit. Inside the batch transaction each record's id
//! is looked up first and skipped when present; an insert that still trips
//! the primary key (another writer got there first) is caught and skipped
//! too. The first stored copy of a post always wins.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::db;
use crate::models::PostRecord;

const SELECT_COLUMNS: &str =
    "SELECT id, query_term, title, body, category, score, source_url, retrieved_at FROM posts";

/// Store `records` under `query_term` in a single transaction.
///
/// Returns how many records were newly persisted. Records whose id is
/// already stored (under any query term, or earlier in the same batch) are
/// skipped. Any storage failure rolls the batch back and yields 0.
pub async fn insert_batch(config: &Config, records: &[PostRecord], query_term: &str) -> u64 {
    if records.is_empty() {
        info!(query_term, "no posts to insert");
        return 0;
    }

    match with_pool(config, |pool| try_insert_batch(pool, records, query_term)).await {
        Ok(inserted) => {
            info!(
                query_term,
                inserted,
                skipped = records.len() as u64 - inserted,
                "stored post batch"
            );
            inserted
        }
        Err(e) => {
            error!(query_term, error = %e, "batch insert failed");
            0
        }
    }
}

/// All stored posts in insertion order.
pub async fn read_all(config: &Config) -> Vec<PostRecord> {
    try_read_all(config).await.unwrap_or_else(|e| {
        error!(error = %e, "failed to read posts");
        Vec::new()
    })
}

/// Posts stored under `query_term`, in insertion order.
pub async fn read_by_query(config: &Config, query_term: &str) -> Vec<PostRecord> {
    try_read_by_query(config, query_term)
        .await
        .unwrap_or_else(|e| {
            error!(query_term, error = %e, "failed to read posts for query");
            Vec::new()
        })
}

/// [`read_all`] that reports storage failures instead of degrading.
///
/// For callers that must tell "no posts" apart from "could not read", such
/// as the dashboard cache.
pub async fn try_read_all(config: &Config) -> Result<Vec<PostRecord>> {
    let posts = with_pool(config, |pool| async move {
        let rows = sqlx::query(&format!("{} ORDER BY rowid", SELECT_COLUMNS))
            .fetch_all(&pool)
            .await?;
        Ok(rows.iter().map(row_to_post).collect::<Vec<_>>())
    })
    .await?;
    debug!(count = posts.len(), "read all posts");
    Ok(posts)
}

/// [`read_by_query`] that reports storage failures instead of degrading.
pub async fn try_read_by_query(config: &Config, query_term: &str) -> Result<Vec<PostRecord>> {
    let term = query_term.to_string();
    let posts = with_pool(config, |pool| async move {
        let rows = sqlx::query(&format!(
            "{} WHERE query_term = ? ORDER BY rowid",
            SELECT_COLUMNS
        ))
        .bind(&term)
        .fetch_all(&pool)
        .await?;
        Ok(rows.iter().map(row_to_post).collect::<Vec<_>>())
    })
    .await?;
    debug!(query_term, count = posts.len(), "read posts for query");
    Ok(posts)
}

/// One post by id.
pub async fn get_post(config: &Config, id: &str) -> Option<PostRecord> {
    let id_owned = id.to_string();
    let result = with_pool(config, |pool| async move {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(&id_owned)
            .fetch_optional(&pool)
            .await?;
        Ok(row.as_ref().map(row_to_post))
    })
    .await;

    result.unwrap_or_else(|e| {
        error!(id, error = %e, "failed to read post");
        None
    })
}

/// Distinct stored query terms, sorted.
pub async fn distinct_query_terms(config: &Config) -> Vec<String> {
    let result = with_pool(config, |pool| async move {
        let terms: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT query_term FROM posts ORDER BY query_term")
                .fetch_all(&pool)
                .await?;
        Ok(terms)
    })
    .await;

    result.unwrap_or_else(|e| {
        error!(error = %e, "failed to list query terms");
        Vec::new()
    })
}

/// Total number of stored posts.
pub async fn count_posts(config: &Config) -> i64 {
    let result = with_pool(config, |pool| async move {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&pool)
            .await?;
        Ok(count)
    })
    .await;

    result.unwrap_or_else(|e| {
        error!(error = %e, "failed to count posts");
        0
    })
}

/// Open a connection, run `op` on it, and close it whatever the outcome.
async fn with_pool<T, F, Fut>(config: &Config, op: F) -> Result<T>
where
    F: FnOnce(SqlitePool) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let pool = db::connect(config).await?;
    let result = op(pool.clone()).await;
    pool.close().await;
    result
}

async fn try_insert_batch(pool: SqlitePool, records: &[PostRecord], query_term: &str) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for record in records {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM posts WHERE id = ?")
            .bind(&record.id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_some() {
            debug!(id = %record.id, "post already stored, skipping");
            continue;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO posts (id, query_term, title, body, category, score, source_url)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(query_term)
        .bind(&record.title)
        .bind(&record.body)
        .bind(&record.category)
        .bind(record.score)
        .bind(&record.source_url)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => inserted += 1,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(id = %record.id, "post stored concurrently, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

fn row_to_post(row: &SqliteRow) -> PostRecord {
    let retrieved_at: i64 = row.get("retrieved_at");
    PostRecord {
        id: row.get("id"),
        query_term: row.get("query_term"),
        title: row.get("title"),
        body: row.get("body"),
        category: row.get("category"),
        score: row.get("score"),
        source_url: row.get("source_url"),
        retrieved_at: DateTime::<Utc>::from_timestamp(retrieved_at, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use tempfile::TempDir;

    fn post(id: &str, query_term: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            query_term: query_term.to_string(),
            title: format!("Title {}", id),
            body: "some body".to_string(),
            category: "rust".to_string(),
            score: 3,
            source_url: format!("https://www.reddit.com/r/rust/comments/{}/", id),
            retrieved_at: None,
        }
    }

    async fn setup() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        let config = Config::with_db_path(tmp.path().join("posts.sqlite"));
        migrate::run_migrations(&config).await.unwrap();
        (tmp, config)
    }

    #[tokio::test]
    async fn test_insert_twice_is_idempotent() {
        let (_tmp, config) = setup().await;
        let batch = vec![post("a", "test"), post("b", "test"), post("c", "test")];

        assert_eq!(insert_batch(&config, &batch, "test").await, 3);
        assert_eq!(insert_batch(&config, &batch, "test").await, 0);
        assert_eq!(count_posts(&config).await, 3);
    }

    #[tokio::test]
    async fn test_dedup_across_queries_keeps_first_term() {
        let (_tmp, config) = setup().await;

        assert_eq!(insert_batch(&config, &[post("x", "A")], "A").await, 1);
        assert_eq!(
            insert_batch(&config, &[post("x", "B"), post("y", "B")], "B").await,
            1
        );

        let all = read_all(&config).await;
        assert_eq!(all.iter().filter(|p| p.id == "x").count(), 1);
        assert_eq!(get_post(&config, "x").await.unwrap().query_term, "A");
        assert_eq!(read_by_query(&config, "B").await.len(), 1);
        assert_eq!(distinct_query_terms(&config).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_duplicate_inside_one_batch_counted_once() {
        let (_tmp, config) = setup().await;
        let batch = vec![post("a", "q"), post("a", "q"), post("b", "q")];

        assert_eq!(insert_batch(&config, &batch, "q").await, 2);
        assert_eq!(count_posts(&config).await, 2);
    }

    #[tokio::test]
    async fn test_query_term_argument_is_stored() {
        let (_tmp, config) = setup().await;
        insert_batch(&config, &[post("a", "ignored")], "chosen").await;

        let stored = get_post(&config, "a").await.unwrap();
        assert_eq!(stored.query_term, "chosen");
        assert!(stored.retrieved_at.is_some());
    }

    #[tokio::test]
    async fn test_read_preserves_insertion_order() {
        let (_tmp, config) = setup().await;
        let batch = vec![post("z", "q"), post("m", "q"), post("a", "q")];
        insert_batch(&config, &batch, "q").await;

        let ids: Vec<String> = read_by_query(&config, "q")
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["z", "m", "a"]);
    }

    #[tokio::test]
    async fn test_missing_table_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();
        let config = Config::with_db_path(tmp.path().join("fresh.sqlite"));

        assert_eq!(insert_batch(&config, &[post("a", "q")], "q").await, 0);
        assert!(read_all(&config).await.is_empty());
        assert!(read_by_query(&config, "q").await.is_empty());
        assert!(distinct_query_terms(&config).await.is_empty());
        assert!(get_post(&config, "a").await.is_none());
        assert_eq!(count_posts(&config).await, 0);
    }

    #[tokio::test]
    async fn test_unopenable_database_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();
        // A directory where the database file should be.
        let bogus = tmp.path().join("not-a-file");
        std::fs::create_dir_all(&bogus).unwrap();
        let config = Config::with_db_path(&bogus);

        assert_eq!(insert_batch(&config, &[post("a", "q")], "q").await, 0);
        assert!(read_all(&config).await.is_empty());
        assert!(try_read_all(&config).await.is_err());
        assert!(try_read_by_query(&config, "q").await.is_err());
    }

    #[tokio::test]
    async fn test_try_reads_distinguish_empty_from_failure() {
        let (_tmp, config) = setup().await;
        assert!(try_read_all(&config).await.unwrap().is_empty());

        insert_batch(&config, &[post("a", "q")], "q").await;
        assert_eq!(try_read_by_query(&config, "q").await.unwrap().len(), 1);
        assert!(try_read_by_query(&config, "other").await.unwrap().is_empty());
    }
}
