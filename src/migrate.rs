use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            query_term TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL,
            score INTEGER NOT NULL DEFAULT 0,
            source_url TEXT NOT NULL,
            retrieved_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER))
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_query_term ON posts(query_term)")
        .execute(&pool)
        .await?;

    pool.close().await;
    tracing::debug!(db = %config.db.path.display(), "schema ready");
    Ok(())
}
