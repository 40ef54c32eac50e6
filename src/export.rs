//! Export stored posts as JSON.
//!
//! Writes the posts for a selection (one search term or everything) with a
//! small header, for use in notebooks or other tools.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::analysis;
use crate::cache::Selection;
use crate::config::Config;
use crate::models::PostRecord;

#[derive(Serialize)]
struct ExportData {
    exported_at: DateTime<Utc>,
    selection: String,
    count: usize,
    posts: Vec<PostRecord>,
}

/// Export posts as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>, query: Option<&str>) -> Result<()> {
    let selection = Selection::from_param(query);
    let posts = analysis::load_posts(config, &selection).await;

    let data = ExportData {
        exported_at: Utc::now(),
        selection: selection.label().to_string(),
        count: posts.len(),
        posts,
    };
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} posts ({}) to {}",
                data.count,
                data.selection,
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
