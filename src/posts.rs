//! Listing and inspecting stored posts from the command line.
//!
//! Backs `post-analyzer posts` and `post-analyzer show`.

use anyhow::{bail, Result};

use crate::analysis;
use crate::cache::Selection;
use crate::config::Config;
use crate::models::PostRecord;
use crate::store;

const TITLE_WIDTH: usize = 60;

/// Print stored posts for a selection as a table, oldest first.
pub async fn run_posts(config: &Config, query: Option<&str>, limit: Option<usize>) -> Result<()> {
    let selection = Selection::from_param(query);
    let posts = analysis::load_posts(config, &selection).await;

    if posts.is_empty() {
        println!("No posts stored for '{}'.", selection.label());
        return Ok(());
    }

    let shown = limit.unwrap_or(posts.len()).min(posts.len());
    println!(
        "{:<10} {:<20} {:>6}  {}",
        "ID", "CATEGORY", "SCORE", "TITLE"
    );
    println!("{}", "-".repeat(40 + TITLE_WIDTH));
    for post in posts.iter().take(shown) {
        println!(
            "{:<10} {:<20} {:>6}  {}",
            post.id,
            truncate(&post.category, 20),
            post.score,
            truncate(&post.title, TITLE_WIDTH)
        );
    }
    println!();
    println!("{} of {} posts ({})", shown, posts.len(), selection.label());

    Ok(())
}

/// Print one stored post in full.
pub async fn run_show(config: &Config, id: &str) -> Result<()> {
    let post = match store::get_post(config, id).await {
        Some(p) => p,
        None => bail!("post not found: {}", id),
    };
    print_post(&post);
    Ok(())
}

fn print_post(post: &PostRecord) {
    println!("--- Post ---");
    println!("id:           {}", post.id);
    println!("title:        {}", post.title);
    println!("category:     {}", post.category);
    println!("score:        {}", post.score);
    println!("query_term:   {}", post.query_term);
    println!("source_url:   {}", post.source_url);
    if let Some(ts) = post.retrieved_at {
        println!("retrieved_at: {}", ts.format("%Y-%m-%dT%H:%M:%SZ"));
    }
    println!();

    println!("--- Body ---");
    if post.body.is_empty() {
        println!("(no body)");
    } else {
        println!("{}", post.body);
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("àèìòùàèìòù", 6), "àèì...");
    }
}
