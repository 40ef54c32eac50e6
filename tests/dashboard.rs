//! Dashboard API over real HTTP.

mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use common::{find_free_port, spawn_search_endpoint, test_config, wait_for_server};
use post_analyzer::server::run_server_with_source;
use post_analyzer::source::RedditSource;

/// Start the dashboard against a fake search endpoint; returns its base URL.
async fn start_dashboard(tmp: &TempDir, per_query: usize) -> String {
    let (search_port, _log) = spawn_search_endpoint(per_query).await;
    let port = find_free_port();
    let cfg = test_config(&tmp.path().join("posts.sqlite"), search_port, port);
    let source = Arc::new(RedditSource::new(&cfg.source).unwrap());

    tokio::spawn(async move {
        run_server_with_source(&cfg, source).await.ok();
    });
    wait_for_server(port).await;

    format!("http://127.0.0.1:{}", port)
}

async fn fetch(client: &reqwest::Client, base: &str, query: &str, count: usize) -> reqwest::Response {
    client
        .post(format!("{}/api/fetch", base))
        .json(&json!({ "query": query, "count": count }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_and_page() {
    let tmp = TempDir::new().unwrap();
    let base = start_dashboard(&tmp, 5).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    let page = client.get(&base).send().await.unwrap();
    assert_eq!(page.status(), 200);
    let html = page.text().await.unwrap();
    assert!(html.contains("vega-embed"));
}

#[tokio::test]
async fn test_fetch_rejects_bad_input() {
    let tmp = TempDir::new().unwrap();
    let base = start_dashboard(&tmp, 5).await;
    let client = reqwest::Client::new();

    let resp = fetch(&client, &base, "   ", 50).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = fetch(&client, &base, "rust", 4).await;
    assert_eq!(resp.status(), 400);

    let resp = fetch(&client, &base, "rust", 501).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_fetch_then_browse_and_analyse() {
    let tmp = TempDir::new().unwrap();
    let base = start_dashboard(&tmp, 6).await;
    let client = reqwest::Client::new();

    let queries: Value = client
        .get(format!("{}/api/queries", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(queries["queries"], json!([]));

    let resp = fetch(&client, &base, "rust", 5).await;
    assert_eq!(resp.status(), 200);
    let outcome: Value = resp.json().await.unwrap();
    assert_eq!(outcome["query"], "rust");
    assert_eq!(outcome["fetched"], 5);
    assert_eq!(outcome["inserted"], 5);

    let queries: Value = client
        .get(format!("{}/api/queries", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(queries["queries"], json!(["rust"]));

    let posts: Value = client
        .get(format!("{}/api/posts?query=rust", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posts["selection"], "rust");
    assert_eq!(posts["posts"].as_array().unwrap().len(), 5);
    assert_eq!(posts["posts"][0]["id"], "rust0");

    let report: Value = client
        .get(format!("{}/api/analysis?query=rust", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["total_posts"], 5);
    assert_eq!(report["scores"], json!([0, 10, 20, 30, 40]));
    assert_eq!(report["category_distribution"][0]["category"], "rust");
    assert_eq!(report["category_distribution"][0]["count"], 3);
    assert!(report["charts"]["sentiment"]["data"]["values"].is_array());
    assert_eq!(
        report["charts"]["score_histogram"]["data"]["values"]
            .as_array()
            .unwrap()
            .len(),
        5
    );
}

#[tokio::test]
async fn test_fetch_invalidates_cached_analysis() {
    let tmp = TempDir::new().unwrap();
    let base = start_dashboard(&tmp, 5).await;
    let client = reqwest::Client::new();

    assert_eq!(fetch(&client, &base, "rust", 5).await.status(), 200);

    let before: Value = client
        .get(format!("{}/api/analysis", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["selection"], "all posts");
    assert_eq!(before["total_posts"], 5);

    let outcome: Value = fetch(&client, &base, "golang", 5).await.json().await.unwrap();
    assert_eq!(outcome["inserted"], 5);

    let after: Value = client
        .get(format!("{}/api/analysis", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["total_posts"], 10);

    let posts: Value = client
        .get(format!("{}/api/posts?query=", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posts["posts"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_analysis_of_empty_selection() {
    let tmp = TempDir::new().unwrap();
    let base = start_dashboard(&tmp, 5).await;
    let client = reqwest::Client::new();

    let report: Value = client
        .get(format!("{}/api/analysis?query=nothing-here", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["total_posts"], 0);
    assert_eq!(report["keywords"], json!([]));
    assert_eq!(report["average_sentiment"], 0.0);
}

#[tokio::test]
async fn test_malformed_fetch_body_uses_error_contract() {
    let tmp = TempDir::new().unwrap();
    let base = start_dashboard(&tmp, 5).await;
    let client = reqwest::Client::new();

    let bodies = [
        json!({ "query": "rust", "count": -5 }),
        json!({ "count": 50 }),
        json!({ "query": "rust", "count": "many" }),
    ];
    for body in bodies {
        let resp = client
            .post(format!("{}/api/fetch", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body {}", body);
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["error"]["code"], "bad_request", "body {}", body);
        assert!(err["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    let resp = client
        .post(format!("{}/api/fetch", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "bad_request");
}

/// Move the database and its WAL side files out of the way, or back.
fn swap_database_files(dir: &std::path::Path, from_suffix: &str, to_suffix: &str) {
    for side in ["", "-wal", "-shm"] {
        let from = dir.join(format!("posts.sqlite{}{}", side, from_suffix));
        if from.exists() {
            std::fs::rename(&from, dir.join(format!("posts.sqlite{}{}", side, to_suffix))).unwrap();
        }
    }
}

#[tokio::test]
async fn test_unreadable_storage_is_not_cached() {
    let tmp = TempDir::new().unwrap();
    let base = start_dashboard(&tmp, 5).await;
    let client = reqwest::Client::new();

    assert_eq!(fetch(&client, &base, "rust", 5).await.status(), 200);

    // A directory where the database file should be makes every open fail.
    swap_database_files(tmp.path(), "", ".saved");
    let db_path = tmp.path().join("posts.sqlite");
    std::fs::create_dir(&db_path).unwrap();

    let posts: Value = client
        .get(format!("{}/api/posts", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posts["posts"], json!([]));

    let report: Value = client
        .get(format!("{}/api/analysis", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["total_posts"], 0);

    std::fs::remove_dir(&db_path).unwrap();
    swap_database_files(tmp.path(), ".saved", "");

    let posts: Value = client
        .get(format!("{}/api/posts", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posts["posts"].as_array().unwrap().len(), 5);

    let report: Value = client
        .get(format!("{}/api/analysis", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["total_posts"], 5);
}
