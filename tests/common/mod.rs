#![allow(dead_code)]

//! Shared helpers: a throwaway search endpoint and server readiness checks.

use axum::{extract::Query, extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use post_analyzer::config::Config;

/// Query strings the fake endpoint received, in order.
pub type RequestLog = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[derive(Clone)]
struct EndpointState {
    per_query: usize,
    log: RequestLog,
}

/// Deterministic listing items for `query`: ids are `<query><n>`.
pub fn items_for(query: &str, total: usize) -> Vec<Value> {
    let prefix = query.replace(' ', "_");
    (0..total)
        .map(|i| {
            let id = format!("{}{}", prefix, i);
            let subreddit = if i % 2 == 0 { "rust" } else { "programming" };
            json!({
                "id": id,
                "name": format!("t3_{}", id),
                "title": format!("Post {} about\n{}", i, query),
                "selftext": format!("I really love {}.\n\nIt is great and  wonderful.", query),
                "subreddit": subreddit,
                "score": i * 10,
                "permalink": format!("/r/{}/comments/{}/", subreddit, id),
            })
        })
        .collect()
}

async fn handle_search(
    State(state): State<EndpointState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.log.lock().unwrap().push(params.clone());

    let query = params.get("q").cloned().unwrap_or_default();
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(25);
    let items = items_for(&query, state.per_query);

    let start = match params.get("after") {
        Some(after) => items
            .iter()
            .position(|item| item["name"] == after.as_str())
            .map(|p| p + 1)
            .unwrap_or(items.len()),
        None => 0,
    };

    let children: Vec<Value> = items
        .into_iter()
        .skip(start)
        .take(limit)
        .map(|data| json!({ "kind": "t3", "data": data }))
        .collect();

    Json(json!({ "kind": "Listing", "data": { "after": null, "children": children } }))
}

async fn handle_broken(State(state): State<EndpointState>) -> (StatusCode, &'static str) {
    state.log.lock().unwrap().push(HashMap::new());
    (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable")
}

/// Start a fake search endpoint serving `per_query` posts for any term.
///
/// `/search.json` pages through the items; `/broken.json` always fails.
/// Returns the bound port and the request log.
pub async fn spawn_search_endpoint(per_query: usize) -> (u16, RequestLog) {
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let state = EndpointState {
        per_query,
        log: log.clone(),
    };
    let app = Router::new()
        .route("/search.json", get(handle_search))
        .route("/broken.json", get(handle_broken))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (port, log)
}

/// Config pointing at a temp database and the fake endpoint, with no delays.
pub fn test_config(db_path: &Path, search_port: u16, bind_port: u16) -> Config {
    let content = format!(
        r#"[db]
path = "{}"

[source]
base_url = "http://127.0.0.1:{}/search.json"
page_delay_ms = 0
retry_delay_ms = 0
timeout_secs = 5

[analysis]
language = "english"

[server]
bind = "127.0.0.1:{}"
"#,
        db_path.display(),
        search_port,
        bind_port
    );
    toml::from_str(&content).unwrap()
}

pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}
