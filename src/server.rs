//! Dashboard HTTP server.
//!
//! Serves a single-page dashboard and the JSON API behind it. The page lets
//! the user fetch new posts for a search term, pick a stored term (or all
//! posts), and look at the raw rows, sentiment, categories, scores and
//! keywords for that selection.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Dashboard page |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/queries` | Distinct stored search terms |
//! | `POST` | `/api/fetch` | Fetch and store posts for a term |
//! | `GET`  | `/api/posts?query=` | Stored posts for a selection |
//! | `GET`  | `/api/analysis?query=` | Analysis report and chart specs |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).
//!
//! # Caching
//!
//! Loaded posts and analysis reports are memoized in [`ResultCache`]s keyed
//! by selection. A completed fetch clears both caches. When storage cannot
//! be read the request still answers with empty results, but nothing is
//! cached, so the next request reads again.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::analysis::{self, AnalysisReport};
use crate::cache::{CacheKey, Operation, ResultCache, Selection, TextColumn};
use crate::charts::ChartSet;
use crate::config::Config;
use crate::ingest::{self, IngestOutcome};
use crate::keywords::KeywordExtractor;
use crate::migrate;
use crate::models::PostRecord;
use crate::progress::NoProgress;
use crate::sentiment::SentimentAnalyzer;
use crate::source::{RedditSource, SearchSource};
use crate::store;

/// Post counts the fetch form accepts.
pub const FETCH_COUNT_RANGE: RangeInclusive<usize> = 5..=500;

const DASHBOARD_PAGE: &str = include_str!("dashboard.html");

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    source: Arc<dyn SearchSource>,
    sentiment: Arc<SentimentAnalyzer>,
    keywords: Arc<KeywordExtractor>,
    posts: Arc<ResultCache<Vec<PostRecord>>>,
    reports: Arc<ResultCache<AnalysisResponse>>,
}

/// Starts the dashboard against the live search endpoint.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let source = RedditSource::new(&config.source)?;
    run_server_with_source(config, Arc::new(source)).await
}

/// Starts the dashboard with a caller-supplied [`SearchSource`].
pub async fn run_server_with_source(
    config: &Config,
    source: Arc<dyn SearchSource>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    migrate::run_migrations(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        source,
        sentiment: Arc::new(SentimentAnalyzer::new(&config.analysis)),
        keywords: Arc::new(KeywordExtractor::new(&config.analysis)),
        posts: Arc::new(ResultCache::new()),
        reports: Arc::new(ResultCache::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_page))
        .route("/health", get(handle_health))
        .route("/api/queries", get(handle_queries))
        .route("/api/fetch", post(handle_fetch))
        .route("/api/posts", get(handle_posts))
        .route("/api/analysis", get(handle_analysis))
        .layer(cors)
        .with_state(state);

    println!("Dashboard listening on http://{}", bind_addr);
    info!(bind = %bind_addr, "dashboard started");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET / and /health ============

async fn handle_page() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/queries ============

#[derive(Serialize)]
struct QueriesResponse {
    queries: Vec<String>,
}

async fn handle_queries(State(state): State<AppState>) -> Json<QueriesResponse> {
    Json(QueriesResponse {
        queries: store::distinct_query_terms(&state.config).await,
    })
}

// ============ POST /api/fetch ============

#[derive(Deserialize)]
struct FetchRequest {
    query: String,
    count: usize,
}

/// Runs the ingestion pipeline on its own task and waits for it. The
/// pipeline sleeps between pages, so a large fetch holds the request open.
async fn handle_fetch(
    State(state): State<AppState>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Result<Json<IngestOutcome>, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;
    let query = request.query.trim().to_string();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    if !FETCH_COUNT_RANGE.contains(&request.count) {
        return Err(bad_request(format!(
            "count must be between {} and {}",
            FETCH_COUNT_RANGE.start(),
            FETCH_COUNT_RANGE.end()
        )));
    }

    let config = state.config.clone();
    let source = state.source.clone();
    let count = request.count;
    let task = tokio::spawn(async move {
        ingest::ingest(&config, source.as_ref(), &query, count, &NoProgress).await
    });

    let outcome = task.await.map_err(|e| {
        error!(error = %e, "fetch task failed");
        internal(format!("fetch task failed: {}", e))
    })?;

    state.posts.clear();
    state.reports.clear();
    info!(
        query = %outcome.query,
        fetched = outcome.fetched,
        inserted = outcome.inserted,
        "dashboard fetch complete"
    );

    Ok(Json(outcome))
}

// ============ GET /api/posts ============

#[derive(Deserialize)]
struct SelectionParams {
    query: Option<String>,
}

#[derive(Serialize)]
struct PostsResponse {
    selection: String,
    posts: Vec<PostRecord>,
}

async fn handle_posts(
    State(state): State<AppState>,
    Query(params): Query<SelectionParams>,
) -> Json<PostsResponse> {
    let selection = Selection::from_param(params.query.as_deref());
    let posts = cached_posts(&state, &selection).await.unwrap_or_else(|e| {
        warn!(selection = selection.label(), error = %e, "serving empty posts");
        Vec::new()
    });
    Json(PostsResponse {
        selection: selection.label().to_string(),
        posts,
    })
}

async fn cached_posts(state: &AppState, selection: &Selection) -> anyhow::Result<Vec<PostRecord>> {
    let key = CacheKey::new(Operation::LoadPosts, selection.clone(), TextColumn::None);
    state
        .posts
        .get_or_try_insert_with(key, || analysis::try_load_posts(&state.config, selection))
        .await
}

// ============ GET /api/analysis ============

#[derive(Debug, Clone, Serialize)]
struct AnalysisResponse {
    #[serde(flatten)]
    report: AnalysisReport,
    charts: ChartSet,
}

async fn handle_analysis(
    State(state): State<AppState>,
    Query(params): Query<SelectionParams>,
) -> Json<AnalysisResponse> {
    let selection = Selection::from_param(params.query.as_deref());
    let key = CacheKey::new(Operation::Analyze, selection.clone(), TextColumn::FullText);

    let response = state
        .reports
        .get_or_try_insert_with(key, || async {
            let posts = cached_posts(&state, &selection).await?;
            Ok::<_, anyhow::Error>(analysis_response(&state, &selection, &posts))
        })
        .await
        .unwrap_or_else(|e| {
            warn!(selection = selection.label(), error = %e, "serving empty analysis");
            analysis_response(&state, &selection, &[])
        });

    Json(response)
}

fn analysis_response(
    state: &AppState,
    selection: &Selection,
    posts: &[PostRecord],
) -> AnalysisResponse {
    let report = analysis::analyze_posts(
        selection,
        posts,
        &state.sentiment,
        &state.keywords,
        state.config.analysis.top_keywords,
    );
    let charts = ChartSet::from_report(&report);
    AnalysisResponse { report, charts }
}
