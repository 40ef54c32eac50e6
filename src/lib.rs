//! # Post Analyzer
//!
//! Collects public discussion posts for a search term, stores them in
//! SQLite without duplicates, and analyses what was collected: sentiment,
//! category breakdowns, score distributions and keywords.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ SearchSource │──▶│    Ingest    │──▶│  SQLite  │
//! │  (paginated) │   │ fetch+store  │   │  posts   │
//! └──────────────┘   └──────────────┘   └────┬─────┘
//!                                            │
//!                      ┌─────────────────────┤
//!                      ▼                     ▼
//!                 ┌──────────┐         ┌───────────┐
//!                 │   CLI    │         │ Dashboard │
//!                 └──────────┘         └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! post-analyzer init
//! post-analyzer fetch "rust" --count 200
//! post-analyzer analyze --query rust
//! post-analyzer serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`source`] | Search endpoint client |
//! | [`ingest`] | Paginated fetch and store pipeline |
//! | [`store`] | Deduplicated storage gateway |
//! | [`sentiment`] | Sentiment scoring |
//! | [`keywords`] | TF-IDF keyword extraction |
//! | [`analysis`] | Aggregate reports |
//! | [`charts`] | Vega-Lite chart specs |
//! | [`cache`] | Dashboard result cache |
//! | [`server`] | Dashboard HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analysis;
pub mod cache;
pub mod charts;
pub mod config;
pub mod db;
pub mod export;
pub mod ingest;
pub mod keywords;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod posts;
pub mod progress;
pub mod sentiment;
pub mod server;
pub mod source;
pub mod stats;
pub mod store;
