use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Search endpoint settings and the pacing of the fetch loop.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Origin prepended to each item's relative permalink.
    #[serde(default = "default_site_origin")]
    pub site_origin: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            site_origin: default_site_origin(),
            user_agent: default_user_agent(),
            max_page_size: default_max_page_size(),
            max_retries: default_max_retries(),
            page_delay_ms: default_page_delay_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_base_url() -> String {
    "https://www.reddit.com/search.json".to_string()
}
fn default_site_origin() -> String {
    "https://www.reddit.com".to_string()
}
fn default_user_agent() -> String {
    concat!(
        "post-analyzer/",
        env!("CARGO_PKG_VERSION"),
        " (ad-hoc research dashboard)"
    )
    .to_string()
}
fn default_max_page_size() -> usize {
    100
}
fn default_max_retries() -> u32 {
    3
}
fn default_page_delay_ms() -> u64 {
    2000
}
fn default_retry_delay_ms() -> u64 {
    5000
}
fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_extra_stopwords")]
    pub extra_stopwords: Vec<String>,
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            extra_stopwords: default_extra_stopwords(),
            top_keywords: default_top_keywords(),
            positive_threshold: default_positive_threshold(),
            negative_threshold: default_negative_threshold(),
        }
    }
}

fn default_language() -> String {
    "italian".to_string()
}
fn default_extra_stopwords() -> Vec<String> {
    [
        "reddit", "com", "https", "www", "http", "post", "commento", "commenti", "thread",
        "subreddit", "essere", "fare", "dire", "potere", "volere", "avere", "sto", "sta", "stai",
        "fatto", "detto", "dice", "dico", "anni", "mese", "giorni", "settimana", "grazie", "ciao",
        "vorrei", "sapere", "qualcuno", "secondo", "cosa", "come", "perché", "quando", "dove",
        "chi", "più", "meno", "molto", "sempre", "solo", "anche",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_top_keywords() -> usize {
    20
}
fn default_positive_threshold() -> f64 {
    0.05
}
fn default_negative_threshold() -> f64 {
    -0.05
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

/// Languages with a built-in stoplist.
pub const SUPPORTED_LANGUAGES: &[&str] = &["italian", "english"];

impl Config {
    /// A configuration with every optional section at its default.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig { path: path.into() },
            source: SourceConfig::default(),
            analysis: AnalysisConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let source = &self.source;
        if source.max_page_size == 0 || source.max_page_size > 100 {
            anyhow::bail!("source.max_page_size must be in 1..=100");
        }
        if source.max_retries == 0 {
            anyhow::bail!("source.max_retries must be >= 1");
        }
        if source.timeout_secs == 0 {
            anyhow::bail!("source.timeout_secs must be > 0");
        }
        if source.user_agent.trim().is_empty() {
            anyhow::bail!("source.user_agent must not be empty");
        }

        let analysis = &self.analysis;
        if !SUPPORTED_LANGUAGES.contains(&analysis.language.as_str()) {
            anyhow::bail!(
                "Unknown analysis.language: '{}'. Must be one of: {}.",
                analysis.language,
                SUPPORTED_LANGUAGES.join(", ")
            );
        }
        if analysis.negative_threshold >= analysis.positive_threshold {
            anyhow::bail!("analysis.negative_threshold must be < analysis.positive_threshold");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
