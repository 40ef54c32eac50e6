//! # Post Analyzer CLI (`post-analyzer`)
//!
//! Fetches posts for a search term, stores them in SQLite, and analyses
//! what was collected, either in the terminal or in the dashboard.
//!
//! ## Usage
//!
//! ```bash
//! post-analyzer --config ./config/post-analyzer.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `post-analyzer init` | Create the SQLite database and run schema migrations |
//! | `post-analyzer fetch "<term>"` | Fetch and store posts for a search term |
//! | `post-analyzer posts` | List stored posts |
//! | `post-analyzer show <id>` | Print one stored post |
//! | `post-analyzer analyze` | Sentiment, category and keyword report |
//! | `post-analyzer stats` | Database overview |
//! | `post-analyzer export` | Dump stored posts as JSON |
//! | `post-analyzer serve` | Start the dashboard |
//!
//! ## Examples
//!
//! ```bash
//! post-analyzer init
//! post-analyzer fetch "intelligenza artificiale" --count 250
//! post-analyzer analyze --query "intelligenza artificiale"
//! post-analyzer serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use post_analyzer::progress::ProgressMode;
use post_analyzer::{
    analysis, config, export, ingest, migrate, posts, server, stats,
};

/// Post Analyzer: collect public discussion posts for a search term and
/// explore their sentiment, categories, scores and keywords.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/post-analyzer.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "post-analyzer",
    about = "Fetch, store and analyse public discussion posts for a search term",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/post-analyzer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `posts` table.
    /// Running it more than once is safe.
    Init,

    /// Fetch posts for a search term and store the new ones.
    ///
    /// Pages through search results by relevance until `--count` posts have
    /// arrived or the source runs dry. Posts already stored are skipped.
    Fetch {
        /// The search term.
        query: String,

        /// Number of posts to fetch.
        #[arg(long, default_value_t = 100)]
        count: usize,

        /// Progress output on stderr: `human`, `json` or `off`.
        /// Defaults to `human` on a terminal, `off` otherwise.
        #[arg(long)]
        progress: Option<String>,
    },

    /// List stored posts.
    Posts {
        /// Only posts stored under this search term.
        #[arg(long)]
        query: Option<String>,

        /// Maximum number of rows to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print one stored post in full.
    Show {
        /// Post id.
        id: String,
    },

    /// Print the analysis report for stored posts.
    Analyze {
        /// Only posts stored under this search term.
        #[arg(long)]
        query: Option<String>,
    },

    /// Show database statistics.
    Stats,

    /// Export stored posts as JSON.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Only posts stored under this search term.
        #[arg(long)]
        query: Option<String>,
    },

    /// Start the dashboard on `[server].bind`.
    Serve,
}

fn init_logging() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Fetch {
            query,
            count,
            progress,
        } => {
            let mode = match progress.as_deref() {
                Some(value) => ProgressMode::parse(value).ok_or_else(|| {
                    anyhow::anyhow!("unknown progress mode '{}': use human, json or off", value)
                })?,
                None => ProgressMode::default_for_tty(),
            };
            let reporter = mode.reporter();
            ingest::run_fetch(&cfg, &query, count, reporter.as_ref()).await?;
        }
        Commands::Posts { query, limit } => {
            posts::run_posts(&cfg, query.as_deref(), limit).await?;
        }
        Commands::Show { id } => {
            posts::run_show(&cfg, &id).await?;
        }
        Commands::Analyze { query } => {
            analysis::run_analyze(&cfg, query.as_deref()).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Export { output, query } => {
            export::run_export(&cfg, output.as_deref(), query.as_deref()).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
