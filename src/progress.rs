//! Fetch progress reporting.
//!
//! Reports observable progress during `post-analyzer fetch` so users see how
//! many posts have arrived, when the pipeline is backing off, and why it
//! stopped. Progress is emitted on **stderr** so stdout remains parseable for
//! scripts.

use std::io::Write;

/// Why a fetch run ended. None of these are errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    /// The requested number of posts was collected.
    TargetReached,
    /// The source returned an empty page.
    Exhausted,
    /// Too many consecutive failures on the same page.
    RetriesExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::TargetReached => "target reached",
            StopReason::Exhausted => "source exhausted",
            StopReason::RetriesExhausted => "retries exhausted",
        }
    }
}

/// A single progress event for a fetch run.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchProgressEvent {
    /// A page arrived; `fetched` posts collected so far out of `target`.
    Page {
        query: String,
        fetched: u64,
        target: u64,
    },
    /// A page request failed and will be retried.
    Retrying {
        query: String,
        attempt: u32,
        max: u32,
    },
    /// The run ended.
    Finished {
        query: String,
        fetched: u64,
        reason: StopReason,
    },
}

/// Reports fetch progress. Implementations write to stderr (human or JSON).
pub trait FetchProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the ingestion pipeline.
    fn report(&self, event: FetchProgressEvent);
}

/// Human-friendly progress on stderr: "fetch 'rust'  1,200 / 2,000 posts".
pub struct StderrProgress;

impl FetchProgressReporter for StderrProgress {
    fn report(&self, event: FetchProgressEvent) {
        let line = match &event {
            FetchProgressEvent::Page {
                query,
                fetched,
                target,
            } => format!(
                "fetch '{}'  {} / {} posts\n",
                query,
                format_number(*fetched),
                format_number(*target)
            ),
            FetchProgressEvent::Retrying {
                query,
                attempt,
                max,
            } => format!("fetch '{}'  retrying ({}/{})\n", query, attempt, max),
            FetchProgressEvent::Finished {
                query,
                fetched,
                reason,
            } => format!(
                "fetch '{}'  done: {} posts ({})\n",
                query,
                format_number(*fetched),
                reason.as_str()
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl FetchProgressReporter for JsonProgress {
    fn report(&self, event: FetchProgressEvent) {
        let obj = match &event {
            FetchProgressEvent::Page {
                query,
                fetched,
                target,
            } => serde_json::json!({
                "event": "progress",
                "query": query,
                "phase": "fetching",
                "n": fetched,
                "total": target
            }),
            FetchProgressEvent::Retrying {
                query,
                attempt,
                max,
            } => serde_json::json!({
                "event": "progress",
                "query": query,
                "phase": "retrying",
                "attempt": attempt,
                "max": max
            }),
            FetchProgressEvent::Finished {
                query,
                fetched,
                reason,
            } => serde_json::json!({
                "event": "finished",
                "query": query,
                "n": fetched,
                "reason": reason.as_str()
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl FetchProgressReporter for NoProgress {
    fn report(&self, _event: FetchProgressEvent) {}
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse the `--progress` flag value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    /// Build a reporter for this mode. Caller can pass it to ingest.
    pub fn reporter(&self) -> Box<dyn FetchProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
