//! Sync progress reporting.
//!
//! `insta-harness sync` reports two phases per source: waiting on the
//! upstream provider, then media resolution record by record. Everything
//! is written to **stderr**; stdout may be carrying the records.
//!
//! ```text
//! sync travel  acquiring via scrape:hashtag...
//! sync travel  media  12 / 1,204
//! ```

use std::io::Write;

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Upstream request in flight; the record count is not known yet.
    Acquiring { source: String, strategy: String },
    /// `done` of `total` records have finished media resolution.
    Resolving { source: String, done: u64, total: u64 },
}

impl ProgressEvent {
    fn human_line(&self) -> String {
        match self {
            ProgressEvent::Acquiring { source, strategy } => {
                format!("sync {}  acquiring via {}...", source, strategy)
            }
            ProgressEvent::Resolving {
                source,
                done,
                total,
            } => format!(
                "sync {}  media  {} / {}",
                source,
                with_thousands(*done),
                with_thousands(*total)
            ),
        }
    }

    fn json_value(&self) -> serde_json::Value {
        match self {
            ProgressEvent::Acquiring { source, strategy } => serde_json::json!({
                "event": "progress",
                "phase": "acquiring",
                "source": source,
                "strategy": strategy,
            }),
            ProgressEvent::Resolving {
                source,
                done,
                total,
            } => serde_json::json!({
                "event": "progress",
                "phase": "media",
                "source": source,
                "done": done,
                "total": total,
            }),
        }
    }
}

/// Receives progress events from the ingest pipeline.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Plain text lines for a terminal.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", event.human_line());
    }
}

/// One JSON object per line, for wrappers that parse stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", event.json_value());
    }
}

pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// `1204` → `1,204`.
fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut out = String::from(&digits[..head]);
    for (i, chunk) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            out.push(',');
        }
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
    }
    out
}

/// `--progress` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// `human` when stderr is a terminal, `off` when it is redirected.
    pub fn default_for_tty() -> Self {
        match atty::is(atty::Stream::Stderr) {
            true => ProgressMode::Human,
            false => ProgressMode::Off,
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
