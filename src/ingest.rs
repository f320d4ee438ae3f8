//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow for one source:
//!
//! ```text
//! options → router::acquire → normalize → fingerprint → media::resolve_all → records
//! ```
//!
//! Acquisition errors abort the source with no partial results. Media
//! failures never do. An unrecognized content type logs a warning and
//! yields no records.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::export::{self, OutputFormat};
use crate::fingerprint;
use crate::media::{self, FsMediaCache};
use crate::models::{AcquisitionOptions, Record};
use crate::normalize::normalize;
use crate::progress::{ProgressEvent, ProgressMode, ProgressReporter};
use crate::provider::InstagramClient;
use crate::router::{self, select_strategy};
use crate::traits::{MediaCache, Provider};

/// The collaborators one ingestion run needs.
pub struct Pipeline<'a> {
    pub provider: &'a dyn Provider,
    /// `None` skips media resolution entirely.
    pub media: Option<&'a dyn MediaCache>,
    /// Maximum media downloads in flight.
    pub concurrency: usize,
    pub progress: &'a dyn ProgressReporter,
}

impl Pipeline<'_> {
    /// Run one source end to end and return its finalized records.
    pub async fn run_source(&self, name: &str, options: &AcquisitionOptions) -> Result<Vec<Record>> {
        let mut params = options.clone();

        if let Some(strategy) = select_strategy(&params) {
            self.progress.report(ProgressEvent::Acquiring {
                source: name.to_string(),
                strategy: strategy.as_str().to_string(),
            });
        }

        let raw = router::acquire(&mut params, self.provider)
            .await
            .with_context(|| format!("Acquisition failed for source '{}'", name))?;

        let Some(raw) = raw else {
            tracing::warn!(
                source = name,
                content_type = %params.content_type,
                "Unknown content type; expected account, hashtag, or user-profile. Skipping"
            );
            return Ok(Vec::new());
        };

        tracing::debug!(source = name, params = ?params, "Acquired with options");
        tracing::info!(source = name, count = raw.len(), "Normalizing records");

        let mut records = Vec::with_capacity(raw.len());
        for item in &raw {
            records.push(fingerprint::seal(normalize(item, &params))?);
        }

        let Some(cache) = self.media else {
            return Ok(records);
        };

        let total = records.len() as u64;
        let mut done = 0u64;
        let records = media::resolve_all(records, cache, self.concurrency, |_| {
            done += 1;
            self.progress.report(ProgressEvent::Resolving {
                source: name.to_string(),
                done,
                total,
            });
        })
        .await;

        let linked = records.iter().filter(|r| r.local_file.is_some()).count();
        tracing::info!(source = name, total, linked, "Media resolved");

        Ok(records)
    }
}

/// Options for the `sync` command.
pub struct SyncArgs {
    pub source: String,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub no_media: bool,
    pub progress: ProgressMode,
}

/// Run `sync` for one named source or `all`, then write the records.
pub async fn run_sync(config: &Config, args: &SyncArgs) -> Result<()> {
    let selected: Vec<(&String, &AcquisitionOptions)> = if args.source == "all" {
        config.sources.iter().collect()
    } else {
        match config.sources.get_key_value(&args.source) {
            Some(entry) => vec![entry],
            None => {
                let available: Vec<&str> = config.sources.keys().map(String::as_str).collect();
                bail!(
                    "Unknown source: '{}'. Available: all, {}",
                    args.source,
                    available.join(", ")
                );
            }
        }
    };

    let provider = InstagramClient::new(&config.provider)?;
    let cache = FsMediaCache::new(&config.media.dir, &config.provider)?;
    let media: Option<&dyn MediaCache> = if config.media.enabled && !args.no_media {
        Some(&cache)
    } else {
        None
    };
    let reporter = args.progress.reporter();

    let pipeline = Pipeline {
        provider: &provider,
        media,
        concurrency: config.media.concurrency,
        progress: reporter.as_ref(),
    };

    let mut all = Vec::new();
    let mut summary = Vec::new();
    for (name, options) in selected {
        let records = pipeline.run_source(name, options).await?;
        let linked = records.iter().filter(|r| r.local_file.is_some()).count();
        summary.push(format!(
            "sync {}\n  records: {}\n  media linked: {}",
            name,
            records.len(),
            linked
        ));
        all.extend(records);
    }

    export::write_records(&all, args.output.as_deref(), args.format)?;

    // Summary goes to stdout only when stdout isn't carrying the records.
    let summary = summary.join("\n");
    match &args.output {
        Some(path) => {
            println!("{}", summary);
            println!("  output: {}", path.display());
            println!("ok");
        }
        None => eprintln!("{}\nok", summary),
    }

    Ok(())
}
