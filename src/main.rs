//! # Insta Harness CLI (`insta-harness`)
//!
//! Runs ingestion for the sources configured in a TOML file and writes the
//! finalized records as JSON.
//!
//! ## Usage
//!
//! ```bash
//! insta-harness --config ./config/insta.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `insta-harness sync <source\|all>` | Acquire, normalize, fingerprint, and cache media |
//! | `insta-harness sources` | List sources and the strategy each will use |
//! | `insta-harness normalize <file>` | Normalize a saved raw payload offline |
//! | `insta-harness completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Ingest every source into one file
//! insta-harness sync all --output ./data/records.json
//!
//! # One source, JSON Lines on stdout, no media downloads
//! insta-harness sync travel --format jsonl --no-media
//!
//! # Check a scraped page dump without touching the network
//! insta-harness normalize ./dump.json --shape scraped --type hashtag --hashtag sunset
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use insta_harness::config;
use insta_harness::export::{self, OutputFormat};
use insta_harness::fingerprint;
use insta_harness::ingest::{self, SyncArgs};
use insta_harness::models::{AcquisitionOptions, ContentType};
use insta_harness::normalize::{self, RawShape};
use insta_harness::progress::ProgressMode;
use insta_harness::sources;

/// Insta Harness: ingest Instagram posts, hashtag feeds, and profiles into
/// fingerprinted records with locally cached media.
#[derive(Parser)]
#[command(
    name = "insta-harness",
    about = "Ingest Instagram posts, hashtag feeds, and profiles into fingerprinted records",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/insta.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one source (by name) or `all` sources.
    ///
    /// Records are written to stdout unless `--output` is given. Progress
    /// and logs go to stderr.
    Sync {
        /// Source name from `[sources.<name>]`, or `all`.
        source: String,

        /// Write records to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Skip media downloads; records are emitted without `localFile`.
        #[arg(long)]
        no_media: bool,

        /// Progress reporting on stderr. Defaults to `human` on a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List configured sources and the acquisition strategy each selects.
    Sources,

    /// Normalize and fingerprint a saved raw payload without network access.
    Normalize {
        /// JSON file holding one raw object or an array of them.
        file: PathBuf,

        /// Upstream shape of the payload.
        #[arg(long, value_enum, default_value_t = RawShape::Scraped)]
        shape: RawShape,

        /// Content type to normalize as (`account`, `hashtag`, `user-profile`).
        #[arg(long = "type", default_value = "account")]
        content_type: String,

        /// Hashtag term, used as the username of hashtag posts.
        #[arg(long)]
        hashtag: Option<String>,
    },

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("insta_harness=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "insta-harness", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Normalize {
            file,
            shape,
            content_type,
            hashtag,
        } => {
            let params = AcquisitionOptions {
                content_type: ContentType::from(content_type.as_str()),
                hashtag: hashtag.clone(),
                ..Default::default()
            };
            normalize::check_shape(*shape, &params.content_type)?;
            let json = std::fs::read_to_string(file)?;
            let records = normalize::parse_raw(&json, *shape)?
                .iter()
                .map(|raw| fingerprint::seal(normalize::normalize(raw, &params)))
                .collect::<anyhow::Result<Vec<_>>>()?;
            export::write_records(&records, None, OutputFormat::Json)?;
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sync {
            source,
            output,
            format,
            no_media,
            progress,
        } => {
            let args = SyncArgs {
                source,
                output,
                format,
                no_media,
                progress: progress.unwrap_or_else(ProgressMode::default_for_tty),
            };
            ingest::run_sync(&cfg, &args).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Normalize { .. } | Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
