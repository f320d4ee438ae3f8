//! Emit finalized records as JSON.
//!
//! Two formats:
//!
//! - `json`: one pretty-printed array of all records.
//! - `jsonl`: one compact record per line, suitable for appending and
//!   streaming into other tools.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::models::Record;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Jsonl,
}

/// Serialize `records` in `format` into `writer`.
pub fn write_to<W: Write>(writer: &mut W, records: &[Record], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, records)?;
            writeln!(writer)?;
        }
        OutputFormat::Jsonl => {
            for record in records {
                serde_json::to_writer(&mut *writer, record)?;
                writeln!(writer)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write records to `output`, or to stdout when `output` is `None`.
pub fn write_records(records: &[Record], output: Option<&Path>, format: OutputFormat) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = std::io::BufWriter::new(file);
            write_to(&mut writer, records, format)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_to(&mut lock, records, format)?;
        }
    }
    Ok(())
}
