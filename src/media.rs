//! Media resolution.
//!
//! Each post record's `preview` (or, failing that, `original`) URL is
//! fetched through a [`MediaCache`] and the resulting [`MediaArtifact`] is
//! attached as `localFile`. A failed download never fails the record: the
//! error is logged and the record is emitted without `localFile`.
//!
//! A batch is resolved concurrently, at most `concurrency` downloads in
//! flight, and records come back in their original order.
//!
//! [`FsMediaCache`] stores files under a directory, one file per URL:
//!
//! ```text
//! {dir}/{sha256(url)}.{ext}
//! ```
//!
//! An existing file is a cache hit and costs no request.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::error::{HarnessError, Result};
use crate::models::{MediaArtifact, Record, RecordContent};
use crate::traits::MediaCache;

/// Deterministic artifact id for `url` referenced by `parent_id`.
pub fn artifact_id(parent_id: &str, url: &str) -> String {
    let name = format!("{}\n{}", parent_id, url);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
}

/// Resolve the media of one record.
pub async fn resolve(mut record: Record, cache: &dyn MediaCache) -> Record {
    let (url, parent_id) = match &record.content {
        RecordContent::Post(post) => {
            let Some(url) = post.preview.clone().or_else(|| post.original.clone()) else {
                return record;
            };
            let parent_id = post
                .id
                .clone()
                .unwrap_or_else(|| record.content_digest.clone());
            (url, parent_id)
        }
        RecordContent::User(_) => return record,
    };

    match cache.fetch(&url, &parent_id).await {
        Ok(artifact) => {
            tracing::debug!(record_id = %parent_id, artifact_id = %artifact.id, "Media cached");
            record.local_file = Some(artifact);
        }
        Err(e) => {
            tracing::warn!(
                record_id = %parent_id,
                error = %e,
                "Media download failed; emitting record without local file"
            );
        }
    }
    record
}

/// Resolve a batch, at most `concurrency` at a time, preserving order.
///
/// `on_resolved` is called once per record as it completes.
pub async fn resolve_all<F>(
    records: Vec<Record>,
    cache: &dyn MediaCache,
    concurrency: usize,
    on_resolved: F,
) -> Vec<Record>
where
    F: FnMut(&Record),
{
    stream::iter(records)
        .map(|record| resolve(record, cache))
        .buffered(concurrency.max(1))
        .inspect(on_resolved)
        .collect()
        .await
}

// ═══════════════════════════════════════════════════════════════════════
// Filesystem cache
// ═══════════════════════════════════════════════════════════════════════

/// A [`MediaCache`] backed by a local directory.
pub struct FsMediaCache {
    client: reqwest::Client,
    dir: PathBuf,
}

impl FsMediaCache {
    pub fn new(dir: impl Into<PathBuf>, provider: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider.timeout_secs))
            .user_agent(provider.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            dir: dir.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `url` is (or will be) stored.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let stem = hex::encode(hasher.finalize());
        self.dir.join(format!("{}.{}", stem, file_extension(url)))
    }

    async fn download(&self, url: &str, path: &Path) -> Result<()> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HarnessError::Api {
                status: status.as_u16(),
                message: format!("media download failed for {}", redact_query(url)),
            });
        }

        let bytes = resp.bytes().await?;

        tokio::fs::create_dir_all(&self.dir).await?;
        // Readers must never observe a partial file.
        let tmp = path.with_extension(format!("{}.part", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl MediaCache for FsMediaCache {
    async fn fetch(&self, url: &str, parent_id: &str) -> Result<MediaArtifact> {
        let path = self.path_for(url);

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(path = %path.display(), "Media cache hit");
        } else {
            self.download(url, &path).await?;
        }

        Ok(MediaArtifact {
            id: artifact_id(parent_id, url),
            parent_id: parent_id.to_string(),
            url: url.to_string(),
            path,
        })
    }
}

/// File extension from the URL path, or `bin` when there is no usable one.
fn file_extension(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            let last = u.path_segments()?.next_back()?.to_string();
            let (_, ext) = last.rsplit_once('.')?;
            let ok = !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric());
            ok.then(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| "bin".to_string())
}

/// Drop the query string (CDN signatures) from a URL for error messages.
fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
