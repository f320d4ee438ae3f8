use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::AcquisitionOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub media: MediaConfig,
    /// Named sources, e.g. `[sources.travel]`. Ordered by name so
    /// `sync all` is deterministic.
    #[serde(default)]
    pub sources: BTreeMap<String, AcquisitionOptions>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_graph_api_url")]
    pub graph_api_url: String,
    #[serde(default = "default_graph_me_url")]
    pub graph_me_url: String,
    #[serde(default = "default_web_url")]
    pub web_url: String,
    /// Connection-token exchange endpoint. Required only by sources that
    /// authenticate with `client_id` / `client_secret` / `connection_id`.
    #[serde(default)]
    pub token_exchange_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            graph_api_url: default_graph_api_url(),
            graph_me_url: default_graph_me_url(),
            web_url: default_web_url(),
            token_exchange_url: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_graph_api_url() -> String {
    "https://graph.facebook.com/v7.0".to_string()
}
fn default_graph_me_url() -> String {
    "https://graph.instagram.com".to_string()
}
fn default_web_url() -> String {
    "https://www.instagram.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("insta-harness/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_media_enabled")]
    pub enabled: bool,
    /// Maximum number of media downloads in flight per source.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_media_dir")]
    pub dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: default_media_enabled(),
            concurrency: default_concurrency(),
            dir: default_media_dir(),
        }
    }
}

fn default_media_enabled() -> bool {
    true
}
fn default_concurrency() -> usize {
    16
}
fn default_media_dir() -> PathBuf {
    PathBuf::from("./data/media")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.media.concurrency == 0 {
        anyhow::bail!("media.concurrency must be > 0");
    }

    if config.provider.timeout_secs == 0 {
        anyhow::bail!("provider.timeout_secs must be > 0");
    }

    for (name, source) in &config.sources {
        if source.paginate == 0 {
            anyhow::bail!("sources.{}.paginate must be > 0", name);
        }
        if source.max_posts == Some(0) {
            anyhow::bail!("sources.{}.max_posts must be > 0 when set", name);
        }
    }

    Ok(())
}
