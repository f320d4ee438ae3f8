use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::router::{select_strategy, Strategy};

/// How a configured source will be acquired.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub content_type: String,
    /// `None` when the content type is not recognized.
    pub strategy: Option<String>,
    /// Missing options that will make acquisition fail.
    pub missing: Vec<String>,
}

pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    config
        .sources
        .iter()
        .map(|(name, opts)| {
            let strategy = select_strategy(opts);
            let mut missing = Vec::new();
            match strategy {
                Some(Strategy::ScrapePosts | Strategy::ScrapeProfile)
                    if opts.username.is_none() =>
                {
                    missing.push("username".to_string());
                }
                Some(Strategy::ApiHashtag | Strategy::ScrapeHashtag) if opts.hashtag.is_none() => {
                    missing.push("hashtag".to_string());
                }
                Some(Strategy::ExchangeThenApiMePosts)
                    if config.provider.token_exchange_url.is_none() =>
                {
                    missing.push("provider.token_exchange_url".to_string());
                }
                _ => {}
            }
            SourceStatus {
                name: name.clone(),
                content_type: opts.content_type.to_string(),
                strategy: strategy.map(|s| s.as_str().to_string()),
                missing,
            }
        })
        .collect()
}

pub fn list_sources(config: &Config) -> Result<()> {
    let sources = get_sources(config);
    if sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!("{:<16} {:<14} {:<16} MISSING", "SOURCE", "TYPE", "STRATEGY");
    for s in &sources {
        println!(
            "{:<16} {:<14} {:<16} {}",
            s.name,
            s.content_type,
            s.strategy.as_deref().unwrap_or("(unknown type)"),
            if s.missing.is_empty() {
                "-".to_string()
            } else {
                s.missing.join(",")
            }
        );
    }

    Ok(())
}
