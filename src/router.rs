//! Acquisition strategy selection.
//!
//! Which endpoint family serves a source depends only on its content type
//! and on which credentials are present:
//!
//! | Type | Condition | Strategy |
//! |------|-----------|----------|
//! | `account` | `access_token` + `instagram_id` | posts API by id |
//! | `account` | `access_token` | my-posts API |
//! | `account` | `client_id` + `client_secret` + `connection_id` | token exchange, then my-posts API |
//! | `account` | otherwise | scrape account page |
//! | `hashtag` | `access_token` + `instagram_id` | hashtag API |
//! | `hashtag` | otherwise | scrape hashtag page |
//! | `user-profile` | always | scrape profile page |
//!
//! Rows are evaluated top to bottom; the first match wins. Any other type
//! selects nothing.

use crate::error::{HarnessError, Result};
use crate::models::{AcquisitionOptions, ContentType, RawRecord};
use crate::traits::Provider;

/// A single acquisition strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ApiPosts,
    ApiMePosts,
    ExchangeThenApiMePosts,
    ScrapePosts,
    ApiHashtag,
    ScrapeHashtag,
    ScrapeProfile,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ApiPosts => "api:posts",
            Strategy::ApiMePosts => "api:me",
            Strategy::ExchangeThenApiMePosts => "oauth+api:me",
            Strategy::ScrapePosts => "scrape:account",
            Strategy::ApiHashtag => "api:hashtag",
            Strategy::ScrapeHashtag => "scrape:hashtag",
            Strategy::ScrapeProfile => "scrape:profile",
        }
    }
}

/// Pick the strategy for `opts`, or `None` for an unrecognized type.
pub fn select_strategy(opts: &AcquisitionOptions) -> Option<Strategy> {
    match opts.content_type {
        ContentType::Account => Some(if opts.has_access_token() && opts.has_instagram_id() {
            Strategy::ApiPosts
        } else if opts.has_access_token() {
            Strategy::ApiMePosts
        } else if opts.has_oauth_triple() {
            Strategy::ExchangeThenApiMePosts
        } else {
            Strategy::ScrapePosts
        }),
        ContentType::Hashtag => Some(if opts.has_access_token() && opts.has_instagram_id() {
            Strategy::ApiHashtag
        } else {
            Strategy::ScrapeHashtag
        }),
        ContentType::UserProfile => Some(Strategy::ScrapeProfile),
        ContentType::Other(_) => None,
    }
}

/// Fetch the raw records for `opts`.
///
/// Returns `Ok(None)` when the content type is unrecognized. When the
/// OAuth triple is used, it is removed from `opts` and replaced by the
/// exchanged `access_token` before the posts request is made, so nothing
/// downstream ever sees the client secret.
pub async fn acquire(
    opts: &mut AcquisitionOptions,
    provider: &dyn Provider,
) -> Result<Option<Vec<RawRecord>>> {
    let Some(strategy) = select_strategy(opts) else {
        return Ok(None);
    };

    tracing::info!(
        content_type = %opts.content_type,
        strategy = strategy.as_str(),
        "Acquiring records"
    );

    let posts = match strategy {
        Strategy::ApiPosts => provider.api_posts(opts).await?,
        Strategy::ApiMePosts => provider.api_me_posts(opts).await?,
        Strategy::ExchangeThenApiMePosts => {
            let triple = opts.take_oauth_triple().ok_or_else(|| {
                HarnessError::Config("incomplete client credentials".to_string())
            })?;
            let token = provider.exchange_token(&triple).await?;
            drop(triple);
            opts.access_token = Some(token);
            provider.api_me_posts(opts).await?
        }
        Strategy::ScrapePosts => provider.scrape_posts(opts).await?,
        Strategy::ApiHashtag => provider.api_hashtag_posts(opts).await?,
        Strategy::ScrapeHashtag => provider.scrape_hashtag_posts(opts).await?,
        Strategy::ScrapeProfile => {
            let profile = provider.scrape_profile(opts).await?;
            return Ok(Some(vec![RawRecord::Profile(profile)]));
        }
    };

    Ok(Some(posts.into_iter().map(RawRecord::Post).collect()))
}
