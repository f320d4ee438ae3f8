//! Instagram provider client.
//!
//! Implements every acquisition strategy against the real endpoints:
//!
//! | Strategy | Endpoint |
//! |----------|----------|
//! | posts by id | `GET {graph_api_url}/{instagram_id}/media` |
//! | my posts | `GET {graph_me_url}/me/media` |
//! | hashtag API | `GET {graph_api_url}/ig_hashtag_search`, then `/{hashtag_id}/top_media` |
//! | account scrape | `GET {web_url}/{username}/?__a=1` |
//! | hashtag scrape | `GET {web_url}/explore/tags/{hashtag}/?__a=1` |
//! | profile scrape | `GET {web_url}/{username}/?__a=1` |
//!
//! Graph API responses are paged (`paging.next`); the client follows the
//! cursor until the feed is exhausted, `max_posts` is reached, or the
//! cursor repeats a page already fetched. Scraped
//! pages are read once.
//!
//! Access tokens travel in query strings, so request URLs are never logged
//! and network errors are stripped of their URL.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::auth;
use crate::config::ProviderConfig;
use crate::error::{HarnessError, Result};
use crate::models::{
    AcquisitionOptions, ApiMedia, OAuthTriple, RawPost, ScrapedMedia, ScrapedProfile,
};
use crate::traits::Provider;

/// Fields requested from the business Graph API.
const MEDIA_FIELDS: &str = "id,shortcode,username,caption,media_type,media_url,thumbnail_url,permalink,timestamp,like_count,comments_count";

/// Fields available on `/me/media` (no engagement counts).
const ME_MEDIA_FIELDS: &str =
    "id,username,caption,media_type,media_url,thumbnail_url,permalink,timestamp";

/// Fields available on hashtag media (no owner username).
const HASHTAG_MEDIA_FIELDS: &str =
    "id,caption,media_type,media_url,permalink,timestamp,like_count,comments_count";

// ============ Response shapes ============

#[derive(Deserialize)]
struct MediaPage {
    #[serde(default)]
    data: Vec<ApiMedia>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct HashtagSearch {
    #[serde(default)]
    data: Vec<HashtagId>,
}

#[derive(Deserialize)]
struct HashtagId {
    id: String,
}

#[derive(Deserialize)]
struct ProfilePage {
    graphql: ProfileGraph,
}

#[derive(Deserialize)]
struct ProfileGraph {
    user: ScrapedUser,
}

#[derive(Deserialize)]
struct ScrapedUser {
    #[serde(flatten)]
    profile: ScrapedProfile,
    #[serde(default)]
    edge_owner_to_timeline_media: Option<MediaConnection>,
}

#[derive(Deserialize)]
struct HashtagPage {
    graphql: HashtagGraph,
}

#[derive(Deserialize)]
struct HashtagGraph {
    hashtag: HashtagNode,
}

#[derive(Deserialize)]
struct HashtagNode {
    #[serde(default)]
    edge_hashtag_to_media: Option<MediaConnection>,
}

#[derive(Deserialize, Default)]
struct MediaConnection {
    #[serde(default)]
    edges: Vec<MediaEdge>,
}

#[derive(Deserialize)]
struct MediaEdge {
    node: ScrapedMedia,
}

impl MediaConnection {
    fn into_posts(self, max_posts: Option<usize>) -> Vec<RawPost> {
        let mut posts: Vec<RawPost> = self
            .edges
            .into_iter()
            .map(|e| RawPost::Scraped(e.node))
            .collect();
        if let Some(max) = max_posts {
            posts.truncate(max);
        }
        posts
    }
}

// ============ Client ============

/// HTTP implementation of [`Provider`].
pub struct InstagramClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl InstagramClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<T> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HarnessError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Follow Graph API `paging.next` links starting at `first`.
    async fn collect_pages(
        &self,
        first: reqwest::Url,
        max_posts: Option<usize>,
    ) -> Result<Vec<RawPost>> {
        let mut posts = Vec::new();
        let mut next = Some(first);
        let mut pages = 0u32;
        let mut fetched: HashSet<String> = HashSet::new();

        while let Some(url) = next.take() {
            // A cursor that points back to a fetched page ends the feed.
            if !fetched.insert(url.as_str().to_string()) {
                tracing::warn!(pages, "Graph API paging cursor repeated; stopping");
                break;
            }
            let page: MediaPage = self.get_json(url).await?;
            pages += 1;
            posts.extend(page.data.into_iter().map(RawPost::Api));

            if let Some(max) = max_posts {
                if posts.len() >= max {
                    posts.truncate(max);
                    break;
                }
            }

            next = match page.paging.and_then(|p| p.next) {
                Some(link) => Some(parse_url(&link, &[])?),
                None => None,
            };
        }

        tracing::debug!(pages, count = posts.len(), "Collected Graph API pages");
        Ok(posts)
    }
}

fn parse_url(base: &str, params: &[(&str, &str)]) -> Result<reqwest::Url> {
    reqwest::Url::parse_with_params(base, params)
        .map_err(|e| HarnessError::Config(format!("invalid URL '{}': {}", base, e)))
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn require<'a>(value: &'a Option<String>, field: &str, strategy: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HarnessError::Config(format!("`{}` is required for {}", field, strategy)))
}

fn hashtag_term(opts: &AcquisitionOptions, strategy: &str) -> Result<String> {
    Ok(require(&opts.hashtag, "hashtag", strategy)?
        .trim_start_matches('#')
        .to_string())
}

#[async_trait]
impl Provider for InstagramClient {
    async fn exchange_token(&self, triple: &OAuthTriple) -> Result<String> {
        let endpoint = self.config.token_exchange_url.as_deref().ok_or_else(|| {
            HarnessError::Config(
                "provider.token_exchange_url must be set to use client_id/client_secret/connection_id"
                    .to_string(),
            )
        })?;
        auth::exchange_connection_token(&self.client, endpoint, triple).await
    }

    async fn api_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        let token = require(&opts.access_token, "access_token", "the posts API")?;
        let id = require(&opts.instagram_id, "instagram_id", "the posts API")?;
        let limit = opts.paginate.to_string();

        let url = parse_url(
            &join(&self.config.graph_api_url, &format!("{}/media", id)),
            &[
                ("fields", MEDIA_FIELDS),
                ("limit", &limit),
                ("access_token", token),
            ],
        )?;
        self.collect_pages(url, opts.max_posts).await
    }

    async fn api_me_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        let token = require(&opts.access_token, "access_token", "the my-posts API")?;
        let limit = opts.paginate.to_string();

        let url = parse_url(
            &join(&self.config.graph_me_url, "me/media"),
            &[
                ("fields", ME_MEDIA_FIELDS),
                ("limit", &limit),
                ("access_token", token),
            ],
        )?;
        self.collect_pages(url, opts.max_posts).await
    }

    async fn api_hashtag_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        let token = require(&opts.access_token, "access_token", "the hashtag API")?;
        let user_id = require(&opts.instagram_id, "instagram_id", "the hashtag API")?;
        let term = hashtag_term(opts, "the hashtag API")?;

        let search_url = parse_url(
            &join(&self.config.graph_api_url, "ig_hashtag_search"),
            &[("user_id", user_id), ("q", &term), ("access_token", token)],
        )?;
        let search: HashtagSearch = self.get_json(search_url).await?;
        let hashtag_id = search
            .data
            .into_iter()
            .next()
            .map(|h| h.id)
            .ok_or_else(|| HarnessError::Parse(format!("no hashtag id returned for #{}", term)))?;

        tracing::debug!(hashtag = %term, hashtag_id = %hashtag_id, "Resolved hashtag id");

        let limit = opts.paginate.to_string();
        let url = parse_url(
            &join(&self.config.graph_api_url, &format!("{}/top_media", hashtag_id)),
            &[
                ("user_id", user_id),
                ("fields", HASHTAG_MEDIA_FIELDS),
                ("limit", &limit),
                ("access_token", token),
            ],
        )?;
        self.collect_pages(url, opts.max_posts).await
    }

    async fn scrape_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        let username = require(&opts.username, "username", "account scraping")?;
        let url = parse_url(
            &join(&self.config.web_url, &format!("{}/", username)),
            &[("__a", "1")],
        )?;
        let page: ProfilePage = self.get_json(url).await?;
        Ok(page
            .graphql
            .user
            .edge_owner_to_timeline_media
            .unwrap_or_default()
            .into_posts(opts.max_posts))
    }

    async fn scrape_hashtag_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        let term = hashtag_term(opts, "hashtag scraping")?;
        let url = parse_url(
            &join(&self.config.web_url, &format!("explore/tags/{}/", term)),
            &[("__a", "1")],
        )?;
        let page: HashtagPage = self.get_json(url).await?;
        Ok(page
            .graphql
            .hashtag
            .edge_hashtag_to_media
            .unwrap_or_default()
            .into_posts(opts.max_posts))
    }

    async fn scrape_profile(&self, opts: &AcquisitionOptions) -> Result<ScrapedProfile> {
        let username = require(&opts.username, "username", "profile scraping")?;
        let url = parse_url(
            &join(&self.config.web_url, &format!("{}/", username)),
            &[("__a", "1")],
        )?;
        let page: ProfilePage = self.get_json(url).await?;
        Ok(page.graphql.user.profile)
    }
}
