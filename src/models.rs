//! Core data models used throughout the harness.
//!
//! Three groups of types live here:
//!
//! - [`AcquisitionOptions`]: one configured source, as read from TOML.
//! - Raw upstream shapes ([`RawRecord`], [`RawPost`], [`ScrapedProfile`]):
//!   exactly what Instagram returns, every field optional.
//! - Normalized output ([`RecordContent`], [`Record`], [`MediaArtifact`]):
//!   the uniform records the pipeline emits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════
// Options
// ═══════════════════════════════════════════════════════════════════════

/// What kind of content a source ingests.
///
/// Unknown strings are kept as [`ContentType::Other`] instead of failing
/// deserialization: an unrecognized type is a warning at ingestion time,
/// not a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    #[default]
    Account,
    Hashtag,
    UserProfile,
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Account => "account",
            ContentType::Hashtag => "hashtag",
            ContentType::UserProfile => "user-profile",
            ContentType::Other(s) => s,
        }
    }
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "account" => ContentType::Account,
            "hashtag" => ContentType::Hashtag,
            "user-profile" => ContentType::UserProfile,
            _ => ContentType::Other(s),
        }
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self {
        ContentType::from(s.to_string())
    }
}

impl From<ContentType> for String {
    fn from(t: ContentType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_paginate() -> u32 {
    100
}

/// Options for a single source.
///
/// Omitted keys fall back to `{ type = "account", paginate = 100 }`.
/// Secrets are redacted from the `Debug` output.
#[derive(Clone, Deserialize)]
pub struct AcquisitionOptions {
    #[serde(rename = "type", default)]
    pub content_type: ContentType,
    #[serde(default = "default_paginate")]
    pub paginate: u32,
    #[serde(default)]
    pub max_posts: Option<usize>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub hashtag: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub instagram_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub connection_id: Option<String>,
}

impl Default for AcquisitionOptions {
    fn default() -> Self {
        Self {
            content_type: ContentType::Account,
            paginate: default_paginate(),
            max_posts: None,
            username: None,
            hashtag: None,
            access_token: None,
            instagram_id: None,
            client_id: None,
            client_secret: None,
            connection_id: None,
        }
    }
}

/// A credential counts as present only when it is set and non-empty.
fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl AcquisitionOptions {
    pub fn has_access_token(&self) -> bool {
        is_set(&self.access_token)
    }

    pub fn has_instagram_id(&self) -> bool {
        is_set(&self.instagram_id)
    }

    /// True when `client_id`, `client_secret`, and `connection_id` are all set.
    pub fn has_oauth_triple(&self) -> bool {
        is_set(&self.client_id) && is_set(&self.client_secret) && is_set(&self.connection_id)
    }

    /// Remove the OAuth triple from the options.
    ///
    /// Returns `None` (and leaves the options untouched) unless all three
    /// fields are present.
    pub fn take_oauth_triple(&mut self) -> Option<OAuthTriple> {
        if !self.has_oauth_triple() {
            return None;
        }
        Some(OAuthTriple {
            client_id: self.client_id.take()?,
            client_secret: self.client_secret.take()?,
            connection_id: self.connection_id.take()?,
        })
    }
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}

impl fmt::Debug for AcquisitionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquisitionOptions")
            .field("content_type", &self.content_type)
            .field("paginate", &self.paginate)
            .field("max_posts", &self.max_posts)
            .field("username", &self.username)
            .field("hashtag", &self.hashtag)
            .field("access_token", &redact(&self.access_token))
            .field("instagram_id", &self.instagram_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("connection_id", &self.connection_id)
            .finish()
    }
}

/// Client credentials for the connection-token exchange.
#[derive(Clone)]
pub struct OAuthTriple {
    pub client_id: String,
    pub client_secret: String,
    pub connection_id: String,
}

impl fmt::Debug for OAuthTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTriple")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("connection_id", &self.connection_id)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Raw upstream shapes
// ═══════════════════════════════════════════════════════════════════════

/// A `{ "count": n }` edge summary.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EdgeCount {
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Dimensions {
    pub height: i64,
    pub width: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThumbnailResource {
    pub src: String,
    pub config_width: i64,
    pub config_height: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Owner {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptionNode {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptionEdge {
    #[serde(default)]
    pub node: CaptionNode,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptionEdges {
    #[serde(default)]
    pub edges: Vec<CaptionEdge>,
}

/// A media object returned by the Graph API (`/{id}/media`, `/me/media`,
/// hashtag `top_media`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiMedia {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub shortcode: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub comments_count: Option<i64>,
    /// Graph API date-time, e.g. `2020-05-12T10:00:00+0000`.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
}

/// A media node scraped from a public account or hashtag page.
///
/// Web responses may also carry any of the flat keys of the API shape
/// (`username`, `like_count`, `caption`, `media_url`, ...). They are kept
/// and take part in the same fallback chains as for API posts.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScrapedMedia {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub shortcode: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub comments_count: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(rename = "__typename", default)]
    pub typename: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub thumbnail_resources: Option<Vec<ThumbnailResource>>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub edge_liked_by: Option<EdgeCount>,
    #[serde(default)]
    pub edge_media_to_caption: Option<CaptionEdges>,
    #[serde(default)]
    pub edge_media_to_comment: Option<EdgeCount>,
    #[serde(default)]
    pub taken_at_timestamp: Option<i64>,
    #[serde(default)]
    pub owner: Option<Owner>,
}

/// A post in one of the two upstream shapes.
#[derive(Debug, Clone)]
pub enum RawPost {
    Api(ApiMedia),
    Scraped(ScrapedMedia),
}

/// A public profile scraped from `/{username}/?__a=1`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScrapedProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub edge_followed_by: Option<EdgeCount>,
    #[serde(default)]
    pub edge_follow: Option<EdgeCount>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub profile_pic_url_hd: Option<String>,
}

/// Anything an acquisition strategy can return.
#[derive(Debug, Clone)]
pub enum RawRecord {
    Post(RawPost),
    Profile(ScrapedProfile),
}

// ═══════════════════════════════════════════════════════════════════════
// Normalized records
// ═══════════════════════════════════════════════════════════════════════

/// A normalized post (account or hashtag feed).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub username: Option<String>,
    pub id: Option<String>,
    pub likes: Option<i64>,
    pub caption: Option<String>,
    pub thumbnails: Option<Vec<ThumbnailResource>>,
    pub media_type: Option<String>,
    pub preview: Option<String>,
    pub original: Option<String>,
    pub timestamp: Option<i64>,
    pub dimensions: Option<Dimensions>,
    pub created_at: Option<String>,
    pub permalink: Option<String>,
    pub comments: Option<i64>,
}

/// A normalized public profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub biography: Option<String>,
    pub edge_followed_by: Option<EdgeCount>,
    pub edge_follow: Option<EdgeCount>,
    pub profile_pic_url: Option<String>,
    pub profile_pic_url_hd: Option<String>,
    pub username: Option<String>,
}

/// Normalized content, the input to fingerprinting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordContent {
    Post(PostRecord),
    User(UserRecord),
}

impl RecordContent {
    pub fn id(&self) -> Option<&str> {
        match self {
            RecordContent::Post(p) => p.id.as_deref(),
            RecordContent::User(u) => u.id.as_deref(),
        }
    }
}

/// A locally cached copy of a remote media file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaArtifact {
    pub id: String,
    pub parent_id: String,
    pub url: String,
    pub path: PathBuf,
}

/// A finalized record: normalized content, its digest, and an optional
/// link to the cached media file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(flatten)]
    pub content: RecordContent,
    pub content_digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_file: Option<MediaArtifact>,
}
