//! Field normalization.
//!
//! Posts arrive in two incompatible shapes: Graph API media objects and
//! scraped page nodes. Each output field of [`PostRecord`] is resolved
//! through a *fallback chain*: an ordered list of accessors over
//! [`RawPost`], where the first accessor that yields a value wins. An
//! accessor that does not apply to a shape returns `None`, so every chain
//! can be read (and tested) as a plain table:
//!
//! | Field | Chain |
//! |-------|-------|
//! | `username` | `username` → `owner.username` (hashtag feeds use the hashtag) |
//! | `id` | `shortcode` → `id` |
//! | `likes` | `edge_liked_by.count` → `like_count` |
//! | `caption` | `edge_media_to_caption.edges[0].node.text` → `caption` |
//! | `mediaType` | `__typename` → `media_type` |
//! | `preview` | `display_url` → `thumbnail_url` → `media_url` |
//! | `original` | `display_url` → `media_url` |
//! | `timestamp` | `taken_at_timestamp` → `timestamp` as epoch seconds |
//! | `comments` | `edge_media_to_comment.count` → `comments_count` |
//!
//! `createdAt` is not a chain: it is always derived from the API
//! `timestamp` string alone, so scraped posts (which only carry
//! `taken_at_timestamp`) have no `createdAt`. That asymmetry is deliberate
//! and kept as-is.
//!
//! Profiles map field-for-field onto [`UserRecord`].

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use crate::models::{
    AcquisitionOptions, ApiMedia, ContentType, Dimensions, PostRecord, RawPost, RawRecord,
    RecordContent, ScrapedMedia, ScrapedProfile, ThumbnailResource, UserRecord,
};

/// Reads one candidate source for an output field.
pub type Accessor<T> = fn(&RawPost) -> Option<T>;

pub const USERNAME_CHAIN: &[Accessor<String>] = &[RawPost::username, RawPost::owner_username];
pub const ID_CHAIN: &[Accessor<String>] = &[RawPost::shortcode, RawPost::id];
pub const LIKES_CHAIN: &[Accessor<i64>] = &[RawPost::edge_like_count, RawPost::like_count];
pub const CAPTION_CHAIN: &[Accessor<String>] = &[RawPost::caption_edge_text, RawPost::caption];
pub const MEDIA_TYPE_CHAIN: &[Accessor<String>] = &[RawPost::typename, RawPost::media_type];
pub const PREVIEW_CHAIN: &[Accessor<String>] = &[
    RawPost::display_url,
    RawPost::thumbnail_url,
    RawPost::media_url,
];
pub const ORIGINAL_CHAIN: &[Accessor<String>] = &[RawPost::display_url, RawPost::media_url];
pub const TIMESTAMP_CHAIN: &[Accessor<i64>] =
    &[RawPost::taken_at_timestamp, RawPost::timestamp_epoch];
pub const COMMENTS_CHAIN: &[Accessor<i64>] =
    &[RawPost::edge_comment_count, RawPost::comments_count];

/// Evaluate `chain` left to right and return the first defined value.
pub fn first_defined<T>(post: &RawPost, chain: &[Accessor<T>]) -> Option<T> {
    chain.iter().find_map(|accessor| accessor(post))
}

/// Normalize one raw record.
///
/// The record's own variant decides the output variant; the router only
/// produces profiles for `user-profile` sources.
pub fn normalize(raw: &RawRecord, params: &AcquisitionOptions) -> RecordContent {
    match raw {
        RawRecord::Post(post) => RecordContent::Post(normalize_post(post, params)),
        RawRecord::Profile(profile) => RecordContent::User(normalize_profile(profile, params)),
    }
}

pub fn normalize_post(post: &RawPost, params: &AcquisitionOptions) -> PostRecord {
    let username = match params.content_type {
        ContentType::Hashtag => params.hashtag.clone(),
        _ => first_defined(post, USERNAME_CHAIN),
    };

    PostRecord {
        content_type: params.content_type.clone(),
        username,
        id: first_defined(post, ID_CHAIN),
        likes: first_defined(post, LIKES_CHAIN),
        caption: first_defined(post, CAPTION_CHAIN),
        thumbnails: post.thumbnails(),
        media_type: first_defined(post, MEDIA_TYPE_CHAIN),
        preview: first_defined(post, PREVIEW_CHAIN),
        original: first_defined(post, ORIGINAL_CHAIN),
        timestamp: first_defined(post, TIMESTAMP_CHAIN),
        dimensions: post.dimensions(),
        created_at: post.created_at(),
        permalink: post.permalink(),
        comments: first_defined(post, COMMENTS_CHAIN),
    }
}

pub fn normalize_profile(profile: &ScrapedProfile, params: &AcquisitionOptions) -> UserRecord {
    UserRecord {
        content_type: params.content_type.clone(),
        id: profile.id.clone(),
        full_name: profile.full_name.clone(),
        biography: profile.biography.clone(),
        edge_followed_by: profile.edge_followed_by.clone(),
        edge_follow: profile.edge_follow.clone(),
        profile_pic_url: profile.profile_pic_url.clone(),
        profile_pic_url_hd: profile.profile_pic_url_hd.clone(),
        username: profile.username.clone(),
    }
}

/// Which upstream shape a saved JSON payload is in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum RawShape {
    Api,
    Scraped,
    Profile,
}

/// Parse a saved payload (one object or an array of objects) of `shape`.
pub fn parse_raw(json: &str, shape: RawShape) -> Result<Vec<RawRecord>> {
    let value: serde_json::Value = serde_json::from_str(json).context("Invalid JSON payload")?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let raw = match shape {
                RawShape::Api => RawRecord::Post(RawPost::Api(from_item::<ApiMedia>(item, i)?)),
                RawShape::Scraped => {
                    RawRecord::Post(RawPost::Scraped(from_item::<ScrapedMedia>(item, i)?))
                }
                RawShape::Profile => RawRecord::Profile(from_item::<ScrapedProfile>(item, i)?),
            };
            Ok(raw)
        })
        .collect()
}

/// Reject a payload shape that cannot produce records of `content_type`.
///
/// Profiles normalize only as `user-profile`, and posts never do.
pub fn check_shape(shape: RawShape, content_type: &ContentType) -> Result<()> {
    let profile_type = *content_type == ContentType::UserProfile;
    match (shape, profile_type) {
        (RawShape::Profile, false) => bail!(
            "A profile payload needs --type user-profile (got '{}')",
            content_type
        ),
        (RawShape::Api | RawShape::Scraped, true) => bail!(
            "A user-profile record needs --shape profile (got a post payload)"
        ),
        _ => Ok(()),
    }
}

fn from_item<T: DeserializeOwned>(item: serde_json::Value, index: usize) -> Result<T> {
    serde_json::from_value(item).with_context(|| format!("Item {} does not match the shape", index))
}

/// Parse an upstream date-time.
///
/// Accepts RFC 3339 and the Graph API's `+0000` offset form; a value
/// without an offset is read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

// ============ Accessors ============

impl RawPost {
    pub fn id(&self) -> Option<String> {
        match self {
            RawPost::Api(m) => m.id.clone(),
            RawPost::Scraped(m) => m.id.clone(),
        }
    }

    pub fn shortcode(&self) -> Option<String> {
        match self {
            RawPost::Api(m) => m.shortcode.clone(),
            RawPost::Scraped(m) => m.shortcode.clone(),
        }
    }

    pub fn username(&self) -> Option<String> {
        match self {
            RawPost::Api(m) => m.username.clone(),
            RawPost::Scraped(m) => m.username.clone(),
        }
    }

    pub fn owner_username(&self) -> Option<String> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m.owner.as_ref().and_then(|o| o.username.clone()),
        }
    }

    pub fn edge_like_count(&self) -> Option<i64> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m.edge_liked_by.as_ref().map(|e| e.count),
        }
    }

    pub fn like_count(&self) -> Option<i64> {
        match self {
            RawPost::Api(m) => m.like_count,
            RawPost::Scraped(m) => m.like_count,
        }
    }

    pub fn caption_edge_text(&self) -> Option<String> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m
                .edge_media_to_caption
                .as_ref()
                .and_then(|c| c.edges.first())
                .and_then(|e| e.node.text.clone()),
        }
    }

    pub fn caption(&self) -> Option<String> {
        match self {
            RawPost::Api(m) => m.caption.clone(),
            RawPost::Scraped(m) => m.caption.clone(),
        }
    }

    pub fn typename(&self) -> Option<String> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m.typename.clone(),
        }
    }

    pub fn media_type(&self) -> Option<String> {
        match self {
            RawPost::Api(m) => m.media_type.clone(),
            RawPost::Scraped(m) => m.media_type.clone(),
        }
    }

    pub fn display_url(&self) -> Option<String> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m.display_url.clone(),
        }
    }

    pub fn thumbnail_url(&self) -> Option<String> {
        match self {
            RawPost::Api(m) => m.thumbnail_url.clone(),
            RawPost::Scraped(m) => m.thumbnail_url.clone(),
        }
    }

    pub fn media_url(&self) -> Option<String> {
        match self {
            RawPost::Api(m) => m.media_url.clone(),
            RawPost::Scraped(m) => m.media_url.clone(),
        }
    }

    pub fn taken_at_timestamp(&self) -> Option<i64> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m.taken_at_timestamp,
        }
    }

    /// The flat `timestamp` string, converted to epoch seconds.
    pub fn timestamp_epoch(&self) -> Option<i64> {
        self.raw_timestamp()
            .and_then(parse_timestamp)
            .map(|dt| dt.timestamp())
    }

    /// The flat `timestamp` string as ISO-8601 with milliseconds.
    pub fn created_at(&self) -> Option<String> {
        self.raw_timestamp()
            .and_then(parse_timestamp)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    fn raw_timestamp(&self) -> Option<&str> {
        match self {
            RawPost::Api(m) => m.timestamp.as_deref(),
            RawPost::Scraped(m) => m.timestamp.as_deref(),
        }
    }

    pub fn edge_comment_count(&self) -> Option<i64> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m.edge_media_to_comment.as_ref().map(|e| e.count),
        }
    }

    pub fn comments_count(&self) -> Option<i64> {
        match self {
            RawPost::Api(m) => m.comments_count,
            RawPost::Scraped(m) => m.comments_count,
        }
    }

    pub fn thumbnails(&self) -> Option<Vec<ThumbnailResource>> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m.thumbnail_resources.clone(),
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        match self {
            RawPost::Api(_) => None,
            RawPost::Scraped(m) => m.dimensions.clone(),
        }
    }

    pub fn permalink(&self) -> Option<String> {
        match self {
            RawPost::Api(m) => m.permalink.clone(),
            RawPost::Scraped(m) => m.permalink.clone(),
        }
    }
}
