//! Seams between the pipeline and the outside world.
//!
//! The ingest pipeline never talks to the network directly. It goes through
//! two traits:
//!
//! ```text
//! ┌──────────────────────────────┐      ┌────────────────────────┐
//! │          Provider            │      │       MediaCache       │
//! │  Graph API / scraping / auth │      │  download + store file │
//! └──────────────┬───────────────┘      └───────────┬────────────┘
//!                ▼                                  ▼
//!          router::acquire()                media::resolve_all()
//! ```
//!
//! [`InstagramClient`](crate::provider::InstagramClient) and
//! [`FsMediaCache`](crate::media::FsMediaCache) are the production
//! implementations. Tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AcquisitionOptions, MediaArtifact, OAuthTriple, RawPost, ScrapedProfile};

// ═══════════════════════════════════════════════════════════════════════
// Provider Trait
// ═══════════════════════════════════════════════════════════════════════

/// The upstream content provider's endpoint families.
///
/// Each method performs one acquisition strategy and returns the raw
/// upstream records unchanged. Errors propagate; implementations must not
/// retry.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use insta_harness::error::Result;
/// use insta_harness::models::{AcquisitionOptions, OAuthTriple, RawPost, ScrapedProfile};
/// use insta_harness::traits::Provider;
///
/// pub struct Offline;
///
/// #[async_trait]
/// impl Provider for Offline {
///     async fn exchange_token(&self, _t: &OAuthTriple) -> Result<String> { Ok("tok".into()) }
///     async fn api_posts(&self, _o: &AcquisitionOptions) -> Result<Vec<RawPost>> { Ok(vec![]) }
///     async fn api_me_posts(&self, _o: &AcquisitionOptions) -> Result<Vec<RawPost>> { Ok(vec![]) }
///     async fn api_hashtag_posts(&self, _o: &AcquisitionOptions) -> Result<Vec<RawPost>> { Ok(vec![]) }
///     async fn scrape_posts(&self, _o: &AcquisitionOptions) -> Result<Vec<RawPost>> { Ok(vec![]) }
///     async fn scrape_hashtag_posts(&self, _o: &AcquisitionOptions) -> Result<Vec<RawPost>> { Ok(vec![]) }
///     async fn scrape_profile(&self, _o: &AcquisitionOptions) -> Result<ScrapedProfile> {
///         Ok(ScrapedProfile::default())
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Exchange client credentials for a bearer access token.
    async fn exchange_token(&self, triple: &OAuthTriple) -> Result<String>;

    /// Posts of the account identified by `instagram_id`, authenticated.
    async fn api_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>>;

    /// Posts of the account that owns `access_token`.
    async fn api_me_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>>;

    /// Top posts for `hashtag`, authenticated as `instagram_id`.
    async fn api_hashtag_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>>;

    /// Posts scraped from the public page of `username`.
    async fn scrape_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>>;

    /// Posts scraped from the public page of `hashtag`.
    async fn scrape_hashtag_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>>;

    /// The public profile of `username`.
    async fn scrape_profile(&self, opts: &AcquisitionOptions) -> Result<ScrapedProfile>;
}

// ═══════════════════════════════════════════════════════════════════════
// MediaCache Trait
// ═══════════════════════════════════════════════════════════════════════

/// A store for remote media files.
///
/// Given a URL and the id of the record that references it, fetch and
/// store the file and return the resulting [`MediaArtifact`]. Concurrency
/// safety between simultaneous `fetch` calls is the implementation's
/// responsibility.
#[async_trait]
pub trait MediaCache: Send + Sync {
    async fn fetch(&self, url: &str, parent_id: &str) -> Result<MediaArtifact>;
}
