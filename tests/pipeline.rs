//! Pipeline tests against in-memory `Provider` and `MediaCache` fakes.
//!
//! These cover strategy dispatch, the token-exchange flow, hashtag
//! username substitution, digest stability, and media failure handling
//! without any network access.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use insta_harness::error::{HarnessError, Result};
use insta_harness::fingerprint;
use insta_harness::ingest::Pipeline;
use insta_harness::models::{
    AcquisitionOptions, ApiMedia, ContentType, EdgeCount, MediaArtifact, OAuthTriple, RawPost,
    RawRecord, RecordContent, ScrapedMedia, ScrapedProfile,
};
use insta_harness::normalize::normalize;
use insta_harness::progress::NoProgress;
use insta_harness::router;
use insta_harness::traits::{MediaCache, Provider};

// ═══════════════════════════════════════════════════════════════════════
// Fakes
// ═══════════════════════════════════════════════════════════════════════

/// Records every call and the options it was made with.
#[derive(Default)]
struct FakeProvider {
    calls: Mutex<Vec<(String, AcquisitionOptions)>>,
    exchanges: AtomicUsize,
    fail_acquisition: bool,
    /// Replaces the default two-post batch when set.
    batch: Option<Vec<RawPost>>,
}

impl FakeProvider {
    fn failing() -> Self {
        Self {
            fail_acquisition: true,
            ..Default::default()
        }
    }

    fn with_batch(batch: Vec<RawPost>) -> Self {
        Self {
            batch: Some(batch),
            ..Default::default()
        }
    }

    fn record(&self, name: &str, opts: &AcquisitionOptions) {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), opts.clone()));
    }

    fn call_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn last_options(&self) -> AcquisitionOptions {
        self.calls.lock().unwrap().last().unwrap().1.clone()
    }

    fn posts(&self) -> Result<Vec<RawPost>> {
        if self.fail_acquisition {
            return Err(HarnessError::Api {
                status: 400,
                message: "Invalid OAuth access token".into(),
            });
        }
        if let Some(batch) = &self.batch {
            return Ok(batch.clone());
        }
        Ok(vec![
            RawPost::Api(ApiMedia {
                id: Some("17900".into()),
                username: Some("alice".into()),
                media_type: Some("IMAGE".into()),
                media_url: Some("https://cdn.example/a.jpg".into()),
                caption: Some("hello".into()),
                like_count: Some(7),
                timestamp: Some("2020-05-12T10:00:00+0000".into()),
                ..Default::default()
            }),
            RawPost::Scraped(ScrapedMedia {
                id: Some("2".into()),
                shortcode: Some("B2".into()),
                typename: Some("GraphImage".into()),
                display_url: Some("https://cdn.example/b.jpg".into()),
                edge_liked_by: Some(EdgeCount { count: 5 }),
                taken_at_timestamp: Some(1_589_277_600),
                ..Default::default()
            }),
        ])
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn exchange_token(&self, triple: &OAuthTriple) -> Result<String> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        assert_eq!(triple.client_id, "cid");
        assert_eq!(triple.client_secret, "csecret");
        assert_eq!(triple.connection_id, "conn");
        Ok("exchanged-token".into())
    }

    async fn api_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        self.record("api_posts", opts);
        self.posts()
    }

    async fn api_me_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        self.record("api_me_posts", opts);
        self.posts()
    }

    async fn api_hashtag_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        self.record("api_hashtag_posts", opts);
        self.posts()
    }

    async fn scrape_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        self.record("scrape_posts", opts);
        self.posts()
    }

    async fn scrape_hashtag_posts(&self, opts: &AcquisitionOptions) -> Result<Vec<RawPost>> {
        self.record("scrape_hashtag_posts", opts);
        self.posts()
    }

    async fn scrape_profile(&self, opts: &AcquisitionOptions) -> Result<ScrapedProfile> {
        self.record("scrape_profile", opts);
        Ok(ScrapedProfile {
            id: Some("42".into()),
            username: Some("alice".into()),
            full_name: Some("Alice A.".into()),
            edge_followed_by: Some(EdgeCount { count: 1000 }),
            ..Default::default()
        })
    }
}

/// Succeeds for every URL except those containing `fail`.
#[derive(Default)]
struct FakeCache {
    fetched: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MediaCache for FakeCache {
    async fn fetch(&self, url: &str, parent_id: &str) -> Result<MediaArtifact> {
        self.fetched
            .lock()
            .unwrap()
            .push((url.to_string(), parent_id.to_string()));
        if url.contains("fail") {
            return Err(HarnessError::Api {
                status: 404,
                message: "not found".into(),
            });
        }
        Ok(MediaArtifact {
            id: format!("file-{}", parent_id),
            parent_id: parent_id.to_string(),
            url: url.to_string(),
            path: PathBuf::from("/tmp/media").join(parent_id),
        })
    }
}

fn pipeline<'a>(provider: &'a FakeProvider, cache: Option<&'a FakeCache>) -> Pipeline<'a> {
    Pipeline {
        provider,
        media: cache.map(|c| c as &dyn MediaCache),
        concurrency: 4,
        progress: &NoProgress,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Strategy dispatch
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn token_and_id_use_posts_api_without_exchange() {
    let provider = FakeProvider::default();
    let mut opts = AcquisitionOptions {
        access_token: Some("T".into()),
        instagram_id: Some("I".into()),
        ..Default::default()
    };

    let raw = router::acquire(&mut opts, &provider).await.unwrap().unwrap();

    assert_eq!(raw.len(), 2);
    assert_eq!(provider.call_names(), vec!["api_posts"]);
    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn token_only_uses_my_posts_api() {
    let provider = FakeProvider::default();
    let mut opts = AcquisitionOptions {
        access_token: Some("T".into()),
        ..Default::default()
    };

    router::acquire(&mut opts, &provider).await.unwrap();

    assert_eq!(provider.call_names(), vec!["api_me_posts"]);
    assert_eq!(provider.last_options().access_token.as_deref(), Some("T"));
}

#[tokio::test]
async fn oauth_triple_is_exchanged_once_and_scrubbed() {
    let provider = FakeProvider::default();
    let mut opts = AcquisitionOptions {
        client_id: Some("cid".into()),
        client_secret: Some("csecret".into()),
        connection_id: Some("conn".into()),
        ..Default::default()
    };

    router::acquire(&mut opts, &provider).await.unwrap();

    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 1);
    assert_eq!(provider.call_names(), vec!["api_me_posts"]);

    let seen = provider.last_options();
    assert_eq!(seen.access_token.as_deref(), Some("exchanged-token"));
    assert!(seen.client_id.is_none());
    assert!(seen.client_secret.is_none());
    assert!(seen.connection_id.is_none());

    // The caller's options are scrubbed too.
    assert!(opts.client_secret.is_none());
    assert_eq!(opts.access_token.as_deref(), Some("exchanged-token"));
}

#[tokio::test]
async fn no_credentials_scrapes_the_account_page() {
    let provider = FakeProvider::default();
    let mut opts = AcquisitionOptions {
        username: Some("alice".into()),
        ..Default::default()
    };

    router::acquire(&mut opts, &provider).await.unwrap();

    assert_eq!(provider.call_names(), vec!["scrape_posts"]);
}

#[tokio::test]
async fn hashtag_routes_on_token_and_id() {
    let provider = FakeProvider::default();
    let mut scrape = AcquisitionOptions {
        content_type: ContentType::Hashtag,
        hashtag: Some("sunset".into()),
        access_token: Some("T".into()),
        ..Default::default()
    };
    router::acquire(&mut scrape, &provider).await.unwrap();

    let mut api = scrape.clone();
    api.instagram_id = Some("I".into());
    router::acquire(&mut api, &provider).await.unwrap();

    assert_eq!(
        provider.call_names(),
        vec!["scrape_hashtag_posts", "api_hashtag_posts"]
    );
}

#[tokio::test]
async fn profile_is_a_single_record() {
    let provider = FakeProvider::default();
    let mut opts = AcquisitionOptions {
        content_type: ContentType::UserProfile,
        username: Some("alice".into()),
        ..Default::default()
    };

    let raw = router::acquire(&mut opts, &provider).await.unwrap().unwrap();

    assert_eq!(raw.len(), 1);
    assert!(matches!(raw[0], RawRecord::Profile(_)));
}

#[tokio::test]
async fn unknown_type_acquires_nothing() {
    let provider = FakeProvider::default();
    let mut opts = AcquisitionOptions {
        content_type: ContentType::from("unknown-type"),
        access_token: Some("T".into()),
        ..Default::default()
    };

    let raw = router::acquire(&mut opts, &provider).await.unwrap();

    assert!(raw.is_none());
    assert!(provider.call_names().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// End to end through Pipeline
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unknown_type_yields_empty_output() {
    let provider = FakeProvider::default();
    let opts = AcquisitionOptions {
        content_type: ContentType::from("unknown-type"),
        ..Default::default()
    };

    let records = pipeline(&provider, None)
        .run_source("odd", &opts)
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn acquisition_error_aborts_the_source() {
    let provider = FakeProvider::failing();
    let cache = FakeCache::default();
    let opts = AcquisitionOptions {
        access_token: Some("bad".into()),
        ..Default::default()
    };

    let err = pipeline(&provider, Some(&cache))
        .run_source("me", &opts)
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("Invalid OAuth access token"));
    assert!(cache.fetched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn hashtag_posts_take_the_hashtag_as_username() {
    let provider = FakeProvider::default();
    let opts = AcquisitionOptions {
        content_type: ContentType::Hashtag,
        hashtag: Some("sunset".into()),
        ..Default::default()
    };

    let records = pipeline(&provider, None)
        .run_source("tag", &opts)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    for record in &records {
        let RecordContent::Post(post) = &record.content else {
            panic!("expected a post record");
        };
        assert_eq!(post.username.as_deref(), Some("sunset"));
        assert_eq!(post.content_type, ContentType::Hashtag);
    }
}

#[tokio::test]
async fn records_carry_digest_and_local_file() {
    let provider = FakeProvider::default();
    let cache = FakeCache::default();
    let opts = AcquisitionOptions {
        access_token: Some("T".into()),
        ..Default::default()
    };

    let records = pipeline(&provider, Some(&cache))
        .run_source("me", &opts)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(
            record.content_digest,
            fingerprint::fingerprint(&record.content).unwrap()
        );
        let file = record.local_file.as_ref().expect("media linked");
        assert_eq!(Some(file.parent_id.as_str()), record.content.id());
    }

    // Order follows acquisition order.
    assert_eq!(records[0].content.id(), Some("17900"));
    assert_eq!(records[1].content.id(), Some("B2"));
}

#[tokio::test]
async fn media_failure_keeps_the_record() {
    let provider = FakeProvider::default();

    struct AlwaysFails;

    #[async_trait]
    impl MediaCache for AlwaysFails {
        async fn fetch(&self, _url: &str, _parent_id: &str) -> Result<MediaArtifact> {
            Err(HarnessError::Api {
                status: 500,
                message: "cdn down".into(),
            })
        }
    }

    let opts = AcquisitionOptions {
        access_token: Some("T".into()),
        ..Default::default()
    };
    let records = Pipeline {
        provider: &provider,
        media: Some(&AlwaysFails as &dyn MediaCache),
        concurrency: 2,
        progress: &NoProgress,
    }
    .run_source("me", &opts)
    .await
    .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.local_file.is_none()));
    assert!(records.iter().all(|r| !r.content_digest.is_empty()));
}

#[tokio::test]
async fn one_failed_download_in_a_batch() {
    let scraped = |code: &str, url: &str| {
        RawPost::Scraped(ScrapedMedia {
            shortcode: Some(code.into()),
            display_url: Some(url.into()),
            ..Default::default()
        })
    };
    let provider = FakeProvider::with_batch(vec![
        scraped("A", "https://cdn.example/a.jpg"),
        scraped("B", "https://cdn.example/fail/b.jpg"),
        scraped("C", "https://cdn.example/c.jpg"),
        scraped("D", "https://cdn.example/d.jpg"),
    ]);
    let cache = FakeCache::default();
    let opts = AcquisitionOptions {
        username: Some("alice".into()),
        ..Default::default()
    };

    let records = pipeline(&provider, Some(&cache))
        .run_source("alice", &opts)
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.content.id()).collect();
    assert_eq!(ids, vec![Some("A"), Some("B"), Some("C"), Some("D")]);

    let linked: Vec<bool> = records.iter().map(|r| r.local_file.is_some()).collect();
    assert_eq!(linked, vec![true, false, true, true]);
    assert_eq!(cache.fetched.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn profiles_are_not_sent_to_the_media_cache() {
    let provider = FakeProvider::default();
    let cache = FakeCache::default();
    let opts = AcquisitionOptions {
        content_type: ContentType::UserProfile,
        username: Some("alice".into()),
        ..Default::default()
    };

    let records = pipeline(&provider, Some(&cache))
        .run_source("profile", &opts)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].local_file.is_none());
    assert!(cache.fetched.lock().unwrap().is_empty());

    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(json["type"], "user-profile");
    assert_eq!(json["full_name"], "Alice A.");
    assert_eq!(json["edge_followed_by"]["count"], 1000);
}

#[test]
fn identical_content_has_identical_digest() {
    let params = AcquisitionOptions::default();
    let raw = RawRecord::Post(RawPost::Scraped(ScrapedMedia {
        id: Some("9".into()),
        display_url: Some("https://cdn.example/x.jpg".into()),
        ..Default::default()
    }));

    let a = fingerprint::seal(normalize(&raw, &params)).unwrap();
    let b = fingerprint::seal(normalize(&raw.clone(), &params)).unwrap();
    assert_eq!(a.content_digest, b.content_digest);

    let other = RawRecord::Post(RawPost::Scraped(ScrapedMedia {
        id: Some("10".into()),
        display_url: Some("https://cdn.example/x.jpg".into()),
        ..Default::default()
    }));
    let c = fingerprint::seal(normalize(&other, &params)).unwrap();
    assert_ne!(a.content_digest, c.content_digest);
}
