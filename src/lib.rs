//! # Insta Harness
//!
//! Ingest Instagram account posts, hashtag feeds, and public profiles into
//! uniform, fingerprinted records with locally cached media.
//!
//! Each configured source picks one acquisition strategy (Graph API by id,
//! Graph API "me", or public-page scraping) based on the credentials it
//! carries. Raw responses in either upstream shape are normalized through
//! explicit fallback chains, hashed, and their preview media downloaded.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────┐   ┌─────────────┐   ┌──────────────┐   ┌────────┐
//! │   Router   │──▶│ Normalize │──▶│ Fingerprint │──▶│    Media     │──▶│ Export │
//! │ API/scrape │   │ fallbacks │   │   SHA-256   │   │ bounded join │   │  JSON  │
//! └─────┬──────┘   └───────────┘   └─────────────┘   └──────────────┘   └────────┘
//!       │
//!       ▼
//! ┌────────────┐
//! │    Auth    │  client id/secret/connection id → access token
//! └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! insta-harness sources                       # show strategy per source
//! insta-harness sync all --output out.json    # ingest every source
//! insta-harness sync travel --format jsonl    # one source, JSON Lines on stdout
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Options, raw upstream shapes, normalized records |
//! | [`traits`] | `Provider` and `MediaCache` seams |
//! | [`auth`] | Connection-token exchange |
//! | [`provider`] | Instagram HTTP client |
//! | [`router`] | Acquisition strategy selection |
//! | [`normalize`] | Fallback-chain field normalization |
//! | [`fingerprint`] | Content digests |
//! | [`media`] | Media download and local cache |
//! | [`ingest`] | Pipeline orchestration |
//! | [`export`] | JSON / JSON Lines output |
//! | [`sources`] | Source listing |
//! | [`progress`] | Sync progress on stderr |

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod ingest;
pub mod media;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod provider;
pub mod router;
pub mod sources;
pub mod traits;
