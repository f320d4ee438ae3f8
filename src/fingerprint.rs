//! Content digests for change detection.
//!
//! A digest is the SHA-256 of the record's JSON serialization. Struct
//! fields serialize in declaration order and nested maps are sorted, so
//! two records with the same field values always produce the same bytes.
//! The digest covers [`RecordContent`] only: it is computed before the
//! digest itself exists and before media resolution adds `localFile`.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::models::{Record, RecordContent};

/// Hex-encoded SHA-256 of `content`.
pub fn fingerprint(content: &RecordContent) -> Result<String> {
    let bytes = serde_json::to_vec(content)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint `content` and wrap it into an unresolved [`Record`].
pub fn seal(content: RecordContent) -> Result<Record> {
    let content_digest = fingerprint(&content)?;
    Ok(Record {
        content,
        content_digest,
        local_file: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, PostRecord};

    fn post() -> RecordContent {
        RecordContent::Post(PostRecord {
            content_type: ContentType::Account,
            username: Some("alice".into()),
            id: Some("B_abc".into()),
            likes: Some(5),
            caption: Some("golden hour".into()),
            thumbnails: None,
            media_type: Some("GraphImage".into()),
            preview: Some("https://cdn.example/p.jpg".into()),
            original: Some("https://cdn.example/p.jpg".into()),
            timestamp: Some(1_589_277_600),
            dimensions: None,
            created_at: None,
            permalink: None,
            comments: Some(2),
        })
    }

    #[test]
    fn identical_records_share_a_digest() {
        let a = fingerprint(&post()).unwrap();
        let b = fingerprint(&post()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn any_field_change_changes_the_digest() {
        let base = fingerprint(&post()).unwrap();

        let mut changed = post();
        if let RecordContent::Post(p) = &mut changed {
            p.likes = Some(6);
        }
        assert_ne!(base, fingerprint(&changed).unwrap());

        let mut changed = post();
        if let RecordContent::Post(p) = &mut changed {
            p.caption = None;
        }
        assert_ne!(base, fingerprint(&changed).unwrap());
    }

    #[test]
    fn seal_leaves_media_unresolved() {
        let record = seal(post()).unwrap();
        assert_eq!(record.content_digest, fingerprint(&post()).unwrap());
        assert!(record.local_file.is_none());
    }
}
