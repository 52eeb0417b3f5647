/*!
 * Content fingerprints.
 *
 * A fingerprint is a SHA-256 digest over the canonical JSON encoding of
 * the translatable fields of an article. It is the cache key for document
 * translations and the unit of change detection.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::document::{plain_text, Article};

/// Hex-encoded SHA-256 digest of translatable content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed hex digest
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fingerprint of one text segment
    pub fn of_text(text: &str) -> Self {
        Self(digest(text.as_bytes()))
    }

    /// Fingerprint of an ordered list of source segments
    pub fn of_segments(segments: &[String]) -> Self {
        // Serializing a list of strings cannot fail
        let encoded = serde_json::to_vec(segments).unwrap_or_default();
        Self(digest(&encoded))
    }

    /// Fingerprint of an article's translatable fields
    pub fn of_article(article: &Article) -> Self {
        fingerprint(
            &plain_text(&article.body),
            &article.title,
            article.excerpt.as_deref(),
            &article.tags,
        )
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct CanonicalContent<'a> {
    body: &'a str,
    title: &'a str,
    excerpt: Option<&'a str>,
    tags: &'a [String],
}

/// Compute the fingerprint of `(trimmed body, title, excerpt, tags)`
pub fn fingerprint(body: &str, title: &str, excerpt: Option<&str>, tags: &[String]) -> Fingerprint {
    let canonical = CanonicalContent {
        body: body.trim(),
        title,
        excerpt,
        tags,
    };

    // Serializing a struct of strings cannot fail
    let encoded = serde_json::to_vec(&canonical).unwrap_or_default();
    Fingerprint(digest(&encoded))
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
