//! Content fingerprints for document identity

use super::Document;
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 content hash of a document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already computed hex digest (e.g. one read back from storage)
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the content fingerprint of a document
///
/// The hash covers the normalized title, the web link and the text-or-abstract,
/// so dates and metadata never affect identity.
pub fn fingerprint(doc: &Document) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(normalize(&doc.title).as_bytes());
    hasher.update(b"\n");
    hasher.update(doc.web_link.trim().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalize(doc.content()).as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
