//! Fingerprinter: SHA-256 of normalized text for byte-level duplicates.

use crate::normalize::normalize;
use crate::types::ExactDuplicatePair;
use canon_core::{ContentItem, FingerprintScope};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// 256-bit digest of normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn of_normalized(normalized: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Normalized text an item is identified by under `scope`.
pub fn fingerprint_text(item: &ContentItem, scope: FingerprintScope) -> String {
    match scope {
        FingerprintScope::Content => {
            let body = normalize(&item.content);
            if body.is_empty() { normalize(&item.title) } else { body }
        }
        FingerprintScope::TitleAndContent => normalize(&format!("{}{}", item.title, item.content)),
    }
}

pub fn fingerprint(item: &ContentItem, scope: FingerprintScope) -> Fingerprint {
    Fingerprint::of_normalized(&fingerprint_text(item, scope))
}

/// Report every item whose fingerprint was already seen, paired with the
/// first occurrence. Single pass, O(n).
pub fn detect_exact_duplicates(
    items: &[ContentItem],
    scope: FingerprintScope,
) -> Vec<ExactDuplicatePair> {
    let fingerprints: Vec<Fingerprint> = items.iter().map(|i| fingerprint(i, scope)).collect();
    exact_pairs(&fingerprints)
}

pub(crate) fn exact_pairs(fingerprints: &[Fingerprint]) -> Vec<ExactDuplicatePair> {
    let mut first_seen: HashMap<Fingerprint, usize> = HashMap::with_capacity(fingerprints.len());
    let mut pairs = Vec::new();
    for (idx, fp) in fingerprints.iter().enumerate() {
        match first_seen.get(fp) {
            Some(&original) => pairs.push(ExactDuplicatePair { original, duplicate: idx }),
            None => {
                first_seen.insert(*fp, idx);
            }
        }
    }
    tracing::debug!(items = fingerprints.len(), exact = pairs.len(), "exact duplicate pass");
    pairs
}
