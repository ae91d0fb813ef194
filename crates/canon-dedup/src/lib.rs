//! Canon dedup — content deduplication and canonical-source selection.
//!
//! Stages:
//! 1. Normalize (lowercase, strip markup, URLs and punctuation)
//! 2. Fingerprint: SHA-256 exact duplicates
//! 3. Shingle + MinHash signatures
//! 4. Near-duplicate pairs and single-link grouping
//! 5. Canonical selection per group
//! 6. Version chains over titles (independent pass)

pub mod cancel;
pub mod canonical;
pub mod fingerprint;
pub mod grouping;
pub mod minhash;
pub mod normalize;
pub mod pipeline;
pub mod types;
pub mod versions;

pub use cancel::CancelFlag;
pub use canonical::{select_canonical, CanonicalChoice, MemberScore};
pub use fingerprint::{detect_exact_duplicates, fingerprint, Fingerprint};
pub use grouping::{detect_near_duplicates, group_cross_source_duplicates, DuplicateDetector};
pub use minhash::{shingle, sign, similarity, MinHashSignature, MinHasher, MINHASH_SEED};
pub use normalize::normalize;
pub use pipeline::{DedupPipeline, DedupReport, GroupSummary, RunStats};
pub use types::*;
pub use versions::{track_versions, TITLE_SIMILARITY_THRESHOLD};

#[cfg(test)]
mod tests;
