use canon_core::ContentItem;
use serde::{Deserialize, Serialize};

/// Item at `duplicate` hashes identically to the earlier item at `original`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactDuplicatePair {
    pub original: usize,
    pub duplicate: usize,
}

/// Two items whose estimated Jaccard similarity reached the threshold.
/// Always `index_a < index_b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearDuplicatePair {
    pub index_a: usize,
    pub index_b: usize,
    pub similarity: f64,
}

/// Why a canonical item won its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    HighestQuality,
    MostComplete,
    OriginalSource,
    ComprehensiveAssessment,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighestQuality => "HIGHEST_QUALITY",
            Self::MostComplete => "MOST_COMPLETE",
            Self::OriginalSource => "ORIGINAL_SOURCE",
            Self::ComprehensiveAssessment => "COMPREHENSIVE_ASSESSMENT",
        }
    }
}

/// A connected component of the similarity graph with its chosen canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub group_key: String,
    pub canonical: usize,
    /// All member indices, ascending, canonical included.
    pub members: Vec<usize>,
    /// Members other than the canonical, ascending.
    pub duplicates: Vec<usize>,
    pub count: usize,
    pub reason: ReasonCode,
    /// Mean score of the above-threshold edges inside the group.
    pub similarity: f64,
}

/// Position of an item inside its version chain. Links are corpus indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub chain_key: String,
    pub version_number: usize,
    pub total_versions: usize,
    pub is_latest: bool,
    /// The next older version.
    pub previous: Option<usize>,
    /// The next newer version.
    pub next: Option<usize>,
}

/// An input item with its version annotation, if it belongs to a chain.
#[derive(Debug, Clone, Serialize)]
pub struct VersionedItem<'a> {
    pub index: usize,
    pub item: &'a ContentItem,
    pub version: Option<VersionInfo>,
}
