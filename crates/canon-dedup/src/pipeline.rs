//! Dedup pipeline — runs every stage over one corpus with one configuration.

use crate::cancel::CancelFlag;
use crate::fingerprint::exact_pairs;
use crate::grouping::DuplicateDetector;
use crate::types::{DuplicateGroup, ExactDuplicatePair, NearDuplicatePair, VersionedItem};
use crate::versions::track_versions;
use canon_core::{ContentItem, EngineConfig, ReputationSource, Result, ValidationError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Run statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub items: usize,
    pub pairs_compared: usize,
    pub elapsed_ms: u64,
}

/// `group_key` view of one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub canonical: usize,
    pub duplicates: Vec<usize>,
    pub count: usize,
}

/// Everything one run produces. Built whole; never partially updated.
#[derive(Debug, Clone, Serialize)]
pub struct DedupReport<'a> {
    pub exact_duplicates: Vec<ExactDuplicatePair>,
    pub near_duplicates: Vec<NearDuplicatePair>,
    pub groups: Vec<DuplicateGroup>,
    pub versions: Vec<VersionedItem<'a>>,
    /// The run was cancelled; only `exact_duplicates` is populated.
    pub cancelled: bool,
    pub stats: RunStats,
}

impl DedupReport<'_> {
    pub fn group_map(&self) -> BTreeMap<String, GroupSummary> {
        self.groups
            .iter()
            .map(|g| {
                (g.group_key.clone(), GroupSummary {
                    canonical: g.canonical,
                    duplicates: g.duplicates.clone(),
                    count: g.count,
                })
            })
            .collect()
    }

    /// Canonical index for every item that belongs to a group.
    pub fn canonical_of(&self, index: usize) -> Option<usize> {
        self.groups.iter().find(|g| g.members.binary_search(&index).is_ok()).map(|g| g.canonical)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The main dedup pipeline.
#[derive(Debug, Clone)]
pub struct DedupPipeline {
    detector: DuplicateDetector,
}

impl DedupPipeline {
    pub fn new(config: EngineConfig) -> std::result::Result<Self, ValidationError> {
        Ok(Self { detector: DuplicateDetector::new(config)? })
    }

    pub fn with_reputation(mut self, reputation: Arc<dyn ReputationSource>) -> Self {
        self.detector = self.detector.with_reputation(reputation);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        self.detector.config()
    }

    pub fn detector(&self) -> &DuplicateDetector {
        &self.detector
    }

    pub fn run<'a>(
        &self,
        items: &'a [ContentItem],
    ) -> std::result::Result<DedupReport<'a>, ValidationError> {
        self.run_with_cancel(items, &CancelFlag::new())
    }

    /// Run all stages. If `cancel` fires before the pairwise pass finishes,
    /// the report carries only the exact-duplicate pairs and
    /// `cancelled = true`; this is not an error.
    pub fn run_with_cancel<'a>(
        &self,
        items: &'a [ContentItem],
        cancel: &CancelFlag,
    ) -> std::result::Result<DedupReport<'a>, ValidationError> {
        let started = Instant::now();
        let config = self.detector.config();
        let n = items.len();

        let fingerprints = self.detector.fingerprints(items);
        let exact_duplicates = exact_pairs(&fingerprints);

        let near = if cancel.is_cancelled() {
            None
        } else {
            let signatures = self.detector.signatures(items);
            self.detector.compare_all(&signatures, config.near_duplicate_threshold, Some(cancel))
        };

        let Some(near_duplicates) = near else {
            tracing::warn!(
                items = n,
                exact = exact_duplicates.len(),
                "dedup run cancelled, returning exact duplicates only"
            );
            return Ok(DedupReport {
                exact_duplicates,
                near_duplicates: Vec::new(),
                groups: Vec::new(),
                versions: Vec::new(),
                cancelled: true,
                stats: RunStats { items: n, pairs_compared: 0, elapsed_ms: elapsed_ms(started) },
            });
        };

        let groups = self.detector.build_groups(items, &fingerprints, &near_duplicates)?;
        let versions = track_versions(items, config.title_similarity_threshold)?;

        let stats = RunStats {
            items: n,
            pairs_compared: n * n.saturating_sub(1) / 2,
            elapsed_ms: elapsed_ms(started),
        };
        tracing::info!(
            items = n,
            exact = exact_duplicates.len(),
            near = near_duplicates.len(),
            groups = groups.len(),
            elapsed_ms = stats.elapsed_ms,
            "dedup run complete"
        );
        Ok(DedupReport {
            exact_duplicates,
            near_duplicates,
            groups,
            versions,
            cancelled: false,
            stats,
        })
    }
}

impl Default for DedupPipeline {
    fn default() -> Self {
        Self { detector: DuplicateDetector::default() }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
