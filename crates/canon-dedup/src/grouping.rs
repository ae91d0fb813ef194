//! Duplicate grouping: exact pass, pairwise near-duplicate pass and
//! single-link clustering across sources.
//!
//! Scaling: signatures are computed once (O(n) items), then every unordered
//! pair is compared, O(n²) comparisons of O(L) each. Fine for hundreds to
//! low thousands of items; larger corpora need bucketing in front of this.

use crate::cancel::CancelFlag;
use crate::canonical::select_canonical;
use crate::fingerprint::{exact_pairs, fingerprint_text, Fingerprint};
use crate::minhash::{shingle_windows, MinHashSignature, MinHasher};
use crate::types::{DuplicateGroup, ExactDuplicatePair, NearDuplicatePair};
use canon_core::config::check_unit;
use canon_core::{
    ContentItem, EngineConfig, ReputationSource, ValidationError, CURATED_REPUTATION,
    DEFAULT_SHINGLE_SIZE, DEFAULT_SIGNATURE_LENGTH,
};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

const DEFAULT_WINDOW: NonZeroUsize = match NonZeroUsize::new(DEFAULT_SHINGLE_SIZE) {
    Some(k) => k,
    None => panic!("default shingle size must be positive"),
};

/// Union-find whose roots are always the lowest index of their set, so the
/// partition does not depend on the order edges are merged in.
#[derive(Debug, Clone)]
pub(crate) struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    pub(crate) fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }

    /// Components with at least `min_size` members, ordered by lowest
    /// member, members ascending.
    pub(crate) fn components(&mut self, min_size: usize) -> Vec<Vec<usize>> {
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }
        by_root.into_values().filter(|c| c.len() >= min_size).collect()
    }
}

/// Canonical pair order: score descending, then `(a, b)` ascending.
pub(crate) fn sort_pairs(pairs: &mut [NearDuplicatePair]) {
    pairs.sort_by(|x, y| {
        y.similarity
            .partial_cmp(&x.similarity)
            .unwrap_or(Ordering::Equal)
            .then(x.index_a.cmp(&y.index_a))
            .then(x.index_b.cmp(&y.index_b))
    });
}

fn equal_fraction(a: &MinHashSignature, b: &MinHashSignature) -> f64 {
    let matches = a.values().iter().zip(b.values()).filter(|(x, y)| x == y).count();
    matches as f64 / a.len() as f64
}

/// Exact and near duplicate detection under one configuration.
#[derive(Clone)]
pub struct DuplicateDetector {
    config: EngineConfig,
    /// `config.shingle_size`, checked once at construction.
    window: NonZeroUsize,
    hasher: MinHasher,
    reputation: Arc<dyn ReputationSource>,
}

impl std::fmt::Debug for DuplicateDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateDetector").field("config", &self.config).finish_non_exhaustive()
    }
}

impl DuplicateDetector {
    pub fn new(config: EngineConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let window = NonZeroUsize::new(config.shingle_size)
            .ok_or(ValidationError::InvalidShingleSize(config.shingle_size))?;
        let hasher = MinHasher::new(config.signature_length)?;
        Ok(Self {
            config,
            window,
            hasher,
            reputation: Arc::new(&*CURATED_REPUTATION),
        })
    }

    /// Replace the curated reputation table.
    pub fn with_reputation(mut self, reputation: Arc<dyn ReputationSource>) -> Self {
        self.reputation = reputation;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reputation(&self) -> &dyn ReputationSource {
        self.reputation.as_ref()
    }

    pub fn fingerprints(&self, items: &[ContentItem]) -> Vec<Fingerprint> {
        let scope = self.config.fingerprint_scope;
        let fp = |item: &ContentItem| Fingerprint::of_normalized(&fingerprint_text(item, scope));
        if self.config.parallel {
            items.par_iter().map(fp).collect()
        } else {
            items.iter().map(fp).collect()
        }
    }

    pub fn signature(&self, item: &ContentItem) -> MinHashSignature {
        let text = fingerprint_text(item, self.config.fingerprint_scope);
        self.hasher.sign(&shingle_windows(&text, self.window))
    }

    /// One signature per item, in input order.
    pub fn signatures(&self, items: &[ContentItem]) -> Vec<MinHashSignature> {
        if self.config.parallel {
            items.par_iter().map(|i| self.signature(i)).collect()
        } else {
            items.iter().map(|i| self.signature(i)).collect()
        }
    }

    pub fn detect_exact_duplicates(&self, items: &[ContentItem]) -> Vec<ExactDuplicatePair> {
        exact_pairs(&self.fingerprints(items))
    }

    /// All pairs with estimated similarity `>= threshold`, sorted by score
    /// descending then index ascending.
    pub fn detect_near_duplicates(
        &self,
        items: &[ContentItem],
        threshold: f64,
    ) -> Result<Vec<NearDuplicatePair>, ValidationError> {
        check_unit("near_duplicate_threshold", threshold)?;
        let signatures = self.signatures(items);
        Ok(self.compare_all(&signatures, threshold, None).unwrap_or_default())
    }

    /// Connected components of the above-threshold similarity graph, each
    /// with its canonical member. Singletons are dropped.
    pub fn group_cross_source_duplicates(
        &self,
        items: &[ContentItem],
        threshold: f64,
    ) -> Result<Vec<DuplicateGroup>, ValidationError> {
        check_unit("near_duplicate_threshold", threshold)?;
        let signatures = self.signatures(items);
        let pairs = self.compare_all(&signatures, threshold, None).unwrap_or_default();
        self.build_groups(items, &self.fingerprints(items), &pairs)
    }

    /// Upper-triangle comparison, one rayon task per row. Returns `None`
    /// when `cancel` fires before every row is done.
    pub(crate) fn compare_all(
        &self,
        signatures: &[MinHashSignature],
        threshold: f64,
        cancel: Option<&CancelFlag>,
    ) -> Option<Vec<NearDuplicatePair>> {
        let n = signatures.len();
        let row = |i: usize| -> Option<Vec<NearDuplicatePair>> {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return None;
            }
            let a = &signatures[i];
            Some(
                ((i + 1)..n)
                    .filter_map(|j| {
                        let similarity = equal_fraction(a, &signatures[j]);
                        (similarity >= threshold).then_some(NearDuplicatePair {
                            index_a: i,
                            index_b: j,
                            similarity,
                        })
                    })
                    .collect(),
            )
        };

        let rows: Option<Vec<Vec<NearDuplicatePair>>> = if self.config.parallel {
            (0..n).into_par_iter().map(row).collect()
        } else {
            (0..n).map(row).collect()
        };
        let mut pairs: Vec<NearDuplicatePair> = rows?.into_iter().flatten().collect();
        sort_pairs(&mut pairs);
        tracing::debug!(
            items = n,
            compared = n * n.saturating_sub(1) / 2,
            near = pairs.len(),
            threshold,
            "near duplicate pass"
        );
        Some(pairs)
    }

    pub(crate) fn build_groups(
        &self,
        items: &[ContentItem],
        fingerprints: &[Fingerprint],
        pairs: &[NearDuplicatePair],
    ) -> Result<Vec<DuplicateGroup>, ValidationError> {
        let mut set = DisjointSet::new(items.len());
        for p in pairs {
            set.union(p.index_a, p.index_b);
        }
        let components = set.components(2);

        let mut edge_totals: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
        for p in pairs {
            let root = set.find(p.index_a);
            let entry = edge_totals.entry(root).or_insert((0.0, 0));
            entry.0 += p.similarity;
            entry.1 += 1;
        }

        let mut groups = Vec::with_capacity(components.len());
        for members in components {
            let choice =
                select_canonical(items, &members, self.reputation(), &self.config.weights)?;
            let first = members[0];
            let similarity = match edge_totals.get(&first) {
                Some(&(sum, count)) if count > 0 => sum / count as f64,
                _ => 0.0,
            };
            let hex = fingerprints[choice.winner].to_hex();
            groups.push(DuplicateGroup {
                group_key: format!("{}-{}", &hex[..16], first),
                canonical: choice.winner,
                duplicates: members.iter().copied().filter(|&m| m != choice.winner).collect(),
                count: members.len(),
                members,
                reason: choice.reason,
                similarity,
            });
        }
        tracing::debug!(groups = groups.len(), "cross-source grouping");
        Ok(groups)
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            window: DEFAULT_WINDOW,
            hasher: MinHasher::seeded(DEFAULT_SIGNATURE_LENGTH),
            reputation: Arc::new(&*CURATED_REPUTATION),
        }
    }
}

/// [`DuplicateDetector::detect_near_duplicates`] with the default configuration.
pub fn detect_near_duplicates(
    items: &[ContentItem],
    threshold: f64,
) -> Result<Vec<NearDuplicatePair>, ValidationError> {
    DuplicateDetector::default().detect_near_duplicates(items, threshold)
}

/// [`DuplicateDetector::group_cross_source_duplicates`] with the default configuration.
pub fn group_cross_source_duplicates(
    items: &[ContentItem],
    threshold: f64,
) -> Result<Vec<DuplicateGroup>, ValidationError> {
    DuplicateDetector::default().group_cross_source_duplicates(items, threshold)
}
