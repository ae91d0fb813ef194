//! Version tracker: chains revisions of the same title, newest first.
//!
//! Uses title similarity only, independent of body grouping.

use crate::fingerprint::Fingerprint;
use crate::grouping::DisjointSet;
use crate::minhash::word_jaccard;
use crate::normalize::normalize;
use crate::types::{VersionInfo, VersionedItem};
use canon_core::config::check_unit;
use canon_core::{ContentItem, ValidationError};
use std::collections::{BTreeSet, HashMap};

/// Title Jaccard a pair must exceed to share a chain.
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Newest first; missing timestamps sort last, ties by index.
fn chain_order(items: &[ContentItem], chain: &mut [usize]) {
    chain.sort_by(|&a, &b| match (items[a].timestamp, items[b].timestamp) {
        (Some(x), Some(y)) => y.cmp(&x).then(a.cmp(&b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(&b),
    });
}

/// Annotate every item with its chain position.
///
/// Titles chain when their normalized fingerprints match or their word-set
/// Jaccard exceeds `title_threshold`, transitively. Empty titles never chain
/// and singletons carry no annotation.
pub fn track_versions(
    items: &[ContentItem],
    title_threshold: f64,
) -> Result<Vec<VersionedItem<'_>>, ValidationError> {
    check_unit("title_similarity_threshold", title_threshold)?;

    let titles: Vec<String> = items.iter().map(|i| normalize(&i.title)).collect();
    let fingerprints: Vec<Fingerprint> =
        titles.iter().map(|t| Fingerprint::of_normalized(t)).collect();
    let word_sets: Vec<BTreeSet<&str>> =
        titles.iter().map(|t| t.split_whitespace().collect()).collect();

    let mut set = DisjointSet::new(items.len());
    let mut first_seen: HashMap<Fingerprint, usize> = HashMap::new();
    for (i, fp) in fingerprints.iter().enumerate() {
        if titles[i].is_empty() {
            continue;
        }
        match first_seen.get(fp) {
            Some(&first) => set.union(first, i),
            None => {
                first_seen.insert(*fp, i);
            }
        }
    }
    // One representative per distinct title is enough for the fuzzy pass.
    let mut distinct: Vec<usize> = first_seen.into_values().collect();
    distinct.sort_unstable();
    for (pos, &i) in distinct.iter().enumerate() {
        for &j in &distinct[pos + 1..] {
            if word_jaccard(&word_sets[i], &word_sets[j]) > title_threshold {
                set.union(i, j);
            }
        }
    }

    let mut annotations: Vec<Option<VersionInfo>> = vec![None; items.len()];
    let mut chains = 0;
    for mut chain in set.components(2) {
        chain_order(items, &mut chain);
        let total = chain.len();
        let chain_key = fingerprints[chain[0]].to_hex()[..16].to_string();
        for (pos, &idx) in chain.iter().enumerate() {
            annotations[idx] = Some(VersionInfo {
                chain_key: chain_key.clone(),
                version_number: total - pos,
                total_versions: total,
                is_latest: pos == 0,
                previous: chain.get(pos + 1).copied(),
                next: pos.checked_sub(1).map(|p| chain[p]),
            });
        }
        chains += 1;
    }
    tracing::debug!(items = items.len(), chains, "version tracking");

    Ok(items
        .iter()
        .zip(annotations)
        .enumerate()
        .map(|(index, (item, version))| VersionedItem { index, item, version })
        .collect())
}
