//! Canonical selector: composite scoring and winner choice per group.
//!
//! ```text
//! score = w_q·quality + w_c·min(words/full_length, 1) + w_r·reputation(domain) + w_t·recency
//! ```
//!
//! Recency is relative to the group: the earliest timestamp scores 1.0, the
//! latest 0.0. Items without a timestamp score 0.0 and are treated as the
//! most recent copy.

use crate::normalize::normalize;
use crate::types::ReasonCode;
use canon_core::{CanonicalWeights, ContentItem, ReputationSource, ValidationError};

/// Per-member score breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberScore {
    pub index: usize,
    pub quality: f64,
    pub word_count: usize,
    pub reputation: f64,
    pub recency: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalChoice {
    pub winner: usize,
    pub reason: ReasonCode,
    pub scores: Vec<MemberScore>,
}

fn recency_weights(items: &[ContentItem], members: &[usize]) -> Vec<f64> {
    let stamps: Vec<Option<i64>> = members
        .iter()
        .map(|&i| items[i].timestamp.map(|t| t.timestamp_millis()))
        .collect();
    let earliest = stamps.iter().flatten().min().copied();
    let latest = stamps.iter().flatten().max().copied();
    stamps
        .iter()
        .map(|ts| match (ts, earliest, latest) {
            (Some(ts), Some(lo), Some(hi)) if hi > lo => (hi - ts) as f64 / (hi - lo) as f64,
            (Some(_), _, _) => 1.0,
            (None, _, _) => 0.0,
        })
        .collect()
}

/// Score every member of a group and pick the winner.
///
/// Highest total wins; ties go to the lowest corpus index. `members` may be
/// in any order but every entry must index into `items`.
pub fn select_canonical(
    items: &[ContentItem],
    members: &[usize],
    reputation: &dyn ReputationSource,
    weights: &CanonicalWeights,
) -> Result<CanonicalChoice, ValidationError> {
    if members.is_empty() {
        return Err(ValidationError::EmptyGroup);
    }
    weights.validate()?;
    if let Some(&index) = members.iter().find(|&&i| i >= items.len()) {
        return Err(ValidationError::MemberOutOfRange { index, len: items.len() });
    }

    let mut members = members.to_vec();
    members.sort_unstable();
    members.dedup();

    let recency = recency_weights(items, &members);
    let scores: Vec<MemberScore> = members
        .iter()
        .zip(recency)
        .map(|(&index, recency)| {
            let item = &items[index];
            let quality = item.effective_quality();
            let word_count = normalize(&item.content).split_whitespace().count();
            let completeness = (word_count as f64 / weights.full_length_words as f64).min(1.0);
            let reputation = reputation.score(item.domain().as_deref());
            let total = weights.quality * quality
                + weights.completeness * completeness
                + weights.reputation * reputation
                + weights.recency * recency;
            MemberScore { index, quality, word_count, reputation, recency, total }
        })
        .collect();

    let mut best = 0;
    for (pos, s) in scores.iter().enumerate().skip(1) {
        if s.total > scores[best].total {
            best = pos;
        }
    }
    let reason = reason_for(items, &scores, best);
    let winner = scores[best].index;
    tracing::debug!(winner, reason = reason.as_str(), members = scores.len(), "canonical selected");
    Ok(CanonicalChoice { winner, reason, scores })
}

fn reason_for(items: &[ContentItem], scores: &[MemberScore], best: usize) -> ReasonCode {
    let winner = &scores[best];
    let others = || scores.iter().enumerate().filter(move |(pos, _)| *pos != best).map(|(_, s)| s);

    if others().all(|s| winner.quality > s.quality) {
        return ReasonCode::HighestQuality;
    }
    if others().all(|s| winner.word_count > s.word_count) {
        return ReasonCode::MostComplete;
    }
    if let Some(ts) = items[winner.index].timestamp {
        let earliest = others().all(|s| items[s.index].timestamp.map_or(true, |other| ts < other));
        if earliest {
            return ReasonCode::OriginalSource;
        }
    }
    ReasonCode::ComprehensiveAssessment
}
