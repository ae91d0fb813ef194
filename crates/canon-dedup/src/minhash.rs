//! Shingler, MinHash signer and Jaccard estimator.
//!
//! Signing costs O(|shingles| × L) hash evaluations per item and dominates
//! the per-item work of a run.

use crate::normalize::normalize;
use canon_core::ValidationError;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use xxhash_rust::xxh64::xxh64;

/// Fixed seed every band seed is derived from. Changing it changes every
/// signature, so two engines only agree if they share it.
pub const MINHASH_SEED: u64 = 0x5EED_CA70_1C0D_0001;

const LCG_MUL: u64 = 6364136223846793005;
const LCG_INC: u64 = 1442695040888963407;

/// Contiguous `k`-word windows of `normalize(text)`.
///
/// Text shorter than `k` words yields the single-element set holding the
/// whole normalized text, so the set is never empty.
pub fn shingle(text: &str, k: usize) -> Result<BTreeSet<String>, ValidationError> {
    shingle_normalized(&normalize(text), k)
}

/// As [`shingle`], for text that is already normalized.
pub fn shingle_normalized(
    normalized: &str,
    k: usize,
) -> Result<BTreeSet<String>, ValidationError> {
    let k = NonZeroUsize::new(k).ok_or(ValidationError::InvalidShingleSize(k))?;
    Ok(shingle_windows(normalized, k))
}

pub(crate) fn shingle_windows(normalized: &str, k: NonZeroUsize) -> BTreeSet<String> {
    let k = k.get();
    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.len() < k {
        return BTreeSet::from([words.join(" ")]);
    }
    words.windows(k).map(|w| w.join(" ")).collect()
}

/// Fixed-length MinHash signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MinHashSignature {
    values: Vec<u64>,
}

impl MinHashSignature {
    /// Wrap raw band minima, e.g. signatures produced by another engine.
    pub fn from_values(values: Vec<u64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Signature generator with one seeded xxh64 per band.
#[derive(Debug, Clone)]
pub struct MinHasher {
    seeds: Vec<u64>,
}

impl MinHasher {
    pub fn new(num_bands: usize) -> Result<Self, ValidationError> {
        if num_bands == 0 {
            return Err(ValidationError::InvalidSignatureLength(num_bands));
        }
        Ok(Self::seeded(num_bands))
    }

    pub(crate) fn seeded(num_bands: usize) -> Self {
        let mut state = MINHASH_SEED;
        let seeds = (0..num_bands)
            .map(|_| {
                state = state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
                state
            })
            .collect();
        Self { seeds }
    }

    pub fn num_bands(&self) -> usize {
        self.seeds.len()
    }

    /// Minimum band hash over `shingles`, for every band.
    pub fn sign<S: AsRef<str>>(&self, shingles: impl IntoIterator<Item = S>) -> MinHashSignature {
        let mut mins = vec![u64::MAX; self.seeds.len()];
        for shingle in shingles {
            let bytes = shingle.as_ref().as_bytes();
            for (min, &seed) in mins.iter_mut().zip(&self.seeds) {
                let h = xxh64(bytes, seed);
                if h < *min {
                    *min = h;
                }
            }
        }
        MinHashSignature { values: mins }
    }
}

/// Sign an existing shingle set with a fresh `num_bands`-band hasher.
pub fn sign(
    shingles: &BTreeSet<String>,
    num_bands: usize,
) -> Result<MinHashSignature, ValidationError> {
    Ok(MinHasher::new(num_bands)?.sign(shingles))
}

/// Fraction of equal positions, an unbiased estimate of shingle-set Jaccard.
pub fn similarity(a: &MinHashSignature, b: &MinHashSignature) -> Result<f64, ValidationError> {
    if a.len() != b.len() {
        return Err(ValidationError::SignatureLengthMismatch { expected: a.len(), got: b.len() });
    }
    if a.is_empty() {
        return Err(ValidationError::InvalidSignatureLength(0));
    }
    let matches = a.values.iter().zip(&b.values).filter(|(x, y)| x == y).count();
    Ok(matches as f64 / a.len() as f64)
}

/// Exact Jaccard of two word sets. Both empty counts as no overlap.
pub fn word_jaccard(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}
