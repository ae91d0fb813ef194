use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};

/// Which text fields feed the fingerprint and the shingler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintScope {
    /// Body only; the title stands in when the body normalizes to nothing.
    #[default]
    Content,
    /// `title + content`, concatenated as-is.
    TitleAndContent,
}

/// Weights of the canonical-selection composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalWeights {
    pub quality: f64,
    pub completeness: f64,
    pub reputation: f64,
    pub recency: f64,
    /// Word count at which an item counts as fully complete.
    pub full_length_words: usize,
}

impl Default for CanonicalWeights {
    fn default() -> Self {
        Self {
            quality: 0.4,
            completeness: 0.3,
            reputation: 0.2,
            recency: 0.1,
            full_length_words: 1000,
        }
    }
}

impl CanonicalWeights {
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let weights = [
            ("quality", self.quality),
            ("completeness", self.completeness),
            ("reputation", self.reputation),
            ("recency", self.recency),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(ValidationError::InvalidWeights(format!(
                    "{name} weight must be finite and non-negative, got {w}"
                )));
            }
        }
        if self.full_length_words == 0 {
            return Err(ValidationError::InvalidWeights(
                "full_length_words must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Words per shingle unless configured otherwise.
pub const DEFAULT_SHINGLE_SIZE: usize = 5;

/// MinHash bands per signature unless configured otherwise.
pub const DEFAULT_SIGNATURE_LENGTH: usize = 128;

/// Engine configuration. Shingle size and signature length apply uniformly
/// to every item of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub shingle_size: usize,
    pub signature_length: usize,
    pub near_duplicate_threshold: f64,
    pub title_similarity_threshold: f64,
    pub fingerprint_scope: FingerprintScope,
    pub weights: CanonicalWeights,
    /// Spread signing and pairwise comparison across the rayon pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shingle_size: DEFAULT_SHINGLE_SIZE,
            signature_length: DEFAULT_SIGNATURE_LENGTH,
            near_duplicate_threshold: 0.8,
            title_similarity_threshold: 0.9,
            fingerprint_scope: FingerprintScope::Content,
            weights: CanonicalWeights::default(),
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn with_shingle_size(mut self, k: usize) -> Self {
        self.shingle_size = k;
        self
    }

    pub fn with_signature_length(mut self, len: usize) -> Self {
        self.signature_length = len;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.near_duplicate_threshold = threshold;
        self
    }

    pub fn with_scope(mut self, scope: FingerprintScope) -> Self {
        self.fingerprint_scope = scope;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.shingle_size == 0 {
            return Err(ValidationError::InvalidShingleSize(self.shingle_size));
        }
        if self.signature_length == 0 {
            return Err(ValidationError::InvalidSignatureLength(self.signature_length));
        }
        check_unit("near_duplicate_threshold", self.near_duplicate_threshold)?;
        check_unit("title_similarity_threshold", self.title_similarity_threshold)?;
        self.weights.validate()
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        tracing::debug!(
            k = config.shingle_size,
            l = config.signature_length,
            threshold = config.near_duplicate_threshold,
            "loaded engine config"
        );
        Ok(config)
    }
}

/// Reject thresholds outside `[0, 1]` (NaN included).
pub fn check_unit(name: &'static str, value: f64) -> std::result::Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidThreshold { name, value })
    }
}
