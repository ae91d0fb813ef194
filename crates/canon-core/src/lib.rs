//! Canon core — shared data model, configuration, errors and source reputation
//! for the deduplication engine.

pub mod config;
pub mod error;
pub mod reputation;
pub mod types;

pub use config::{
    CanonicalWeights, EngineConfig, FingerprintScope, DEFAULT_SHINGLE_SIZE,
    DEFAULT_SIGNATURE_LENGTH,
};
pub use error::{CanonError, Result, ValidationError};
pub use reputation::{ReputationSource, StaticReputation, CURATED_REPUTATION, DEFAULT_REPUTATION};
pub use types::{domain_of, ContentItem, DEFAULT_QUALITY_SCORE};
