//! Source reputation: read-only domain → trust lookup used by canonical selection.

use crate::error::{Result, ValidationError};
use crate::config::check_unit;
use std::collections::HashMap;

/// Score for domains the table does not know, and for items without a URL.
pub const DEFAULT_REPUTATION: f64 = 0.5;

/// Read-only reputation lookup. Implementations must be safe to share
/// across rayon workers.
pub trait ReputationSource: Send + Sync {
    /// Score for an exact domain, if known.
    fn lookup(&self, domain: &str) -> Option<f64>;

    /// Score for a domain, walking up to parent domains before falling back
    /// to [`DEFAULT_REPUTATION`].
    fn score(&self, domain: Option<&str>) -> f64 {
        let Some(mut domain) = domain else {
            return DEFAULT_REPUTATION;
        };
        loop {
            if let Some(s) = self.lookup(domain) {
                return s;
            }
            match domain.split_once('.') {
                Some((_, parent)) if parent.contains('.') => domain = parent,
                _ => return DEFAULT_REPUTATION,
            }
        }
    }
}

/// Static table of curated scores.
#[derive(Debug, Clone, Default)]
pub struct StaticReputation {
    scores: HashMap<String, f64>,
}

impl StaticReputation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(domain, score)` pairs. Scores must lie in `[0, 1]`.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> std::result::Result<Self, ValidationError> {
        let mut scores = HashMap::new();
        for (domain, score) in pairs {
            check_unit("reputation score", score)?;
            scores.insert(domain.trim().to_lowercase(), score);
        }
        Ok(Self { scores })
    }

    /// Parse a JSON object of `{"domain": score}`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let map: HashMap<String, f64> = serde_json::from_str(raw)?;
        let table = Self::from_pairs(map.iter().map(|(d, s)| (d.as_str(), *s)))?;
        tracing::debug!(domains = table.len(), "loaded reputation table");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl ReputationSource for StaticReputation {
    fn lookup(&self, domain: &str) -> Option<f64> {
        self.scores.get(domain).copied()
    }
}

fn curated_table() -> StaticReputation {
    let pairs = [
        ("reuters.com", 0.95),
        ("apnews.com", 0.95),
        ("bbc.co.uk", 0.9),
        ("bbc.com", 0.9),
        ("nytimes.com", 0.9),
        ("nature.com", 0.9),
        ("theguardian.com", 0.85),
        ("washingtonpost.com", 0.85),
        ("npr.org", 0.85),
        ("economist.com", 0.85),
        ("arxiv.org", 0.85),
        ("wsj.com", 0.85),
        ("ft.com", 0.85),
        ("bloomberg.com", 0.85),
        ("wikipedia.org", 0.8),
        ("techcrunch.com", 0.7),
        ("arstechnica.com", 0.75),
        ("theverge.com", 0.7),
        ("github.com", 0.7),
        ("medium.com", 0.45),
        ("substack.com", 0.45),
        ("reddit.com", 0.4),
        ("blogspot.com", 0.35),
        ("wordpress.com", 0.35),
    ];
    let scores = pairs
        .iter()
        .map(|(d, s)| (d.to_string(), *s))
        .collect();
    StaticReputation { scores }
}

/// The default curated table, built once on first use.
pub static CURATED_REPUTATION: std::sync::LazyLock<StaticReputation> =
    std::sync::LazyLock::new(curated_table);

impl<T: ReputationSource + ?Sized> ReputationSource for &T {
    fn lookup(&self, domain: &str) -> Option<f64> {
        (**self).lookup(domain)
    }
}
