use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quality assigned to items whose producer did not score them.
pub const DEFAULT_QUALITY_SCORE: f64 = 0.5;

fn default_quality_score() -> f64 {
    DEFAULT_QUALITY_SCORE
}

/// A normalized content record handed over by the ingestion layer.
///
/// The engine never mutates items; everything it derives is returned
/// alongside them, keyed by the item's position in the input slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default = "default_quality_score")]
    pub quality_score: f64,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source_url: String::new(),
            timestamp: None,
            quality_score: DEFAULT_QUALITY_SCORE,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_quality_score(mut self, quality_score: f64) -> Self {
        self.quality_score = quality_score;
        self
    }

    /// Quality clamped to `[0, 1]`; NaN falls back to the default.
    pub fn effective_quality(&self) -> f64 {
        if self.quality_score.is_nan() {
            DEFAULT_QUALITY_SCORE
        } else {
            self.quality_score.clamp(0.0, 1.0)
        }
    }

    /// Registrable host of `source_url`, lowercased and without `www.`.
    ///
    /// Bare hosts such as `example.com/path` are accepted.
    pub fn domain(&self) -> Option<String> {
        domain_of(&self.source_url)
    }
}

/// Extract the host part of a URL for reputation lookups.
pub fn domain_of(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = url::Url::parse(raw)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| url::Url::parse(&format!("https://{raw}")).ok())?;
    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() { None } else { Some(host) }
}
