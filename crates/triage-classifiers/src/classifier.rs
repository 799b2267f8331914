//! Classifier trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use triage_core::{Request, Result};

/// Reserved label for requests no handler claims
pub const UNKNOWN_LABEL: &str = "unknown";

/// Trait for all classifiers
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given request
    async fn classify(&self, request: &Request) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Result of classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Resolved label, normalized
    pub label: String,

    /// Confidence (0.0-1.0), informational only
    pub confidence: f32,

    /// Why this label was chosen
    pub rationale: String,

    /// Latency in microseconds
    #[serde(default)]
    pub latency_us: u64,
}

impl ClassificationResult {
    /// Create a new classification result
    ///
    /// The label is normalized and the confidence clamped into [0, 1].
    pub fn new(label: impl AsRef<str>, confidence: f32, rationale: impl Into<String>) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            label: normalize_label(label.as_ref()),
            confidence,
            rationale: rationale.into(),
            latency_us: 0,
        }
    }

    /// A result for a request no label fits
    pub fn unknown(rationale: impl Into<String>) -> Self {
        Self::new(UNKNOWN_LABEL, 0.0, rationale)
    }

    /// Whether this result carries the reserved unknown label
    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }

    /// Set the measured latency
    pub fn with_latency_us(mut self, latency_us: u64) -> Self {
        self.latency_us = latency_us;
        self
    }
}

/// A label together with the text that explains when to pick it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDescription {
    pub label: String,
    #[serde(default)]
    pub description: String,
}

impl LabelDescription {
    pub fn new(label: impl AsRef<str>, description: impl Into<String>) -> Self {
        Self {
            label: normalize_label(label.as_ref()),
            description: description.into(),
        }
    }
}

/// Canonical form of a label: trimmed and lowercased
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
