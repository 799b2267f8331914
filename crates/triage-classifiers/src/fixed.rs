//! Fixed-label classifier

use crate::classifier::{ClassificationResult, Classifier};
use triage_core::{Request, Result};

/// Classifier that always returns the same label
///
/// Useful for single-handler deployments and for tests that need to pin
/// the routing decision.
pub struct StaticClassifier {
    result: ClassificationResult,
}

impl StaticClassifier {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self {
            result: ClassificationResult::new(label, 1.0, "static classification"),
        }
    }

    /// Override the reported confidence
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        let label = std::mem::take(&mut self.result.label);
        let rationale = std::mem::take(&mut self.result.rationale);
        self.result = ClassificationResult::new(label, confidence, rationale);
        self
    }
}

#[async_trait::async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, _request: &Request) -> Result<ClassificationResult> {
        Ok(self.result.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_label() {
        let classifier = StaticClassifier::new("History").with_confidence(0.4);
        let result = classifier.classify(&Request::new("anything")).await.unwrap();
        assert_eq!(result.label, "history");
        assert_eq!(result.confidence, 0.4);
    }
}
