//! Configuration specs for classifiers

use crate::{
    normalize_label, Classifier, CompletionClassifier, KeywordClassifier, LabelDescription,
    StaticClassifier,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage_core::{CompletionClient, Error, Result};

/// Classifier specification (for YAML/config files)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClassifierSpec {
    /// Keyword voting
    Keyword { labels: Vec<KeywordLabelSpec> },

    /// Ask the completion service
    Completion {
        #[serde(default)]
        instructions: Option<String>,
    },

    /// Always the same label
    Static { label: String },
}

/// Keywords voting for one label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordLabelSpec {
    pub label: String,
    pub keywords: Vec<String>,
}

impl ClassifierSpec {
    /// Whether building this classifier needs a completion client
    pub fn needs_completion(&self) -> bool {
        matches!(self, Self::Completion { .. })
    }

    /// Labels this classifier can emit, normalized
    ///
    /// Empty for the completion classifier, which is always offered the
    /// router's own label set.
    pub fn emitted_labels(&self) -> Vec<String> {
        match self {
            Self::Keyword { labels } => labels
                .iter()
                .map(|spec| normalize_label(&spec.label))
                .collect(),
            Self::Completion { .. } => Vec::new(),
            Self::Static { label } => vec![normalize_label(label)],
        }
    }

    /// Instantiate the classifier
    ///
    /// `labels` is the router's closed label set, offered to the completion
    /// classifier as its choices.
    pub fn build(
        &self,
        labels: &[LabelDescription],
        client: Option<&Arc<dyn CompletionClient>>,
    ) -> Result<Arc<dyn Classifier>> {
        let classifier: Arc<dyn Classifier> = match self {
            Self::Keyword { labels } => Arc::new(KeywordClassifier::new(
                "keyword",
                labels
                    .iter()
                    .map(|spec| (spec.label.clone(), spec.keywords.clone()))
                    .collect(),
            )?),

            Self::Completion { instructions } => {
                let client = client.ok_or_else(|| {
                    Error::config("completion classifier requires a completion client")
                })?;
                let mut classifier = CompletionClassifier::new(Arc::clone(client), labels.to_vec());
                if let Some(instructions) = instructions {
                    classifier = classifier.with_instructions(instructions.clone());
                }
                Arc::new(classifier)
            }

            Self::Static { label } => Arc::new(StaticClassifier::new(label)),
        };

        Ok(classifier)
    }
}
