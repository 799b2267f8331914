//! Completion-backed triage classifier
//!
//! Asks the completion service to choose one label from the closed set and
//! answer with a JSON object:
//! ```text
//! {"label": "history", "confidence": 0.92, "rationale": "asks about a historical figure"}
//! ```

use crate::classifier::{
    normalize_label, ClassificationResult, Classifier, LabelDescription, UNKNOWN_LABEL,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use triage_core::{extract_json, CompletionClient, Request, Result};

const DEFAULT_INSTRUCTIONS: &str = "You are a triage agent. Read the user's message and decide \
which specialist should handle it. Do not answer the message yourself.";

/// Classifier that delegates the decision to the completion service
pub struct CompletionClassifier {
    client: Arc<dyn CompletionClient>,
    labels: Vec<LabelDescription>,
    instructions: String,
}

impl CompletionClassifier {
    /// Create a classifier choosing among `labels`
    pub fn new(client: Arc<dyn CompletionClient>, labels: Vec<LabelDescription>) -> Self {
        Self {
            client,
            labels,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }

    /// Replace the opening instructions of the triage prompt
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// The system prompt sent with every request
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.instructions.clone();
        prompt.push_str("\n\nAvailable labels:\n");
        for label in &self.labels {
            if label.description.is_empty() {
                prompt.push_str(&format!("- {}\n", label.label));
            } else {
                prompt.push_str(&format!("- {}: {}\n", label.label, label.description));
            }
        }
        prompt.push_str(&format!(
            "- {}: none of the above fit, or you are not sure\n\n",
            UNKNOWN_LABEL
        ));
        prompt.push_str(
            "Respond with only a JSON object of the form \
             {\"label\": string, \"confidence\": number between 0 and 1, \"rationale\": string}.",
        );
        prompt
    }

    fn is_known(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.label == label)
    }

    /// Turn the model's answer into a result from the closed label set
    fn interpret(&self, answer: &str) -> ClassificationResult {
        let parsed: LabelAnswer = match serde_json::from_str(extract_json(answer)) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Unparseable classifier answer: {}", e);
                return ClassificationResult::unknown(format!(
                    "unparseable classifier answer: {}",
                    e
                ));
            }
        };

        let label = normalize_label(&parsed.label);
        if !self.is_known(&label) && label != UNKNOWN_LABEL {
            debug!(label = %label, "Classifier chose a label outside the known set");
            return ClassificationResult::unknown(format!(
                "classifier chose unregistered label '{}': {}",
                label, parsed.rationale
            ));
        }

        ClassificationResult::new(label, parsed.confidence.unwrap_or(1.0), parsed.rationale)
    }
}

#[async_trait::async_trait]
impl Classifier for CompletionClassifier {
    async fn classify(&self, request: &Request) -> Result<ClassificationResult> {
        let start = Instant::now();
        let answer = self
            .client
            .complete_with_instructions(&self.system_prompt(), request.text())
            .await?;

        Ok(self
            .interpret(&answer)
            .with_latency_us(start.elapsed().as_micros() as u64))
    }

    fn name(&self) -> &str {
        "completion"
    }
}

#[derive(Debug, Deserialize)]
struct LabelAnswer {
    label: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use triage_core::{ChatMessage, Error};

    struct ScriptedCompletion {
        answer: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionClient for ScriptedCompletion {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .extend(messages.iter().map(|m| m.content.clone()));
            match &self.answer {
                Ok(answer) => Ok(answer.clone()),
                Err(_) => Err(Error::upstream("service unavailable")),
            }
        }
    }

    fn labels() -> Vec<LabelDescription> {
        vec![
            LabelDescription::new("math", "math homework and calculations"),
            LabelDescription::new("history", "historical events and figures"),
        ]
    }

    #[tokio::test]
    async fn test_parses_fenced_answer() {
        let client = Arc::new(ScriptedCompletion::answering(
            "```json\n{\"label\": \"History\", \"confidence\": 0.9, \"rationale\": \"asks about a president\"}\n```",
        ));
        let classifier = CompletionClassifier::new(client.clone(), labels());

        let result = classifier
            .classify(&Request::new("who was the first president of the united states?"))
            .await
            .unwrap();

        assert_eq!(result.label, "history");
        assert_eq!(result.confidence, 0.9);

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains("- math: math homework and calculations"));
        assert!(prompts[0].contains("- unknown:"));
        assert_eq!(prompts[1], "who was the first president of the united states?");
    }

    #[tokio::test]
    async fn test_unregistered_label_becomes_unknown() {
        let client = Arc::new(ScriptedCompletion::answering(
            r#"{"label": "chemistry", "confidence": 0.8, "rationale": "balancing equations"}"#,
        ));
        let classifier = CompletionClassifier::new(client, labels());

        let result = classifier.classify(&Request::new("balance H2 + O2")).await.unwrap();
        assert!(result.is_unknown());
        assert!(result.rationale.contains("chemistry"));
    }

    #[tokio::test]
    async fn test_garbage_answer_becomes_unknown() {
        let client = Arc::new(ScriptedCompletion::answering("I think it's math?"));
        let classifier = CompletionClassifier::new(client, labels());

        let result = classifier.classify(&Request::new("2 + 2")).await.unwrap();
        assert!(result.is_unknown());
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let client = Arc::new(ScriptedCompletion {
            answer: Err(Error::upstream("down")),
            prompts: Mutex::new(Vec::new()),
        });
        let classifier = CompletionClassifier::new(client, labels());

        let err = classifier.classify(&Request::new("hi")).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
