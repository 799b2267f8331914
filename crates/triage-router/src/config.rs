//! Pipeline configuration
//!
//! A single YAML document describes the whole pipeline:
//! ```yaml
//! classifier:
//!   type: completion
//! min_confidence: 0.5
//! input_guardrails:
//!   - type: length
//!     max: 4000
//! handlers:
//!   - label: history
//!     description: Questions about historical events and figures
//!     type: agent
//!     instructions: You provide assistance with historical queries.
//!     filters:
//!       - type: sanitize
//! fallback:
//!   type: static
//!   text: I can only help with homework questions.
//! ```

use crate::filter::FilterSpec;
use crate::handler::{AgentHandler, Handler, StaticHandler};
use crate::orchestrator::Orchestrator;
use crate::router::{HandlerRegistration, Router};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use triage_classifiers::{ClassifierSpec, UNKNOWN_LABEL};
use triage_core::{CompletionClient, Error, Result};
use triage_guardrails::GuardrailSpec;

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// How requests are labelled
    pub classifier: ClassifierSpec,

    /// Classifications below this confidence route to the fallback
    #[serde(default)]
    pub min_confidence: Option<f32>,

    /// Checked against the request, in order
    #[serde(default)]
    pub input_guardrails: Vec<GuardrailSpec>,

    /// Checked against the handler's response, in order
    #[serde(default)]
    pub output_guardrails: Vec<GuardrailSpec>,

    /// One handler per label
    pub handlers: Vec<HandlerSpec>,

    /// Handler for the reserved unknown label
    #[serde(default)]
    pub fallback: Option<FallbackSpec>,
}

/// A labelled handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerSpec {
    pub label: String,

    #[serde(default)]
    pub description: String,

    #[serde(flatten)]
    pub kind: HandlerKindSpec,

    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// The fallback handler (its label is always `unknown`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSpec {
    #[serde(flatten)]
    pub kind: HandlerKindSpec,

    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// How a handler produces its answer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HandlerKindSpec {
    /// Instruction-bound agent answering through the completion service
    Agent {
        #[serde(default)]
        name: Option<String>,
        instructions: String,
    },

    /// Canned answer
    Static { text: String },
}

impl HandlerKindSpec {
    fn needs_completion(&self) -> bool {
        matches!(self, Self::Agent { .. })
    }

    fn build(
        &self,
        label: &str,
        client: Option<&Arc<dyn CompletionClient>>,
    ) -> Result<Arc<dyn Handler>> {
        let handler: Arc<dyn Handler> = match self {
            Self::Agent { name, instructions } => {
                let client = client.ok_or_else(|| {
                    Error::config(format!("agent handler '{}' requires a completion client", label))
                })?;
                Arc::new(AgentHandler::new(
                    name.clone().unwrap_or_else(|| label.to_string()),
                    instructions.clone(),
                    Arc::clone(client),
                ))
            }
            Self::Static { text } => Arc::new(StaticHandler::new(label, text.clone())),
        };
        Ok(handler)
    }
}

fn build_registration(
    label: &str,
    description: &str,
    kind: &HandlerKindSpec,
    filters: &[FilterSpec],
    client: Option<&Arc<dyn CompletionClient>>,
) -> Result<HandlerRegistration> {
    let mut registration =
        HandlerRegistration::new(label, kind.build(label, client)?).with_description(description);
    for filter in filters {
        registration = registration.with_filter(filter.build()?);
    }
    Ok(registration)
}

impl TriageConfig {
    /// Parse a configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse pipeline config: {}", e)))
    }

    /// Load a configuration file; a missing or unreadable file is [`Error::Io`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Whether any component talks to the completion service
    pub fn needs_completion(&self) -> bool {
        self.classifier.needs_completion()
            || self.input_guardrails.iter().any(GuardrailSpec::needs_completion)
            || self.output_guardrails.iter().any(GuardrailSpec::needs_completion)
            || self.handlers.iter().any(|h| h.kind.needs_completion())
            || self
                .fallback
                .as_ref()
                .map_or(false, |f| f.kind.needs_completion())
    }

    /// Build the router described by this configuration
    pub fn build_router(&self, client: Option<&Arc<dyn CompletionClient>>) -> Result<Router> {
        let mut builder = Router::builder();

        for spec in &self.handlers {
            if spec.label.trim().eq_ignore_ascii_case(UNKNOWN_LABEL) {
                return Err(Error::config(
                    "use `fallback` instead of a handler labelled 'unknown'",
                ));
            }
            builder = builder.register(build_registration(
                &spec.label,
                &spec.description,
                &spec.kind,
                &spec.filters,
                client,
            )?)?;
        }

        if let Some(fallback) = &self.fallback {
            builder = builder.register(build_registration(
                UNKNOWN_LABEL,
                "",
                &fallback.kind,
                &fallback.filters,
                client,
            )?)?;
        }

        if let Some(threshold) = self.min_confidence {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(Error::config(format!(
                    "min_confidence must be within [0, 1], got {}",
                    threshold
                )));
            }
            builder = builder.min_confidence(threshold);
        }

        Ok(builder.build())
    }

    /// Build the complete orchestrator
    pub fn build(&self, client: Option<Arc<dyn CompletionClient>>) -> Result<Orchestrator> {
        if self.handlers.is_empty() {
            return Err(Error::config("at least one handler must be configured"));
        }

        let client = client.as_ref();
        let router = self.build_router(client)?;

        let known = router.labels();
        for label in self.classifier.emitted_labels() {
            if label != UNKNOWN_LABEL && !known.contains(&label.as_str()) {
                return Err(Error::config(format!(
                    "classifier label '{}' has no handler (known labels: {})",
                    label,
                    known.join(", ")
                )));
            }
        }
        if !router.has_fallback() {
            warn!("No fallback handler configured; unmatched requests will fail");
        }

        let classifier = self.classifier.build(&router.label_descriptions(), client)?;
        let input = GuardrailSpec::build_chain(&self.input_guardrails, client)?;
        let output = GuardrailSpec::build_chain(&self.output_guardrails, client)?;

        info!(
            labels = ?router.labels(),
            classifier = classifier.name(),
            input_guardrails = input.len(),
            output_guardrails = output.len(),
            "Pipeline built"
        );

        Ok(Orchestrator::new(classifier, router)
            .with_input_guardrails(input)
            .with_output_guardrails(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HOMEWORK: &str = r#"
classifier:
  type: keyword
  labels:
    - label: math
      keywords: [equation, solve]
    - label: history
      keywords: [president, war]
input_guardrails:
  - type: pattern
    name: essay_request
    phrases: ["write an essay"]
    message: "I can't write complete essays."
handlers:
  - label: math
    description: Math homework
    type: static
    text: "Try isolating x first."
  - label: history
    type: static
    text: "George Washington"
    filters:
      - type: sanitize
fallback:
  type: static
  text: "I can only help with homework questions."
"#;

    #[tokio::test]
    async fn test_build_from_yaml() {
        let config = TriageConfig::from_yaml(HOMEWORK).unwrap();
        assert!(!config.needs_completion());

        let orchestrator = config.build(None).unwrap();
        assert_eq!(orchestrator.router().labels(), vec!["math", "history", "unknown"]);

        let outcome = orchestrator
            .run_line("who was the first president of the united states?")
            .await
            .unwrap();
        let response = outcome.response().unwrap();
        assert_eq!(response.text, "George Washington");
        assert_eq!(response.handled_by, "history");

        let outcome = orchestrator.run_line("please write an essay").await.unwrap();
        assert!(outcome.is_rejected());

        let outcome = orchestrator.run_line("what's the weather").await.unwrap();
        assert_eq!(outcome.response().unwrap().handled_by, "unknown");
    }

    #[test]
    fn test_agent_needs_client() {
        let yaml = r#"
classifier:
  type: static
  label: math
handlers:
  - label: math
    type: agent
    instructions: You help with math.
"#;
        let config = TriageConfig::from_yaml(yaml).unwrap();
        assert!(config.needs_completion());
        assert!(matches!(config.build(None), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_handler_label_rejected() {
        let yaml = r#"
classifier:
  type: static
  label: unknown
handlers:
  - label: Unknown
    type: static
    text: hi
"#;
        let config = TriageConfig::from_yaml(yaml).unwrap();
        assert!(config.build(None).is_err());
    }

    #[test]
    fn test_classifier_label_without_handler_rejected() {
        let yaml = r#"
classifier:
  type: keyword
  labels:
    - label: hsitory
      keywords: [president]
handlers:
  - label: history
    type: static
    text: George Washington
fallback:
  type: static
  text: Sorry
"#;
        let config = TriageConfig::from_yaml(yaml).unwrap();
        let err = config.build(None).err().unwrap();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("hsitory")));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(HOMEWORK.as_bytes()).unwrap();

        let config = TriageConfig::from_file(file.path()).unwrap();
        assert_eq!(config.handlers.len(), 2);
        assert!(config.fallback.is_some());
    }

    #[test]
    fn test_missing_file() {
        let err = TriageConfig::from_file("/nonexistent/triage.yaml").unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
