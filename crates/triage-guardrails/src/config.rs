//! Configuration specs for guardrails

use crate::{
    CompletionGuardrail, Guardrail, GuardrailChain, LengthGuardrail, PatternGuardrail, PiiGuardrail,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage_core::{CompletionClient, Error, Result};

/// Guardrail specification (for YAML/config files)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GuardrailSpec {
    /// Blocked phrases
    Pattern {
        #[serde(default = "default_pattern_name")]
        name: String,
        phrases: Vec<String>,
        message: String,
    },

    /// Personal data detection
    Pii {
        #[serde(default)]
        message: Option<String>,
    },

    /// Character bounds
    Length {
        #[serde(default)]
        min: usize,
        #[serde(default)]
        max: Option<usize>,
    },

    /// Detector prompt answered by the completion service
    Completion {
        name: String,
        instructions: String,
        message: String,
    },
}

impl GuardrailSpec {
    /// Whether building this guardrail needs a completion client
    pub fn needs_completion(&self) -> bool {
        matches!(self, Self::Completion { .. })
    }

    /// Instantiate the guardrail
    pub fn build(&self, client: Option<&Arc<dyn CompletionClient>>) -> Result<Arc<dyn Guardrail>> {
        let guardrail: Arc<dyn Guardrail> = match self {
            Self::Pattern {
                name,
                phrases,
                message,
            } => Arc::new(PatternGuardrail::new(name.clone(), phrases.clone(), message.clone())?),

            Self::Pii { message } => {
                let mut guardrail = PiiGuardrail::new()?;
                if let Some(message) = message {
                    guardrail = guardrail.with_message(message.clone());
                }
                Arc::new(guardrail)
            }

            Self::Length { min, max } => Arc::new(LengthGuardrail::new(*min, *max)?),

            Self::Completion {
                name,
                instructions,
                message,
            } => {
                let client = client.ok_or_else(|| {
                    Error::config(format!("guardrail '{}' requires a completion client", name))
                })?;
                Arc::new(CompletionGuardrail::new(
                    name.clone(),
                    Arc::clone(client),
                    instructions.clone(),
                    message.clone(),
                ))
            }
        };

        Ok(guardrail)
    }

    /// Build a chain preserving the configured order
    pub fn build_chain(
        specs: &[GuardrailSpec],
        client: Option<&Arc<dyn CompletionClient>>,
    ) -> Result<GuardrailChain> {
        let mut chain = GuardrailChain::new();
        for spec in specs {
            chain.push(spec.build(client)?);
        }
        Ok(chain)
    }
}

fn default_pattern_name() -> String {
    "pattern".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_from_yaml_keeps_order() {
        let yaml = r#"
- type: length
  max: 2000
- type: pii
- type: pattern
  name: code_assignment
  phrases: ["implement a function that"]
  message: "I can't provide complete solutions for coding assignments."
"#;
        let specs: Vec<GuardrailSpec> = serde_yaml::from_str(yaml).unwrap();
        let chain = GuardrailSpec::build_chain(&specs, None).unwrap();

        assert_eq!(chain.names(), vec!["length", "pii", "code_assignment"]);
    }

    #[test]
    fn test_completion_guardrail_requires_client() {
        let yaml = r#"
type: completion
name: essay
instructions: Detect essay requests.
message: No essays.
"#;
        let spec: GuardrailSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(spec.needs_completion());
        assert!(matches!(spec.build(None), Err(Error::Config(_))));
    }
}
