//! Completion-backed detector guardrail
//!
//! A detector prompt (for example "does this ask for a solution to math
//! homework?") is sent to the completion service, which must answer:
//! ```text
//! {"tripwire": true, "reasoning": "asks to solve for x"}
//! ```
//! A tripped wire fails the verdict with the configured message followed by
//! the detector's reasoning.

use crate::guardrail::{Guardrail, GuardrailVerdict};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use triage_core::{extract_json, CompletionClient, Error, Result};

const ANSWER_FORMAT: &str = "Respond with only a JSON object of the form \
{\"tripwire\": boolean, \"reasoning\": string}. Set tripwire to true when the text \
matches what you are asked to detect.";

/// Guardrail that asks the completion service to detect disallowed content
pub struct CompletionGuardrail {
    name: String,
    client: Arc<dyn CompletionClient>,
    instructions: String,
    message: String,
}

impl CompletionGuardrail {
    /// Create a detector guardrail
    ///
    /// `instructions` describes what to detect; `message` is shown to the
    /// user when the detector trips.
    pub fn new(
        name: impl Into<String>,
        client: Arc<dyn CompletionClient>,
        instructions: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            instructions: instructions.into(),
            message: message.into(),
        }
    }

    fn system_prompt(&self) -> String {
        format!("{}\n\n{}", self.instructions.trim(), ANSWER_FORMAT)
    }

    fn interpret(&self, answer: &str) -> Result<GuardrailVerdict> {
        let parsed: DetectorAnswer = serde_json::from_str(extract_json(answer)).map_err(|e| {
            Error::upstream(format!("detector '{}' returned unparseable output: {}", self.name, e))
        })?;

        debug!(guardrail = %self.name, tripwire = parsed.tripwire, "Detector answered");

        if parsed.tripwire {
            let reason = format!("{} {}", self.message, parsed.reasoning);
            Ok(GuardrailVerdict::fail(&self.name, reason.trim()))
        } else {
            Ok(GuardrailVerdict::pass(&self.name))
        }
    }
}

#[async_trait::async_trait]
impl Guardrail for CompletionGuardrail {
    async fn check_text(&self, text: &str) -> Result<GuardrailVerdict> {
        let answer = self
            .client
            .complete_with_instructions(&self.system_prompt(), text)
            .await?;
        self.interpret(&answer)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Deserialize)]
struct DetectorAnswer {
    #[serde(alias = "tripwire_triggered", alias = "detected")]
    tripwire: bool,
    #[serde(default)]
    reasoning: String,
}
