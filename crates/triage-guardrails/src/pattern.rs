//! Blocked-phrase guardrail

use crate::guardrail::{Guardrail, GuardrailVerdict};
use aho_corasick::AhoCorasick;
use triage_core::{Error, Result};

/// Fails any text containing one of the blocked phrases (case-insensitive)
pub struct PatternGuardrail {
    name: String,
    phrases: Vec<String>,
    matcher: AhoCorasick,
    message: String,
}

impl PatternGuardrail {
    /// Create a new pattern guardrail
    pub fn new(
        name: impl Into<String>,
        phrases: Vec<String>,
        message: impl Into<String>,
    ) -> Result<Self> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&phrases)
            .map_err(|e| Error::guardrail(format!("Failed to build phrase matcher: {}", e)))?;

        Ok(Self {
            name: name.into(),
            phrases,
            matcher,
            message: message.into(),
        })
    }
}

#[async_trait::async_trait]
impl Guardrail for PatternGuardrail {
    async fn check_text(&self, text: &str) -> Result<GuardrailVerdict> {
        match self.matcher.find(text) {
            Some(m) => {
                let phrase = &self.phrases[m.pattern().as_usize()];
                Ok(GuardrailVerdict::fail(
                    &self.name,
                    format!("{} (matched '{}')", self.message, phrase),
                ))
            }
            None => Ok(GuardrailVerdict::pass(&self.name)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
