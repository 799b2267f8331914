//! Personal data guardrail

use crate::guardrail::{Guardrail, GuardrailVerdict};
use regex::Regex;
use triage_core::{Error, Result};

const DEFAULT_MESSAGE: &str = "Please don't share personal information";

/// Fails text containing email addresses, phone numbers, SSNs, or card numbers
pub struct PiiGuardrail {
    detectors: Vec<(&'static str, Regex)>,
    message: String,
}

impl PiiGuardrail {
    /// Create a new PII guardrail
    pub fn new() -> Result<Self> {
        let compile = |kind: &'static str, pattern: &str| {
            Regex::new(pattern)
                .map(|regex| (kind, regex))
                .map_err(|e| Error::guardrail(format!("Failed to compile {} regex: {}", kind, e)))
        };

        Ok(Self {
            detectors: vec![
                compile("email", r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")?,
                compile("ssn", r"\b\d{3}-\d{2}-\d{4}\b")?,
                compile("credit_card", r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b")?,
                compile("phone", r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b")?,
            ],
            message: DEFAULT_MESSAGE.to_string(),
        })
    }

    /// Override the rejection message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Kinds of personal data found in `text`
    pub fn detect(&self, text: &str) -> Vec<&'static str> {
        self.detectors
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[async_trait::async_trait]
impl Guardrail for PiiGuardrail {
    async fn check_text(&self, text: &str) -> Result<GuardrailVerdict> {
        let found = self.detect(text);
        if found.is_empty() {
            Ok(GuardrailVerdict::pass("pii"))
        } else {
            Ok(GuardrailVerdict::fail(
                "pii",
                format!("{} (found: {})", self.message, found.join(", ")),
            ))
        }
    }

    fn name(&self) -> &str {
        "pii"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_email_detection() {
        let guardrail = PiiGuardrail::new().unwrap();

        let verdict = guardrail.check_text("Contact me at john@example.com").await.unwrap();
        assert!(!verdict.passed);
        assert!(verdict.reason.ends_with("(found: email)"));
    }

    #[tokio::test]
    async fn test_no_pii() {
        let guardrail = PiiGuardrail::new().unwrap();

        let verdict = guardrail.check_text("This is clean text").await.unwrap();
        assert!(verdict.passed);
    }

    #[test]
    fn test_ssn_and_phone() {
        let guardrail = PiiGuardrail::new().unwrap();

        assert_eq!(guardrail.detect("my ssn is 123-45-6789"), vec!["ssn"]);
        assert_eq!(guardrail.detect("Call me at 555-123-4567"), vec!["phone"]);
    }

    #[tokio::test]
    async fn test_custom_message() {
        let guardrail = PiiGuardrail::new().unwrap().with_message("No card numbers");
        let verdict = guardrail
            .check_text("card 4111 1111 1111 1111")
            .await
            .unwrap();
        assert_eq!(verdict.reason, "No card numbers (found: credit_card)");
    }
}
