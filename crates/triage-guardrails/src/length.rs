//! Length bounds guardrail

use crate::guardrail::{Guardrail, GuardrailVerdict};
use triage_core::{Error, Result};

/// Fails text shorter than `min` or longer than `max` characters
pub struct LengthGuardrail {
    min: usize,
    max: Option<usize>,
}

impl LengthGuardrail {
    pub fn new(min: usize, max: Option<usize>) -> Result<Self> {
        if let Some(max) = max {
            if max < min {
                return Err(Error::config(format!(
                    "length guardrail max ({}) is below min ({})",
                    max, min
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Only an upper bound
    pub fn max(max: usize) -> Self {
        Self {
            min: 0,
            max: Some(max),
        }
    }
}

#[async_trait::async_trait]
impl Guardrail for LengthGuardrail {
    async fn check_text(&self, text: &str) -> Result<GuardrailVerdict> {
        let length = text.chars().count();

        if length < self.min {
            return Ok(GuardrailVerdict::fail(
                "length",
                format!("Message is too short ({} characters, minimum {})", length, self.min),
            ));
        }

        match self.max {
            Some(max) if length > max => Ok(GuardrailVerdict::fail(
                "length",
                format!("Message is too long ({} characters, maximum {})", length, max),
            )),
            _ => Ok(GuardrailVerdict::pass("length")),
        }
    }

    fn name(&self) -> &str {
        "length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_text_passes_default_min() {
        let guardrail = LengthGuardrail::max(10);
        assert!(guardrail.check_text("").await.unwrap().passed);
    }

    #[tokio::test]
    async fn test_bounds() {
        let guardrail = LengthGuardrail::new(2, Some(5)).unwrap();

        assert!(!guardrail.check_text("a").await.unwrap().passed);
        assert!(guardrail.check_text("héllo").await.unwrap().passed);

        let verdict = guardrail.check_text("too long").await.unwrap();
        assert_eq!(verdict.reason, "Message is too long (8 characters, maximum 5)");
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(LengthGuardrail::new(10, Some(3)).is_err());
    }
}
