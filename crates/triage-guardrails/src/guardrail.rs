//! Guardrail trait and verdict type

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use triage_core::{Request, Result};

/// A validation predicate over request or response text
///
/// Implementations must be pure functions of the text: no side effects, and
/// the same text always yields the same verdict for deterministic guardrails.
/// An `Err` means the guardrail itself could not run (for example the
/// completion service is down), which is different from a failing verdict.
#[async_trait]
pub trait Guardrail: Send + Sync {
    /// Check a piece of text
    async fn check_text(&self, text: &str) -> Result<GuardrailVerdict>;

    /// Check an incoming request
    async fn check(&self, request: &Request) -> Result<GuardrailVerdict> {
        self.check_text(request.text()).await
    }

    /// Get the guardrail name
    fn name(&self) -> &str;
}

/// Outcome of a guardrail check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    /// Whether the text may proceed
    pub passed: bool,

    /// Why it failed, surfaced verbatim to the caller on rejection
    pub reason: String,

    /// Name of the guardrail that produced this verdict
    pub guardrail: String,
}

impl GuardrailVerdict {
    /// A passing verdict
    pub fn pass(guardrail: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: String::new(),
            guardrail: guardrail.into(),
        }
    }

    /// A failing verdict with a user-facing reason
    pub fn fail(guardrail: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
            guardrail: guardrail.into(),
        }
    }
}
