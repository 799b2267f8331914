//! Ordered guardrail chain

use crate::guardrail::{Guardrail, GuardrailVerdict};
use std::sync::Arc;
use tracing::debug;
use triage_core::{Request, Result};

const CHAIN_NAME: &str = "chain";

/// Guardrails evaluated left to right as a logical AND
///
/// Evaluation stops at the first failing verdict, which becomes the chain's
/// verdict. Guardrails after it are never run. An empty chain passes.
#[derive(Clone, Default)]
pub struct GuardrailChain {
    guardrails: Vec<Arc<dyn Guardrail>>,
}

impl GuardrailChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a guardrail
    pub fn with(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    /// Append a guardrail in place
    pub fn push(&mut self, guardrail: Arc<dyn Guardrail>) {
        self.guardrails.push(guardrail);
    }

    /// Check an incoming request
    pub async fn check(&self, request: &Request) -> Result<GuardrailVerdict> {
        for guardrail in &self.guardrails {
            let verdict = guardrail.check(request).await?;
            debug!(
                guardrail = guardrail.name(),
                passed = verdict.passed,
                "Input guardrail evaluated"
            );
            if !verdict.passed {
                return Ok(verdict);
            }
        }
        Ok(GuardrailVerdict::pass(CHAIN_NAME))
    }

    /// Check a piece of text, typically a handler's response
    pub async fn check_text(&self, text: &str) -> Result<GuardrailVerdict> {
        for guardrail in &self.guardrails {
            let verdict = guardrail.check_text(text).await?;
            debug!(
                guardrail = guardrail.name(),
                passed = verdict.passed,
                "Output guardrail evaluated"
            );
            if !verdict.passed {
                return Ok(verdict);
            }
        }
        Ok(GuardrailVerdict::pass(CHAIN_NAME))
    }

    /// Number of guardrails in the chain
    pub fn len(&self) -> usize {
        self.guardrails.len()
    }

    /// Whether the chain has no guardrails
    pub fn is_empty(&self) -> bool {
        self.guardrails.is_empty()
    }

    /// Guardrail names in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.guardrails.iter().map(|g| g.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use triage_core::Error;

    struct CountingGuardrail {
        name: String,
        passes: bool,
        calls: AtomicU32,
    }

    impl CountingGuardrail {
        fn new(name: &str, passes: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                passes,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl Guardrail for CountingGuardrail {
        async fn check_text(&self, _text: &str) -> Result<GuardrailVerdict> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.passes {
                Ok(GuardrailVerdict::pass(&self.name))
            } else {
                Ok(GuardrailVerdict::fail(&self.name, format!("{} says no", self.name)))
            }
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    struct BrokenGuardrail;

    #[async_trait::async_trait]
    impl Guardrail for BrokenGuardrail {
        async fn check_text(&self, _text: &str) -> Result<GuardrailVerdict> {
            Err(Error::upstream("detector unavailable"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_empty_chain_passes() {
        let verdict = GuardrailChain::new().check(&Request::new("")).await.unwrap();
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn test_short_circuit_on_first_failure() {
        let g1 = CountingGuardrail::new("g1", false);
        let g2 = CountingGuardrail::new("g2", true);
        let chain = GuardrailChain::new().with(g1.clone()).with(g2.clone());

        let verdict = chain.check(&Request::new("solve 2x = 4")).await.unwrap();

        assert!(!verdict.passed);
        assert_eq!(verdict.reason, "g1 says no");
        assert_eq!(g1.calls.load(Ordering::Relaxed), 1);
        assert_eq!(g2.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_reports_first_failure_in_order() {
        let chain = GuardrailChain::new()
            .with(CountingGuardrail::new("g1", true))
            .with(CountingGuardrail::new("g2", false))
            .with(CountingGuardrail::new("g3", false));

        let verdict = chain.check_text("text").await.unwrap();
        assert_eq!(verdict.guardrail, "g2");
        assert_eq!(chain.names(), vec!["g1", "g2", "g3"]);
    }

    #[tokio::test]
    async fn test_error_stops_chain() {
        let after = CountingGuardrail::new("after", true);
        let chain = GuardrailChain::new()
            .with(Arc::new(BrokenGuardrail))
            .with(after.clone());

        let err = chain.check(&Request::new("hi")).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert_eq!(after.calls.load(Ordering::Relaxed), 0);
    }
}
