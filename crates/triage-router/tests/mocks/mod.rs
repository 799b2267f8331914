//! Mock pipeline components for testing
//!
//! Each mock counts its invocations so tests can assert which stages ran.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use triage_classifiers::{ClassificationResult, Classifier};
use triage_core::{Error, Request, Result};
use triage_guardrails::{Guardrail, GuardrailVerdict};
use triage_router::Handler;

/// A handler that answers with fixed text and counts calls
pub struct MockHandler {
    name: String,
    text: String,
    fail: bool,
    call_count: AtomicU32,
}

impl MockHandler {
    pub fn new(name: &str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            text: text.to_string(),
            fail: false,
            call_count: AtomicU32::new(0),
        })
    }

    /// A handler whose every call errors
    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            text: String::new(),
            fail: true,
            call_count: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Handler for MockHandler {
    async fn handle(&self, _request: &Request) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(Error::handler(format!("{} is unavailable", self.name)));
        }
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A handler that echoes the text it receives
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, request: &Request) -> Result<String> {
        Ok(request.text().to_string())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// A classifier stub returning a fixed label
pub struct MockClassifier {
    label: String,
    confidence: f32,
    unavailable: bool,
    call_count: AtomicU32,
}

impl MockClassifier {
    pub fn new(label: &str) -> Arc<Self> {
        Self::with_confidence(label, 1.0)
    }

    pub fn with_confidence(label: &str, confidence: f32) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            confidence,
            unavailable: false,
            call_count: AtomicU32::new(0),
        })
    }

    /// A classifier whose completion service is down
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            label: String::new(),
            confidence: 0.0,
            unavailable: true,
            call_count: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _request: &Request) -> Result<ClassificationResult> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.unavailable {
            return Err(Error::upstream("completion service returned 503"));
        }
        Ok(ClassificationResult::new(&self.label, self.confidence, "mock"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A guardrail with a fixed verdict that counts evaluations
pub struct MockGuardrail {
    name: String,
    reason: Option<String>,
    unavailable: bool,
    call_count: AtomicU32,
}

impl MockGuardrail {
    pub fn passing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reason: None,
            unavailable: false,
            call_count: AtomicU32::new(0),
        })
    }

    pub fn failing(name: &str, reason: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reason: Some(reason.to_string()),
            unavailable: false,
            call_count: AtomicU32::new(0),
        })
    }

    /// A guardrail whose backing service cannot be reached
    pub fn unavailable(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reason: None,
            unavailable: true,
            call_count: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Guardrail for MockGuardrail {
    async fn check_text(&self, _text: &str) -> Result<GuardrailVerdict> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.unavailable {
            return Err(Error::upstream(format!("{} timed out", self.name)));
        }
        Ok(match &self.reason {
            Some(reason) => GuardrailVerdict::fail(&self.name, reason),
            None => GuardrailVerdict::pass(&self.name),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
