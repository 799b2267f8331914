//! Core types for the triage pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An incoming request to be validated, classified, and routed
///
/// Fields are private so a request cannot change once it enters the
/// pipeline; the builder methods consume and return the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    id: String,
    text: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl Request {
    /// Create a new request with a fresh identifier
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach an opaque metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Request identifier, used for log and trace correlation
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The free-text input
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Caller-supplied metadata
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// A copy of this request carrying different text, same id and metadata
    ///
    /// Used to hand filtered text to a handler without touching the
    /// original request.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            text: text.into(),
            metadata: self.metadata.clone(),
        }
    }
}

/// The result produced by a handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Response text
    pub text: String,

    /// Label of the handler that produced it
    pub handled_by: String,
}

impl Response {
    /// Create a new response
    pub fn new(text: impl Into<String>, handled_by: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            handled_by: handled_by.into(),
        }
    }
}

/// A chat message sent to the completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system or user)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}
