//! Triage Core
//!
//! Core types, traits, and utilities shared across the triage components.
//!
//! This crate provides:
//! - The request and response types that flow through the pipeline
//! - Error types and result handling
//! - The `CompletionClient` seam to the external text-completion service,
//!   with an OpenAI-compatible HTTP implementation

pub mod completion;
pub mod error;
pub mod types;

pub use completion::{extract_json, CompletionClient, CompletionConfig, OpenAiCompletionClient};
pub use error::{Error, Result};
pub use types::{ChatMessage, Request, Response};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::completion::{CompletionClient, CompletionConfig};
    pub use crate::error::{Error, Result};
    pub use crate::types::{ChatMessage, Request, Response};
}
