//! Triage Guardrails
//!
//! Guardrails are predicates over request or response text. Each returns a
//! [`GuardrailVerdict`]; a [`GuardrailChain`] combines them with a
//! short-circuiting AND so the first failing guardrail decides the reason.
//!
//! Built-in guardrails:
//! - [`PatternGuardrail`]: blocked phrases (Aho-Corasick)
//! - [`PiiGuardrail`]: email, phone, SSN, and card numbers (regex)
//! - [`LengthGuardrail`]: character bounds
//! - [`CompletionGuardrail`]: a detector prompt answered by the completion service

pub mod chain;
pub mod completion;
pub mod config;
pub mod guardrail;
pub mod length;
pub mod pattern;
pub mod pii;

pub use chain::GuardrailChain;
pub use completion::CompletionGuardrail;
pub use config::GuardrailSpec;
pub use guardrail::{Guardrail, GuardrailVerdict};
pub use length::LengthGuardrail;
pub use pattern::PatternGuardrail;
pub use pii::PiiGuardrail;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::chain::GuardrailChain;
    pub use crate::guardrail::{Guardrail, GuardrailVerdict};
    pub use crate::length::LengthGuardrail;
    pub use crate::pattern::PatternGuardrail;
    pub use crate::pii::PiiGuardrail;
}
