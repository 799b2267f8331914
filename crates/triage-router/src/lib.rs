//! Triage Router
//!
//! Handler registration, label routing, and the orchestrator that drives a
//! request through validation, classification, routing, and handling.
//!
//! ```text
//! Request -> input guardrails -> classifier -> router -> handler -> output guardrails
//! ```
//!
//! A pipeline is usually built from a YAML [`TriageConfig`], but every
//! component can also be assembled by hand:
//! - [`Router`]: immutable label to handler table with an optional fallback
//! - [`HandlerRegistration`]: a handler plus its input filters and handoff hook
//! - [`Orchestrator`]: the per-request state machine

pub mod config;
pub mod filter;
pub mod handler;
pub mod orchestrator;
pub mod router;

pub use config::{FallbackSpec, HandlerKindSpec, HandlerSpec, TriageConfig};
pub use filter::{FilterSpec, InputFilter, MetadataContextFilter, PrefixFilter, SanitizeFilter};
pub use handler::{AgentHandler, FnHandler, Handler, StaticHandler};
pub use orchestrator::{Orchestrator, Outcome, PipelineState, RejectionStage, RunReport};
pub use router::{HandlerRegistration, HandoffHook, Router, RouterBuilder};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::handler::{FnHandler, Handler};
    pub use crate::orchestrator::{Orchestrator, Outcome, PipelineState};
    pub use crate::router::{HandlerRegistration, Router};
}
