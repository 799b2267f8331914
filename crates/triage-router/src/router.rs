//! Label to handler routing table

use crate::filter::InputFilter;
use crate::handler::Handler;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use triage_classifiers::{normalize_label, ClassificationResult, LabelDescription, UNKNOWN_LABEL};
use triage_core::{Error, Request, Result};

/// Callback run right before a handler receives a request
///
/// Receives the original request and the classification that led to the
/// handoff (label, confidence and rationale). When the router fell back to
/// `unknown`, the classification still carries the label the classifier chose.
pub type HandoffHook = Arc<dyn Fn(&Request, &ClassificationResult) + Send + Sync>;

/// A handler bound to its label, with the handoff customizations
#[derive(Clone)]
pub struct HandlerRegistration {
    label: String,
    description: String,
    handler: Arc<dyn Handler>,
    filters: Vec<Arc<dyn InputFilter>>,
    on_handoff: Option<HandoffHook>,
}

impl HandlerRegistration {
    /// Register `handler` under `label`
    pub fn new(label: impl AsRef<str>, handler: Arc<dyn Handler>) -> Self {
        Self {
            label: normalize_label(label.as_ref()),
            description: String::new(),
            handler,
            filters: Vec::new(),
            on_handoff: None,
        }
    }

    /// Describe when this handler should be chosen
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an input filter; filters run in the order added
    pub fn with_filter(mut self, filter: Arc<dyn InputFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the callback invoked on handoff
    pub fn on_handoff<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &ClassificationResult) + Send + Sync + 'static,
    {
        self.on_handoff = Some(Arc::new(hook));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Run the handoff hook, if any
    pub fn notify_handoff(&self, request: &Request, classification: &ClassificationResult) {
        if let Some(hook) = &self.on_handoff {
            hook(request, classification);
        }
    }

    /// The request the handler receives after all filters ran
    pub fn prepare(&self, request: &Request) -> Request {
        if self.filters.is_empty() {
            return request.clone();
        }

        let text = self
            .filters
            .iter()
            .fold(request.text().to_string(), |text, filter| {
                debug!(filter = filter.name(), label = %self.label, "Applying input filter");
                filter.apply(request, text)
            });
        request.with_text(text)
    }
}

impl fmt::Debug for HandlerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("label", &self.label)
            .field("handler", &self.handler.name())
            .field("filters", &self.filters.iter().map(|x| x.name()).collect::<Vec<_>>())
            .field("on_handoff", &self.on_handoff.is_some())
            .finish()
    }
}

/// Builder collecting registrations before the table is frozen
#[derive(Default)]
pub struct RouterBuilder {
    registrations: Vec<HandlerRegistration>,
    min_confidence: Option<f32>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration; each label may be registered once
    pub fn register(mut self, registration: HandlerRegistration) -> Result<Self> {
        if self
            .registrations
            .iter()
            .any(|r| r.label == registration.label)
        {
            return Err(Error::config(format!(
                "label '{}' already has a registered handler",
                registration.label
            )));
        }
        if registration.label.is_empty() {
            return Err(Error::config("handler label must not be empty"));
        }
        self.registrations.push(registration);
        Ok(self)
    }

    /// Shorthand for registering a bare handler
    pub fn handler(self, label: impl AsRef<str>, handler: Arc<dyn Handler>) -> Result<Self> {
        self.register(HandlerRegistration::new(label, handler))
    }

    /// Register the default handler under the reserved unknown label
    pub fn fallback(self, handler: Arc<dyn Handler>) -> Result<Self> {
        self.register(HandlerRegistration::new(UNKNOWN_LABEL, handler))
    }

    /// Treat classifications below `threshold` as unknown
    pub fn min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = Some(threshold);
        self
    }

    /// Freeze the routing table
    pub fn build(self) -> Router {
        let index = self
            .registrations
            .iter()
            .enumerate()
            .map(|(i, r)| (r.label.clone(), i))
            .collect();

        Router {
            registrations: self.registrations,
            index,
            min_confidence: self.min_confidence,
        }
    }
}

/// Immutable mapping from label to exactly one handler
pub struct Router {
    registrations: Vec<HandlerRegistration>,
    index: HashMap<String, usize>,
    min_confidence: Option<f32>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Resolve a label to its registration
    ///
    /// Falls back to the handler registered under `unknown`; without one,
    /// an unmatched label is an [`Error::UnregisteredLabel`].
    pub fn route(&self, label: &str) -> Result<&HandlerRegistration> {
        let label = normalize_label(label);
        self.get(&label)
            .or_else(|| self.get(UNKNOWN_LABEL))
            .ok_or_else(|| Error::unregistered(label))
    }

    /// Resolve a classification, applying the confidence threshold
    pub fn resolve(&self, classification: &ClassificationResult) -> Result<&HandlerRegistration> {
        match self.min_confidence {
            Some(threshold) if classification.confidence < threshold => {
                debug!(
                    label = %classification.label,
                    confidence = classification.confidence,
                    threshold,
                    "Classification below confidence threshold, treating as unknown"
                );
                self.route(UNKNOWN_LABEL)
            }
            _ => self.route(&classification.label),
        }
    }

    fn get(&self, label: &str) -> Option<&HandlerRegistration> {
        self.index.get(label).map(|&i| &self.registrations[i])
    }

    /// Whether a fallback handler is registered
    pub fn has_fallback(&self) -> bool {
        self.index.contains_key(UNKNOWN_LABEL)
    }

    /// Registered labels in registration order, including `unknown` if present
    pub fn labels(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.label.as_str()).collect()
    }

    /// The closed label set offered to classifiers (excludes `unknown`)
    pub fn label_descriptions(&self) -> Vec<LabelDescription> {
        self.registrations
            .iter()
            .filter(|r| r.label != UNKNOWN_LABEL)
            .map(|r| LabelDescription::new(&r.label, r.description.clone()))
            .collect()
    }
}
