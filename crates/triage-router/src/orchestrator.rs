//! Triage orchestrator
//!
//! Drives one request through the pipeline state machine:
//! ```text
//! RECEIVED -> VALIDATING -> CLASSIFYING -> ROUTING -> HANDLING -> DONE
//!                 |                           |           |
//!                 +-> REJECTED                |           +-> REJECTED (output guardrails)
//!      any stage error -> FAILED <------------+-----------+
//! ```
//! Input guardrails always run before the classifier, so a request failing
//! validation never reaches a handler. Each stage is attempted once.

use crate::router::Router;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};
use triage_classifiers::{ClassificationResult, Classifier};
use triage_core::{Request, Response, Result};
use triage_guardrails::{GuardrailChain, GuardrailVerdict};
use triage_telemetry::{MetricsCollector, RunTrace, TraceEvent};

/// States of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Received,
    Validating,
    Classifying,
    Routing,
    Handling,
    Done,
    Rejected,
    Failed,
}

impl PipelineState {
    /// Whether the run ends in this state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Rejected | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Validating => "VALIDATING",
            Self::Classifying => "CLASSIFYING",
            Self::Routing => "ROUTING",
            Self::Handling => "HANDLING",
            Self::Done => "DONE",
            Self::Rejected => "REJECTED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which guardrail chain stopped a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionStage {
    Input,
    Output,
}

impl RejectionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// What happened during a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub request_id: String,
    /// Every state entered, in order
    pub states: Vec<PipelineState>,
    pub classification: Option<ClassificationResult>,
    pub elapsed_us: u64,
}

impl RunReport {
    /// The state the run ended in
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Received)
    }
}

/// Result of a run that did not fail
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A handler answered and every guardrail passed
    Completed { response: Response, report: RunReport },

    /// A guardrail blocked the request or the response
    Rejected {
        verdict: GuardrailVerdict,
        stage: RejectionStage,
        report: RunReport,
    },
}

impl Outcome {
    pub fn report(&self) -> &RunReport {
        match self {
            Self::Completed { report, .. } | Self::Rejected { report, .. } => report,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Completed { response, .. } => Some(response),
            Self::Rejected { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Text to show the caller: the response, or the rejection reason verbatim
    pub fn message(&self) -> &str {
        match self {
            Self::Completed { response, .. } => &response.text,
            Self::Rejected { verdict, .. } => &verdict.reason,
        }
    }
}

/// Sequences guardrails, classifier, router, and handler for each request
pub struct Orchestrator {
    input_guardrails: GuardrailChain,
    classifier: Arc<dyn Classifier>,
    router: Router,
    output_guardrails: GuardrailChain,
    metrics: MetricsCollector,
    trace: Option<Arc<Mutex<RunTrace>>>,
}

impl Orchestrator {
    /// Create an orchestrator with no guardrails
    pub fn new(classifier: Arc<dyn Classifier>, router: Router) -> Self {
        Self {
            input_guardrails: GuardrailChain::new(),
            classifier,
            router,
            output_guardrails: GuardrailChain::new(),
            metrics: MetricsCollector::new(),
            trace: None,
        }
    }

    /// Guardrails checked against the request before classification
    pub fn with_input_guardrails(mut self, chain: GuardrailChain) -> Self {
        self.input_guardrails = chain;
        self
    }

    /// Guardrails checked against the handler's response
    pub fn with_output_guardrails(mut self, chain: GuardrailChain) -> Self {
        self.output_guardrails = chain;
        self
    }

    /// Share a metrics collector
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Record every state transition into `trace`
    pub fn with_trace(mut self, trace: Arc<Mutex<RunTrace>>) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Wrap a line of text into a request and run it
    pub async fn run_line(&self, text: &str) -> Result<Outcome> {
        self.run(Request::new(text)).await
    }

    /// Process one request to a terminal state
    ///
    /// Guardrail rejections are `Ok(Outcome::Rejected)`. Errors from the
    /// classifier, router, handler, or a guardrail that could not run end the
    /// run in FAILED and are returned unchanged.
    pub async fn run(&self, request: Request) -> Result<Outcome> {
        self.metrics.record_request();
        let mut run = RunState::new(&request, self.trace.clone());

        match self.execute(&request, &mut run).await {
            Ok(outcome) => {
                let elapsed_us = run.elapsed_us();
                match &outcome {
                    Outcome::Completed { response, .. } => {
                        self.metrics.record_completed(elapsed_us);
                        info!(
                            request_id = request.id(),
                            handled_by = %response.handled_by,
                            elapsed_us,
                            "Request completed"
                        );
                    }
                    Outcome::Rejected { verdict, stage, .. } => {
                        self.metrics.record_rejected(stage.as_str(), elapsed_us);
                        warn!(
                            request_id = request.id(),
                            guardrail = %verdict.guardrail,
                            stage = stage.as_str(),
                            "Request rejected: {}",
                            verdict.reason
                        );
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                run.enter(PipelineState::Failed, Some(e.to_string()));
                self.metrics.record_failed(e.kind(), run.elapsed_us());
                warn!(request_id = request.id(), error = %e, "Request failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, request: &Request, run: &mut RunState) -> Result<Outcome> {
        run.enter(PipelineState::Validating, None);
        let verdict = self.input_guardrails.check(request).await?;
        if !verdict.passed {
            run.enter(PipelineState::Rejected, Some(verdict.reason.clone()));
            return Ok(Outcome::Rejected {
                verdict,
                stage: RejectionStage::Input,
                report: run.report(),
            });
        }

        run.enter(PipelineState::Classifying, None);
        let classification = self.classifier.classify(request).await?;
        debug!(
            request_id = request.id(),
            classifier = self.classifier.name(),
            label = %classification.label,
            confidence = classification.confidence,
            "Request classified"
        );

        run.enter(PipelineState::Routing, Some(classification.label.clone()));
        let resolved = self.router.resolve(&classification);
        run.classification = Some(classification.clone());
        let registration = resolved?;

        run.enter(PipelineState::Handling, Some(registration.label().to_string()));
        registration.notify_handoff(request, &classification);
        self.metrics.record_handoff(registration.label());
        let handler_request = registration.prepare(request);
        let text = registration.handler().handle(&handler_request).await?;

        let verdict = self.output_guardrails.check_text(&text).await?;
        if !verdict.passed {
            run.enter(PipelineState::Rejected, Some(verdict.reason.clone()));
            return Ok(Outcome::Rejected {
                verdict,
                stage: RejectionStage::Output,
                report: run.report(),
            });
        }

        run.enter(PipelineState::Done, None);
        Ok(Outcome::Completed {
            response: Response::new(text, registration.label()),
            report: run.report(),
        })
    }
}

/// Bookkeeping for a single run
struct RunState {
    request_id: String,
    states: Vec<PipelineState>,
    classification: Option<ClassificationResult>,
    started: Instant,
    trace: Option<Arc<Mutex<RunTrace>>>,
}

impl RunState {
    fn new(request: &Request, trace: Option<Arc<Mutex<RunTrace>>>) -> Self {
        let mut run = Self {
            request_id: request.id().to_string(),
            states: Vec::new(),
            classification: None,
            started: Instant::now(),
            trace,
        };
        run.enter(PipelineState::Received, None);
        run
    }

    fn enter(&mut self, state: PipelineState, detail: Option<String>) {
        debug!(
            request_id = %self.request_id,
            state = state.as_str(),
            detail = ?detail,
            "Pipeline transition"
        );
        self.states.push(state);

        if let Some(trace) = &self.trace {
            let mut event = TraceEvent::new(&self.request_id, state.as_str());
            if let Some(detail) = detail {
                event = event.with_detail(detail);
            }
            let mut trace = match trace.lock() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    warn!(request_id = %self.request_id, "Run trace lock poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            trace.add_event(event);
        }
    }

    fn elapsed_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }

    fn report(&self) -> RunReport {
        RunReport {
            request_id: self.request_id.clone(),
            states: self.states.clone(),
            classification: self.classification.clone(),
            elapsed_us: self.elapsed_us(),
        }
    }
}
