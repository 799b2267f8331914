//! Hash-chained run trace

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::time::SystemTime;
use tracing::warn;

/// Ordered record of pipeline state transitions
///
/// Each event stores the hash of its predecessor, so any edit to a recorded
/// event breaks [`RunTrace::verify`].
///
/// A trace built with [`RunTrace::with_max_events`] keeps only the newest
/// events. The hash the oldest retained event points at is kept as the
/// anchor, so the retained window still verifies.
#[derive(Debug, Default)]
pub struct RunTrace {
    events: VecDeque<TraceEvent>,
    chain_hash: Option<String>,
    anchor: Option<String>,
    max_events: Option<usize>,
}

impl RunTrace {
    /// Create a new, unbounded trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trace that retains at most `max_events` events
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            max_events: Some(max_events.max(1)),
            ..Self::default()
        }
    }

    /// Append an event, evicting the oldest one when the trace is full
    pub fn add_event(&mut self, mut event: TraceEvent) {
        event.previous_hash = self.chain_hash.clone();

        let hash = compute_hash(&event);
        event.hash = Some(hash.clone());

        self.chain_hash = Some(hash);
        self.events.push_back(event);

        if let Some(max) = self.max_events {
            while self.events.len() > max {
                if let Some(evicted) = self.events.pop_front() {
                    self.anchor = evicted.hash;
                }
            }
        }
    }

    /// Verify the integrity of the retained events
    pub fn verify(&self) -> bool {
        let mut prev_hash = self.anchor.clone();

        for (index, event) in self.events.iter().enumerate() {
            if event.previous_hash != prev_hash {
                warn!(index, request_id = %event.request_id, "Trace chain broken");
                return false;
            }

            if event.hash.as_deref() != Some(compute_hash(event).as_str()) {
                warn!(index, request_id = %event.request_id, "Trace event hash mismatch");
                return false;
            }

            prev_hash = event.hash.clone();
        }

        true
    }

    /// Retained events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter()
    }

    /// Events belonging to one request, in order
    pub fn events_for<'a>(
        &'a self,
        request_id: &'a str,
    ) -> impl Iterator<Item = &'a TraceEvent> + 'a {
        self.events.iter().filter(move |e| e.request_id == request_id)
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn compute_hash(event: &TraceEvent) -> String {
    let mut hasher = Sha256::new();

    hasher.update(event.request_id.as_bytes());
    hasher.update(event.state.as_bytes());
    if let Some(ref detail) = event.detail {
        hasher.update(detail.as_bytes());
    }
    hasher.update(format!("{:?}", event.timestamp).as_bytes());
    if let Some(ref prev) = event.previous_hash {
        hasher.update(prev.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// A single state transition in the trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Request the transition belongs to
    pub request_id: String,

    /// State entered
    pub state: String,

    /// Optional detail (label, rejection reason, error)
    pub detail: Option<String>,

    /// Timestamp
    pub timestamp: SystemTime,

    /// Hash of this event
    pub hash: Option<String>,

    /// Hash of previous event (for chaining)
    pub previous_hash: Option<String>,
}

impl TraceEvent {
    /// Create a new trace event
    pub fn new(request_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: state.into(),
            detail: None,
            timestamp: SystemTime::now(),
            hash: None,
            previous_hash: None,
        }
    }

    /// Attach a detail string
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
