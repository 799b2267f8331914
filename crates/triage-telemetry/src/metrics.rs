//! Metrics collection and reporting

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Metrics collector for pipeline runs
///
/// Counters are kept in-process for snapshots and also forwarded to the
/// `metrics` facade, so an installed exporter sees the same numbers.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    total_requests: AtomicU64,
    completed: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    total_latency_us: AtomicU64,
    handler_invocations: Mutex<BTreeMap<String, u64>>,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                total_requests: AtomicU64::new(0),
                completed: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                total_latency_us: AtomicU64::new(0),
                handler_invocations: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Record a request entering the pipeline
    pub fn record_request(&self) {
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("triage_requests_total").increment(1);
    }

    /// Record a handler invocation
    pub fn record_handoff(&self, label: &str) {
        if let Ok(mut counts) = self.inner.handler_invocations.lock() {
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
        ::metrics::counter!("triage_handoffs_total", "handler" => label.to_string()).increment(1);
    }

    /// Record a run that produced a response
    pub fn record_completed(&self, latency_us: u64) {
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency_us);
        ::metrics::counter!("triage_outcomes_total", "outcome" => "done").increment(1);
    }

    /// Record a run stopped by a guardrail
    pub fn record_rejected(&self, stage: &'static str, latency_us: u64) {
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency_us);
        ::metrics::counter!("triage_outcomes_total", "outcome" => "rejected", "stage" => stage)
            .increment(1);
    }

    /// Record a run that ended in an error
    pub fn record_failed(&self, kind: &'static str, latency_us: u64) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency_us);
        ::metrics::counter!("triage_outcomes_total", "outcome" => "failed", "error" => kind)
            .increment(1);
    }

    fn record_latency(&self, latency_us: u64) {
        self.inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        ::metrics::histogram!("triage_run_latency_us").record(latency_us as f64);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let handler_invocations = self
            .inner
            .handler_invocations
            .lock()
            .map(|counts| counts.clone())
            .unwrap_or_default();

        MetricsSnapshot {
            total_requests: self.inner.total_requests.load(Ordering::Relaxed),
            completed: self.inner.completed.load(Ordering::Relaxed),
            rejected: self.inner.rejected.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            total_latency_us: self.inner.total_latency_us.load(Ordering::Relaxed),
            handler_invocations,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub completed: u64,
    pub rejected: u64,
    pub failed: u64,
    pub total_latency_us: u64,
    pub handler_invocations: BTreeMap<String, u64>,
}

impl MetricsSnapshot {
    /// Calculate average latency per request
    pub fn avg_latency_us(&self) -> u64 {
        if self.total_requests == 0 {
            0
        } else {
            self.total_latency_us / self.total_requests
        }
    }

    /// Calculate guardrail rejection rate
    pub fn rejection_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.rejected as f64 / self.total_requests as f64
        }
    }
}
