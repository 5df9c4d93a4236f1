use tracing::info;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for form activity
#[derive(Debug, Default)]
pub struct FormMetrics {
    pub loads: AtomicU64,
    pub saves: AtomicU64,
    pub deletes: AtomicU64,
    pub failures: AtomicU64,
    pub ignored_events: AtomicU64,
    pub transitions: AtomicU64,
}

impl FormMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> FormStats {
        FormStats {
            loads: self.loads.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            ignored_events: self.ignored_events.load(Ordering::Relaxed),
            transitions: self.transitions.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            loads = stats.loads,
            saves = stats.saves,
            deletes = stats.deletes,
            failures = stats.failures,
            ignored = stats.ignored_events,
            transitions = stats.transitions,
            "Form metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FormStats {
    pub loads: u64,
    pub saves: u64,
    pub deletes: u64,
    pub failures: u64,
    pub ignored_events: u64,
    pub transitions: u64,
}

/// Global metrics instance
static FORM_METRICS: std::sync::LazyLock<std::sync::Arc<FormMetrics>> =
    std::sync::LazyLock::new(|| std::sync::Arc::new(FormMetrics::new()));

/// Process-wide counters, shared by every runtime that opts in
pub fn form_metrics() -> std::sync::Arc<FormMetrics> {
    std::sync::Arc::clone(&FORM_METRICS)
}

/// Logs how long an operation took when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        info!(
            operation = %self.operation,
            duration_ms = self.start.elapsed().as_millis() as u64,
            "Operation completed"
        );
    }
}
