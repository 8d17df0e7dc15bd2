use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    readings_processed: AtomicU64,
    readings_malformed: AtomicU64,
    entries_evaluated: AtomicU64,
    entries_skipped: AtomicU64,
    lock_timeouts: AtomicU64,
    alerts_triggered: AtomicU64,
    alerts_resolved: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
    reconcile_runs: AtomicU64,
    reconcile_failures: AtomicU64,
    eval_latency_sum_us: AtomicU64,
    eval_latency_count: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_readings_processed(&self) {
        self.readings_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_readings_malformed(&self) {
        self.readings_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_entries_evaluated(&self) {
        self.entries_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_entries_skipped(&self) {
        self.entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_lock_timeouts(&self) {
        self.lock_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alerts_triggered(&self) {
        self.alerts_triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alerts_resolved(&self) {
        self.alerts_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_failed(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconcile_runs(&self) {
        self.reconcile_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconcile_failures(&self) {
        self.reconcile_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eval_latency(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.eval_latency_sum_us.fetch_add(us, Ordering::Relaxed);
        self.eval_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn readings_processed_val(&self) -> u64 {
        self.readings_processed.load(Ordering::Relaxed)
    }

    pub fn readings_malformed_val(&self) -> u64 {
        self.readings_malformed.load(Ordering::Relaxed)
    }

    pub fn entries_evaluated_val(&self) -> u64 {
        self.entries_evaluated.load(Ordering::Relaxed)
    }

    pub fn entries_skipped_val(&self) -> u64 {
        self.entries_skipped.load(Ordering::Relaxed)
    }

    pub fn lock_timeouts_val(&self) -> u64 {
        self.lock_timeouts.load(Ordering::Relaxed)
    }

    pub fn alerts_triggered_val(&self) -> u64 {
        self.alerts_triggered.load(Ordering::Relaxed)
    }

    pub fn alerts_resolved_val(&self) -> u64 {
        self.alerts_resolved.load(Ordering::Relaxed)
    }

    pub fn notifications_sent_val(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn notifications_failed_val(&self) -> u64 {
        self.notifications_failed.load(Ordering::Relaxed)
    }

    pub fn reconcile_runs_val(&self) -> u64 {
        self.reconcile_runs.load(Ordering::Relaxed)
    }

    pub fn reconcile_failures_val(&self) -> u64 {
        self.reconcile_failures.load(Ordering::Relaxed)
    }

    pub fn eval_latency_vals(&self) -> (u64, u64) {
        (
            self.eval_latency_sum_us.load(Ordering::Relaxed),
            self.eval_latency_count.load(Ordering::Relaxed),
        )
    }
}
