use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aquawatch_common::keys;
use aquawatch_common::notification::Transition;
use aquawatch_common::reading::SensorReading;

use crate::evaluator::{satisfies, EvalPolicy};
use crate::index::{CachedCondition, RuleIndex};
use crate::kv::{KvError, KvLock};
use crate::metrics::EngineMetrics;
use crate::publisher::NotificationPublisher;
use crate::tracking::TrackingStore;

#[derive(Debug, Clone, Copy)]
pub struct ProcessorOptions {
    /// Conditions of one reading evaluated at a time.
    pub eval_concurrency: usize,
    pub lock_wait: Duration,
    pub lock_lease: Duration,
    pub tracking_ttl: Duration,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            eval_concurrency: 4,
            lock_wait: Duration::from_secs(5),
            lock_lease: Duration::from_secs(2),
            tracking_ttl: Duration::from_secs(3600),
        }
    }
}

/// Evaluates one reading against every condition watching its
/// (station, metric) pair and turns threshold crossings into debounced
/// transitions. Nothing in here fails the caller: every error is scoped
/// to the condition it happened on, and the next reading retries.
pub struct ReadingProcessor {
    index: RuleIndex,
    tracking: TrackingStore,
    lock: KvLock,
    publisher: Arc<dyn NotificationPublisher>,
    policy: EvalPolicy,
    metrics: Arc<EngineMetrics>,
    options: ProcessorOptions,
}

impl ReadingProcessor {
    pub fn new(
        index: RuleIndex,
        tracking: TrackingStore,
        lock: KvLock,
        publisher: Arc<dyn NotificationPublisher>,
        policy: EvalPolicy,
        metrics: Arc<EngineMetrics>,
        options: ProcessorOptions,
    ) -> Self {
        Self { index, tracking, lock, publisher, policy, metrics, options }
    }

    pub async fn process(&self, reading: &SensorReading) {
        let start = Instant::now();
        let entry_keys = match self.index.lookup(reading.station_id, reading.sensor_id).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(station_id = reading.station_id, metric_id = reading.sensor_id,
                    error = %e, "index lookup failed, skipping reading");
                return;
            }
        };
        if entry_keys.is_empty() {
            tracing::trace!(station_id = reading.station_id, metric_id = reading.sensor_id,
                "no conditions watching");
            return;
        }

        futures::stream::iter(entry_keys)
            .for_each_concurrent(self.options.eval_concurrency, |entry_key| async move {
                self.evaluate_entry(&entry_key, reading).await;
            })
            .await;

        self.metrics.inc_readings_processed();
        self.metrics.record_eval_latency(start);
    }

    async fn evaluate_entry(&self, entry_key: &str, reading: &SensorReading) {
        let Some(entry) = self.index.read_entry(entry_key).await else {
            self.metrics.inc_entries_skipped();
            return;
        };

        let met = satisfies(
            self.policy,
            entry.operator,
            reading.value,
            entry.threshold,
            entry.threshold_min,
            entry.threshold_max,
        );

        let lock_key = keys::lock_key(entry.condition_uid);
        let guard = match self
            .lock
            .acquire(&lock_key, self.options.lock_wait, self.options.lock_lease)
            .await
        {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                tracing::warn!(condition_uid = %entry.condition_uid,
                    "lock wait exceeded, skipping; next reading retries");
                self.metrics.inc_lock_timeouts();
                return;
            }
            Err(e) => {
                tracing::error!(condition_uid = %entry.condition_uid, error = %e,
                    "lock acquire failed, skipping");
                return;
            }
        };

        if let Err(e) = self.apply_transition(&entry, reading, met).await {
            tracing::error!(condition_uid = %entry.condition_uid, error = %e,
                "transition failed; tracking state unchanged");
        }
        guard.release().await;

        self.metrics.inc_entries_evaluated();
    }

    /// The lock-protected read/decide/write sequence. Runs to completion
    /// once entered; shutdown waits for it.
    async fn apply_transition(
        &self,
        entry: &CachedCondition,
        reading: &SensorReading,
        met: bool,
    ) -> Result<(), KvError> {
        let firing = self.tracking.is_firing(entry.condition_uid).await?;

        match (firing, met) {
            (false, true) => {
                self.emit(entry, reading, Transition::Triggered).await;
                self.tracking
                    .mark_firing(entry.condition_uid, self.options.tracking_ttl)
                    .await?;
                self.metrics.inc_alerts_triggered();
                tracing::info!(condition_uid = %entry.condition_uid, alert_id = %entry.alert_id,
                    value = reading.value, "alert triggered");
            }
            (true, false) => {
                self.emit(entry, reading, Transition::Resolved).await;
                self.tracking.clear_firing(entry.condition_uid).await?;
                self.metrics.inc_alerts_resolved();
                tracing::info!(condition_uid = %entry.condition_uid, alert_id = %entry.alert_id,
                    value = reading.value, "alert resolved");
            }
            // Already alerting, or steady state: no transition.
            (true, true) | (false, false) => {}
        }
        Ok(())
    }

    async fn emit(&self, entry: &CachedCondition, reading: &SensorReading, transition: Transition) {
        let notification = entry.to_notification(reading, transition);
        match self.publisher.publish(&notification).await {
            Ok(()) => self.metrics.inc_notifications_sent(),
            Err(e) => {
                self.metrics.inc_notifications_failed();
                tracing::error!(alert_id = %notification.alert_id,
                    transition = transition.as_str(), error = %e,
                    "notification dropped");
            }
        }
    }
}
