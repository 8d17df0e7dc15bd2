//! Replays a reading sequence through the full evaluation pipeline over
//! in-memory fakes. Used by the integration suite and by rule authors
//! wanting to sanity-check a rule against recorded data.

use std::sync::Arc;

use aquawatch_common::notification::{AlertNotification, Transition};
use aquawatch_common::reading::SensorReading;
use aquawatch_common::rule::Rule;

use crate::consumer::{ProcessorOptions, ReadingProcessor};
use crate::evaluator::EvalPolicy;
use crate::index::RuleIndex;
use crate::kv::{KvLock, KvStore, MemoryKv};
use crate::metrics::EngineMetrics;
use crate::publisher::InMemoryPublisher;
use crate::reconciler::{InMemoryRuleSource, Reconciler};
use crate::tracking::TrackingStore;

pub struct HarnessResult {
    pub notifications: Vec<AlertNotification>,
    pub triggered_count: usize,
    pub resolved_count: usize,
}

pub async fn run_harness(rules: Vec<Rule>, readings: Vec<SensorReading>) -> HarnessResult {
    let store: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
    let index = RuleIndex::new(Arc::clone(&store));

    let source = InMemoryRuleSource::new();
    source.set_rules(rules).await;
    let reconciler = Reconciler::new(Arc::new(source), index.clone(), EngineMetrics::new());
    reconciler.sync_once().await.expect("seed reconciliation");

    let publisher = InMemoryPublisher::new();
    let processor = ReadingProcessor::new(
        index,
        TrackingStore::new(Arc::clone(&store)),
        KvLock::new(Arc::clone(&store)),
        Arc::new(publisher.clone()),
        EvalPolicy::default(),
        EngineMetrics::new(),
        ProcessorOptions::default(),
    );

    for reading in &readings {
        processor.process(reading).await;
    }

    let notifications = publisher.published().await;
    let triggered_count = notifications
        .iter()
        .filter(|n| n.transition == Transition::Triggered)
        .count();
    let resolved_count = notifications
        .iter()
        .filter(|n| n.transition == Transition::Resolved)
        .count();

    HarnessResult {
        notifications,
        triggered_count,
        resolved_count,
    }
}
