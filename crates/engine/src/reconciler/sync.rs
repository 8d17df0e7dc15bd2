use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::rule_source::RuleSource;
use crate::index::RuleIndex;
use crate::metrics::EngineMetrics;

#[derive(Debug)]
pub struct SyncError(pub String);

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reconcile: {}", self.0)
    }
}

impl std::error::Error for SyncError {}

/// Rebuilds the rule index from the authoritative store so the index
/// converges even when an individual management-side update never made
/// it. Ordering invariant: the full live set is written before anything
/// is deleted, so an aborted pass can leave extra entries but never a
/// hole.
pub struct Reconciler {
    source: Arc<dyn RuleSource>,
    index: RuleIndex,
    metrics: Arc<EngineMetrics>,
}

impl Reconciler {
    pub fn new(source: Arc<dyn RuleSource>, index: RuleIndex, metrics: Arc<EngineMetrics>) -> Self {
        Self { source, index, metrics }
    }

    pub async fn sync_once(&self) -> Result<(), SyncError> {
        self.metrics.inc_reconcile_runs();
        let result = self.sync_inner().await;
        if result.is_err() {
            self.metrics.inc_reconcile_failures();
        }
        result
    }

    async fn sync_inner(&self) -> Result<(), SyncError> {
        let rules = self
            .source
            .list_active()
            .await
            .map_err(|e| SyncError(e.to_string()))?;
        tracing::info!(rules = rules.len(), "reconciling index");

        let live = self
            .index
            .replace_all(&rules)
            .await
            .map_err(|e| SyncError(format!("write phase: {e}")))?;

        // Reached only after the complete generation is in place.
        self.index
            .delete_except(&live)
            .await
            .map_err(|e| SyncError(format!("delete phase: {e}")))?;
        Ok(())
    }

    /// Periodic backstop on its own task, away from the consumer.
    pub fn spawn_interval(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if let Err(e) = self.sync_once().await {
                    tracing::error!(error = %e, "scheduled reconciliation failed");
                }
            }
        })
    }
}
