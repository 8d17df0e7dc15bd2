use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use aquawatch_common::keys;
use aquawatch_common::rule::Rule;

use super::entry::CachedCondition;
use crate::kv::{KvError, KvOp, KvStore};

/// Store round trips per batched write/delete chunk.
const BATCH_SIZE: usize = 100;

/// Derived, queryable view of every active unmuted rule, keyed so the
/// consumer can resolve a (station, metric) pair to its watching
/// conditions with one set lookup.
#[derive(Clone)]
pub struct RuleIndex {
    store: Arc<dyn KvStore>,
}

impl RuleIndex {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Publish every indexable condition of one rule: entry value plus
    /// membership-set add, pipelined in a single round trip. Conditions
    /// that cannot be indexed are logged and skipped, never failing their
    /// siblings.
    pub async fn put(&self, rule: &Rule) -> Result<(), KvError> {
        let ops = build_rule_ops(rule, &mut HashSet::new());
        if ops.is_empty() {
            tracing::debug!(rule_id = %rule.id, "no indexable conditions");
            return Ok(());
        }
        self.store.apply_batch(ops).await
    }

    /// Boundary hook for the rule-management collaborator: a rule edit
    /// lands in the index or leaves it depending on status and mute.
    pub async fn refresh_rule(&self, rule: &Rule) -> Result<(), KvError> {
        if rule.is_evaluable() {
            self.put(rule).await
        } else {
            self.remove_for_rule(rule.station_id, rule.id).await
        }
    }

    /// Drop every entry belonging to one rule without knowing its
    /// condition ids: walk the station's membership sets and filter by the
    /// rule-id fragment encoded in each entry key.
    pub async fn remove_for_rule(&self, station_id: i64, rule_id: Uuid) -> Result<(), KvError> {
        let pattern = keys::membership_pattern_for_station(station_id);
        let membership_keys = self.store.scan(&pattern).await?;
        let fragment = keys::rule_fragment(rule_id);

        for membership_key in membership_keys {
            let members = match self.store.smembers(&membership_key).await {
                Ok(m) => m,
                Err(e) => {
                    tracing::error!(%membership_key, error = %e, "membership read failed, skipping");
                    continue;
                }
            };

            let doomed: Vec<String> =
                members.into_iter().filter(|k| k.contains(&fragment)).collect();
            if doomed.is_empty() {
                continue;
            }

            let mut ops = Vec::with_capacity(doomed.len() * 2);
            for key in &doomed {
                ops.push(KvOp::Del { key: key.clone() });
                ops.push(KvOp::SRem { key: membership_key.clone(), member: key.clone() });
            }
            if let Err(e) = self.store.apply_batch(ops).await {
                tracing::error!(%membership_key, error = %e, "entry removal failed, skipping");
                continue;
            }
            tracing::debug!(%membership_key, removed = doomed.len(), "removed rule entries");
        }
        Ok(())
    }

    /// Entry keys watching this (station, metric). Empty on a cold cache;
    /// that is the normal no-rules case, not an error.
    pub async fn lookup(&self, station_id: i64, metric_id: i64) -> Result<Vec<String>, KvError> {
        self.store.smembers(&keys::membership_key(station_id, metric_id)).await
    }

    /// `None` covers missing, expired, concurrently-removed and
    /// unparseable entries alike; callers skip and move on.
    pub async fn read_entry(&self, entry_key: &str) -> Option<CachedCondition> {
        let raw = match self.store.get(entry_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(%entry_key, error = %e, "entry read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(%entry_key, error = %e, "unparseable index entry, skipping");
                None
            }
        }
    }

    /// Write a full generation of entries in bounded batches and return
    /// the complete live key set. A store failure aborts the pass (the
    /// caller must then not delete anything).
    pub async fn replace_all(&self, rules: &[Rule]) -> Result<HashSet<String>, KvError> {
        let mut live = HashSet::new();
        let mut ops = Vec::new();
        for rule in rules {
            ops.extend(build_rule_ops(rule, &mut live));
        }

        for chunk in ops.chunks(BATCH_SIZE) {
            self.store.apply_batch(chunk.to_vec()).await?;
        }
        tracing::info!(entries = live.len(), rules = rules.len(), "index generation written");
        Ok(live)
    }

    /// Remove every index entry not in `live`, shrinking membership sets
    /// along the way. Only called after a complete `replace_all` pass.
    pub async fn delete_except(&self, live: &HashSet<String>) -> Result<u64, KvError> {
        let all_keys = self.store.scan(keys::entry_pattern()).await?;
        let stale: Vec<String> = all_keys.into_iter().filter(|k| !live.contains(k)).collect();
        if stale.is_empty() {
            tracing::debug!("no stale index entries");
            return Ok(0);
        }

        let mut ops = Vec::with_capacity(stale.len() * 2);
        for key in &stale {
            ops.push(KvOp::Del { key: key.clone() });
            if let Some((station_id, _, metric_id, _)) = keys::parse_entry_key(key) {
                ops.push(KvOp::SRem {
                    key: keys::membership_key(station_id, metric_id),
                    member: key.clone(),
                });
            }
        }
        for chunk in ops.chunks(BATCH_SIZE) {
            self.store.apply_batch(chunk.to_vec()).await?;
        }
        tracing::info!(removed = stale.len(), "stale index entries cleaned up");
        Ok(stale.len() as u64)
    }
}

fn build_rule_ops(rule: &Rule, live: &mut HashSet<String>) -> Vec<KvOp> {
    let mut ops = Vec::new();
    for condition in &rule.conditions {
        let Some(snapshot) = CachedCondition::from_rule(rule, condition) else {
            tracing::warn!(rule_id = %rule.id, metric_id = condition.metric_id,
                "condition without uid, skipping");
            continue;
        };
        if !condition.is_complete() {
            tracing::warn!(rule_id = %rule.id, condition_uid = %snapshot.condition_uid,
                operator = %condition.operator, "condition missing thresholds, skipping");
            continue;
        }
        let value = match serde_json::to_string(&snapshot) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(rule_id = %rule.id, condition_uid = %snapshot.condition_uid,
                    error = %e, "snapshot serialization failed, skipping");
                continue;
            }
        };
        let entry_key = keys::entry_key(
            rule.station_id,
            rule.id,
            condition.metric_id,
            snapshot.condition_uid,
        );
        let membership_key = keys::membership_key(rule.station_id, condition.metric_id);
        live.insert(entry_key.clone());
        ops.push(KvOp::Set { key: entry_key.clone(), value });
        ops.push(KvOp::SAdd { key: membership_key, member: entry_key });
    }
    ops
}
