use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use aquawatch_common::rule::{Condition, Rule, RuleStatus};

#[derive(Debug)]
pub struct SourceError(pub String);

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule source: {}", self.0)
    }
}

impl std::error::Error for SourceError {}

/// Read side of the authoritative rule store: everything that should be
/// in the evaluation index, i.e. active and not muted, with conditions.
#[async_trait::async_trait]
pub trait RuleSource: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Rule>, SourceError>;
}

/// Postgres-backed source. Conditions live in a JSON column; a row whose
/// conditions fail to parse is logged and skipped rather than failing the
/// whole reconciliation fetch.
pub struct PgRuleSource {
    pool: PgPool,
}

impl PgRuleSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RuleSource for PgRuleSource {
    async fn list_active(&self) -> Result<Vec<Rule>, SourceError> {
        let rows = sqlx::query(
            "SELECT uid, name, user_id, station_id, message, silenced, \
                    created_at, updated_at, conditions \
             FROM alert \
             WHERE status = 'active' AND silenced = FALSE",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SourceError(e.to_string()))?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("uid").map_err(|e| SourceError(e.to_string()))?;
            let conditions_json: Option<String> =
                row.try_get("conditions").map_err(|e| SourceError(e.to_string()))?;

            let conditions: Vec<Condition> = match conditions_json {
                Some(raw) => match serde_json::from_str(&raw) {
                    Ok(conditions) => conditions,
                    Err(e) => {
                        tracing::warn!(rule_id = %id, error = %e,
                            "unparseable conditions column, skipping rule");
                        continue;
                    }
                },
                None => Vec::new(),
            };

            rules.push(Rule {
                id,
                name: row.try_get("name").map_err(|e| SourceError(e.to_string()))?,
                user_id: row.try_get("user_id").map_err(|e| SourceError(e.to_string()))?,
                station_id: row.try_get("station_id").map_err(|e| SourceError(e.to_string()))?,
                message: row.try_get("message").map_err(|e| SourceError(e.to_string()))?,
                silenced: row.try_get("silenced").map_err(|e| SourceError(e.to_string()))?,
                status: RuleStatus::Active,
                created_at: row.try_get("created_at").map_err(|e| SourceError(e.to_string()))?,
                updated_at: row.try_get("updated_at").map_err(|e| SourceError(e.to_string()))?,
                conditions,
            });
        }
        Ok(rules)
    }
}

/// Test double; also stands in for the management collaborator in the
/// replay harness.
#[derive(Clone, Default)]
pub struct InMemoryRuleSource {
    rules: Arc<Mutex<Vec<Rule>>>,
}

impl InMemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_rules(&self, rules: Vec<Rule>) {
        *self.rules.lock().await = rules;
    }

    pub async fn push(&self, rule: Rule) {
        self.rules.lock().await.push(rule);
    }
}

#[async_trait::async_trait]
impl RuleSource for InMemoryRuleSource {
    async fn list_active(&self) -> Result<Vec<Rule>, SourceError> {
        Ok(self
            .rules
            .lock()
            .await
            .iter()
            .filter(|r| r.is_evaluable())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rule(status: RuleStatus, silenced: bool) -> Rule {
        Rule {
            id: Uuid::new_v4(),
            name: "r".into(),
            user_id: 1,
            station_id: 7,
            message: "m".into(),
            silenced,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            conditions: vec![],
        }
    }

    #[tokio::test]
    async fn in_memory_source_filters_ineligible() {
        let source = InMemoryRuleSource::new();
        source.push(rule(RuleStatus::Active, false)).await;
        source.push(rule(RuleStatus::Active, true)).await;
        source.push(rule(RuleStatus::Inactive, false)).await;
        source.push(rule(RuleStatus::Deleted, false)).await;

        let active = source.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
    }
}
