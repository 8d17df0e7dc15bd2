use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aquawatch_common::notification::{AlertNotification, Transition};
use aquawatch_common::reading::SensorReading;
use aquawatch_common::rule::{Condition, Operator, Rule};

/// Flattened snapshot of everything the evaluation path needs about one
/// condition, stored as the value of its index entry. The consumer never
/// touches the authoritative store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCondition {
    pub user_id: i64,
    pub alert_id: Uuid,
    pub alert_name: String,
    pub message: String,
    pub severity: i32,
    pub condition_uid: Uuid,
    pub operator: Operator,
    pub threshold: Option<f64>,
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,
    pub silenced: bool,
}

impl CachedCondition {
    /// `None` when the condition has no uid yet; such conditions cannot be
    /// tracked or locked and are left out of the index.
    pub fn from_rule(rule: &Rule, condition: &Condition) -> Option<Self> {
        Some(Self {
            user_id: rule.user_id,
            alert_id: rule.id,
            alert_name: rule.name.clone(),
            message: rule.message.clone(),
            severity: condition.severity,
            condition_uid: condition.uid?,
            operator: condition.operator,
            threshold: condition.threshold,
            threshold_min: condition.threshold_min,
            threshold_max: condition.threshold_max,
            silenced: rule.silenced,
        })
    }

    pub fn to_notification(
        &self,
        reading: &SensorReading,
        transition: Transition,
    ) -> AlertNotification {
        AlertNotification {
            alert_id: self.alert_id,
            alert_name: self.alert_name.clone(),
            station_id: reading.station_id,
            user_id: self.user_id,
            message: self.message.clone(),
            severity: self.severity,
            timestamp: Utc::now(),
            transition,
            silenced: self.silenced,
            metric_id: reading.sensor_id,
            metric_name: reading.metric.clone(),
            operator: self.operator,
            threshold: self.threshold,
            threshold_min: self.threshold_min,
            threshold_max: self.threshold_max,
            value: reading.value,
        }
    }
}
