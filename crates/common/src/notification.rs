use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert-transition event published to the outbound stream. One message
/// per state change, carrying a snapshot of the triggering condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotification {
    pub alert_id: Uuid,
    pub alert_name: String,
    pub station_id: i64,
    pub user_id: i64,
    pub message: String,
    pub severity: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub transition: Transition,
    pub silenced: bool,
    pub metric_id: i64,
    pub metric_name: String,
    pub operator: crate::rule::Operator,
    pub threshold: Option<f64>,
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Triggered,
    Resolved,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::Resolved => "resolved",
        }
    }
}
