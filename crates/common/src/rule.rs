use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert rule as owned by the authoritative store. One rule per
/// (user, station), carrying one threshold condition per metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: Uuid,
    pub name: String,
    pub user_id: i64,
    pub station_id: i64,
    pub message: String,
    pub silenced: bool,
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    /// Eligible for the evaluation index. Mute suppresses at
    /// index-population time, not at evaluation time.
    pub fn is_evaluable(&self) -> bool {
        self.status == RuleStatus::Active && !self.silenced
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Active,
    Inactive,
    Deleted,
}

/// Single threshold test within a rule, tied to one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Assigned by the management collaborator at creation. Conditions
    /// without one cannot be tracked or locked and are skipped.
    #[serde(default)]
    pub uid: Option<Uuid>,
    pub metric_id: i64,
    pub metric_name: String,
    pub operator: Operator,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub threshold_min: Option<f64>,
    #[serde(default)]
    pub threshold_max: Option<f64>,
    pub severity: i32,
}

impl Condition {
    /// Range operators need both bounds, scalar operators need the
    /// threshold. Incomplete conditions evaluate as never-satisfied.
    pub fn is_complete(&self) -> bool {
        if self.operator.requires_range() {
            self.threshold_min.is_some() && self.threshold_max.is_some()
        } else {
            self.threshold.is_some()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "eq", alias = "EQ", alias = "equal")]
    Equal,
    #[serde(rename = "neq", alias = "NEQ", alias = "ne", alias = "not_equal")]
    NotEqual,
    #[serde(rename = "gt", alias = "GT")]
    GreaterThan,
    #[serde(rename = "gte", alias = "GTE")]
    GreaterOrEqual,
    #[serde(rename = "lt", alias = "LT")]
    LessThan,
    #[serde(rename = "lte", alias = "LTE")]
    LessOrEqual,
    #[serde(rename = "range", alias = "RANGE", alias = "between")]
    Range,
    #[serde(rename = "outside_range", alias = "OUTSIDE_RANGE", alias = "not_between")]
    OutsideRange,
}

/// Wire metadata for one operator, exposed to the management boundary as
/// the capability set.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub operator: Operator,
    pub code: &'static str,
    pub takes_range: bool,
}

impl Operator {
    pub const ALL: [OperatorInfo; 8] = [
        OperatorInfo { operator: Operator::Equal, code: "eq", takes_range: false },
        OperatorInfo { operator: Operator::NotEqual, code: "neq", takes_range: false },
        OperatorInfo { operator: Operator::GreaterThan, code: "gt", takes_range: false },
        OperatorInfo { operator: Operator::GreaterOrEqual, code: "gte", takes_range: false },
        OperatorInfo { operator: Operator::LessThan, code: "lt", takes_range: false },
        OperatorInfo { operator: Operator::LessOrEqual, code: "lte", takes_range: false },
        OperatorInfo { operator: Operator::Range, code: "range", takes_range: true },
        OperatorInfo { operator: Operator::OutsideRange, code: "outside_range", takes_range: true },
    ];

    pub fn code(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|info| info.operator == *self)
            .map(|info| info.code)
            .unwrap_or("unknown")
    }

    pub fn requires_range(&self) -> bool {
        matches!(self, Self::Range | Self::OutsideRange)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_condition(operator: Operator) -> Condition {
        Condition {
            uid: Some(Uuid::new_v4()),
            metric_id: 3,
            metric_name: "ph".into(),
            operator,
            threshold: Some(7.0),
            threshold_min: None,
            threshold_max: None,
            severity: 2,
        }
    }

    #[test]
    fn operator_wire_codes_round_trip() {
        for info in Operator::ALL {
            let json = serde_json::to_string(&info.operator).unwrap();
            assert_eq!(json, format!("\"{}\"", info.code));
            let back: Operator = serde_json::from_str(&json).unwrap();
            assert_eq!(back, info.operator);
        }
    }

    #[test]
    fn operator_accepts_legacy_codes() {
        let op: Operator = serde_json::from_str("\"GTE\"").unwrap();
        assert_eq!(op, Operator::GreaterOrEqual);
        let op: Operator = serde_json::from_str("\"between\"").unwrap();
        assert_eq!(op, Operator::Range);
        let op: Operator = serde_json::from_str("\"not_between\"").unwrap();
        assert_eq!(op, Operator::OutsideRange);
        let op: Operator = serde_json::from_str("\"ne\"").unwrap();
        assert_eq!(op, Operator::NotEqual);
    }

    #[test]
    fn unknown_operator_fails_to_parse() {
        assert!(serde_json::from_str::<Operator>("\"matches\"").is_err());
    }

    #[test]
    fn scalar_condition_completeness() {
        let mut c = sample_condition(Operator::GreaterThan);
        assert!(c.is_complete());
        c.threshold = None;
        assert!(!c.is_complete());
    }

    #[test]
    fn range_condition_completeness() {
        let mut c = sample_condition(Operator::Range);
        c.threshold = None;
        assert!(!c.is_complete());
        c.threshold_min = Some(5.0);
        assert!(!c.is_complete());
        c.threshold_max = Some(10.0);
        assert!(c.is_complete());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RuleStatus::Active).unwrap(), "\"active\"");
        let s: RuleStatus = serde_json::from_str("\"deleted\"").unwrap();
        assert_eq!(s, RuleStatus::Deleted);
    }

    #[test]
    fn muted_rule_is_not_evaluable() {
        let rule = Rule {
            id: Uuid::new_v4(),
            name: "pH drift".into(),
            user_id: 12,
            station_id: 7,
            message: "pH out of band".into(),
            silenced: true,
            status: RuleStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            conditions: vec![],
        };
        assert!(!rule.is_evaluable());
    }
}
