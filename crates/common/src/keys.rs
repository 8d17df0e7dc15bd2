//! The single composite-key scheme shared by the rule index, the tracking
//! store and the per-condition locks.
//!
//! Entry keys address one cached condition; membership keys hold the set
//! of entry keys for a (station, metric) pair so the consumer can find
//! every condition watching a reading with one set lookup.

use uuid::Uuid;

/// `station:{station}:alert:{rule}:metric:{metric}:condition:{condition}`
pub fn entry_key(station_id: i64, rule_id: Uuid, metric_id: i64, condition_uid: Uuid) -> String {
    format!("station:{station_id}:alert:{rule_id}:metric:{metric_id}:condition:{condition_uid}")
}

/// `idx:station:{station}:metric:{metric}` — membership set of entry keys.
pub fn membership_key(station_id: i64, metric_id: i64) -> String {
    format!("idx:station:{station_id}:metric:{metric_id}")
}

/// Pattern matching every membership set of one station.
pub fn membership_pattern_for_station(station_id: i64) -> String {
    format!("idx:station:{station_id}:metric:*")
}

/// Pattern matching every entry key in the index.
pub fn entry_pattern() -> &'static str {
    "station:*:alert:*:metric:*:condition:*"
}

/// Segment an entry key must contain to belong to the given rule.
pub fn rule_fragment(rule_id: Uuid) -> String {
    format!(":alert:{rule_id}:")
}

/// Decompose an entry key into (station, rule, metric, condition).
/// Returns `None` for keys that do not follow the scheme.
pub fn parse_entry_key(key: &str) -> Option<(i64, Uuid, i64, Uuid)> {
    let parts: Vec<&str> = key.split(':').collect();
    match parts.as_slice() {
        ["station", station, "alert", rule, "metric", metric, "condition", condition] => {
            Some((
                station.parse().ok()?,
                Uuid::parse_str(rule).ok()?,
                metric.parse().ok()?,
                Uuid::parse_str(condition).ok()?,
            ))
        }
        _ => None,
    }
}

/// `tracking:{condition}` — exists while the condition is firing.
pub fn tracking_key(condition_uid: Uuid) -> String {
    format!("tracking:{condition_uid}")
}

/// `lock:tracking:{condition}` — mutual exclusion for the firing state.
pub fn lock_key(condition_uid: Uuid) -> String {
    format!("lock:tracking:{condition_uid}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_key_segments() {
        let rule = Uuid::nil();
        let cond = Uuid::nil();
        assert_eq!(
            entry_key(7, rule, 3, cond),
            format!("station:7:alert:{rule}:metric:3:condition:{cond}")
        );
    }

    #[test]
    fn membership_key_format() {
        assert_eq!(membership_key(7, 3), "idx:station:7:metric:3");
        assert_eq!(membership_pattern_for_station(7), "idx:station:7:metric:*");
    }

    #[test]
    fn rule_fragment_selects_only_that_rule() {
        let rule = Uuid::new_v4();
        let other = Uuid::new_v4();
        let cond = Uuid::new_v4();
        let key = entry_key(7, rule, 3, cond);
        assert!(key.contains(&rule_fragment(rule)));
        assert!(!key.contains(&rule_fragment(other)));
    }

    #[test]
    fn entry_key_round_trips_through_parse() {
        let rule = Uuid::new_v4();
        let cond = Uuid::new_v4();
        let key = entry_key(7, rule, 3, cond);
        assert_eq!(parse_entry_key(&key), Some((7, rule, 3, cond)));
    }

    #[test]
    fn parse_rejects_foreign_keys() {
        assert_eq!(parse_entry_key("tracking:abc"), None);
        assert_eq!(parse_entry_key("station:x:alert:y:metric:z:condition:w"), None);
        assert_eq!(parse_entry_key("station:7:alert"), None);
    }

    #[test]
    fn tracking_and_lock_keys_are_distinct() {
        let cond = Uuid::new_v4();
        assert_ne!(tracking_key(cond), lock_key(cond));
        assert!(lock_key(cond).starts_with("lock:tracking:"));
    }
}
