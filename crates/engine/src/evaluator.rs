use aquawatch_common::rule::Operator;

/// Evaluation knobs, passed explicitly rather than read from a global.
#[derive(Debug, Clone, Copy)]
pub struct EvalPolicy {
    /// Absolute-difference tolerance for equality comparisons; exact
    /// floating-point equality is meaningless for sensor values.
    pub equality_tolerance: f64,
}

impl Default for EvalPolicy {
    fn default() -> Self {
        Self { equality_tolerance: 0.001 }
    }
}

/// Whether a reading value satisfies a condition. Missing required
/// thresholds make a condition never-satisfied; nothing here can fail,
/// because a broken rule must not block the stream.
pub fn satisfies(
    policy: EvalPolicy,
    operator: Operator,
    value: f64,
    threshold: Option<f64>,
    threshold_min: Option<f64>,
    threshold_max: Option<f64>,
) -> bool {
    match operator {
        Operator::Equal => {
            threshold.is_some_and(|t| (value - t).abs() < policy.equality_tolerance)
        }
        Operator::NotEqual => {
            threshold.is_some_and(|t| (value - t).abs() >= policy.equality_tolerance)
        }
        Operator::GreaterThan => threshold.is_some_and(|t| value > t),
        Operator::GreaterOrEqual => threshold.is_some_and(|t| value >= t),
        Operator::LessThan => threshold.is_some_and(|t| value < t),
        Operator::LessOrEqual => threshold.is_some_and(|t| value <= t),
        Operator::Range => match (threshold_min, threshold_max) {
            (Some(min), Some(max)) => value >= min && value <= max,
            _ => false,
        },
        Operator::OutsideRange => match (threshold_min, threshold_max) {
            (Some(min), Some(max)) => value < min || value > max,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(operator: Operator, value: f64, t: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
        satisfies(EvalPolicy::default(), operator, value, t, min, max)
    }

    #[test]
    fn equality_uses_tolerance() {
        assert!(check(Operator::Equal, 10.0005, Some(10.0), None, None));
        assert!(!check(Operator::Equal, 10.002, Some(10.0), None, None));
    }

    #[test]
    fn not_equal_is_complement_of_equal() {
        assert!(!check(Operator::NotEqual, 10.0005, Some(10.0), None, None));
        assert!(check(Operator::NotEqual, 10.002, Some(10.0), None, None));
    }

    #[test]
    fn scalar_comparisons() {
        assert!(check(Operator::GreaterThan, 26.0, Some(25.0), None, None));
        assert!(!check(Operator::GreaterThan, 25.0, Some(25.0), None, None));
        assert!(check(Operator::GreaterOrEqual, 25.0, Some(25.0), None, None));
        assert!(check(Operator::LessThan, 24.9, Some(25.0), None, None));
        assert!(!check(Operator::LessThan, 25.0, Some(25.0), None, None));
        assert!(check(Operator::LessOrEqual, 25.0, Some(25.0), None, None));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(check(Operator::Range, 5.0, None, Some(5.0), Some(10.0)));
        assert!(check(Operator::Range, 10.0, None, Some(5.0), Some(10.0)));
        assert!(check(Operator::Range, 7.5, None, Some(5.0), Some(10.0)));
        assert!(!check(Operator::Range, 10.01, None, Some(5.0), Some(10.0)));
        assert!(!check(Operator::Range, 4.99, None, Some(5.0), Some(10.0)));
    }

    #[test]
    fn outside_range_excludes_bounds() {
        assert!(check(Operator::OutsideRange, 4.99, None, Some(5.0), Some(10.0)));
        assert!(check(Operator::OutsideRange, 10.01, None, Some(5.0), Some(10.0)));
        assert!(!check(Operator::OutsideRange, 5.0, None, Some(5.0), Some(10.0)));
        assert!(!check(Operator::OutsideRange, 10.0, None, Some(5.0), Some(10.0)));
        assert!(!check(Operator::OutsideRange, 7.5, None, Some(5.0), Some(10.0)));
    }

    #[test]
    fn missing_thresholds_never_satisfy() {
        assert!(!check(Operator::GreaterThan, 100.0, None, None, None));
        assert!(!check(Operator::Equal, 0.0, None, None, None));
        assert!(!check(Operator::Range, 7.0, Some(7.0), None, Some(10.0)));
        assert!(!check(Operator::OutsideRange, 7.0, Some(7.0), Some(5.0), None));
    }

    #[test]
    fn custom_tolerance_is_honored() {
        let loose = EvalPolicy { equality_tolerance: 0.1 };
        assert!(satisfies(loose, Operator::Equal, 10.05, Some(10.0), None, None));
        assert!(!satisfies(loose, Operator::Equal, 10.2, Some(10.0), None, None));
    }
}
