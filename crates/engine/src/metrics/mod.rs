pub mod exposition;
mod engine_metrics;

pub use self::engine_metrics::EngineMetrics;

#[cfg(test)]
mod tests {
    use super::exposition::render_prometheus;
    use super::EngineMetrics;
    use std::time::Instant;

    #[test]
    fn counters_increment() {
        let m = EngineMetrics::new();
        m.inc_readings_processed();
        m.inc_readings_processed();
        m.inc_alerts_triggered();
        assert_eq!(m.readings_processed_val(), 2);
        assert_eq!(m.alerts_triggered_val(), 1);
        assert_eq!(m.alerts_resolved_val(), 0);
    }

    #[test]
    fn latency_recording() {
        let m = EngineMetrics::new();
        let start = Instant::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        m.record_eval_latency(start);
        let (sum, count) = m.eval_latency_vals();
        assert!(sum > 0);
        assert_eq!(count, 1);
    }

    #[test]
    fn prometheus_output_contains_metric_names() {
        let m = EngineMetrics::new();
        m.inc_alerts_triggered();
        m.inc_lock_timeouts();
        let output = render_prometheus(&m);
        assert!(output.contains("aquawatch_engine_alerts_triggered_total 1"));
        assert!(output.contains("aquawatch_engine_lock_timeouts_total 1"));
        assert!(output.contains("# TYPE aquawatch_engine_eval_latency_us summary"));
    }
}
