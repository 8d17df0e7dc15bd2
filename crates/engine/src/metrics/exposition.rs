use std::sync::Arc;

use super::engine_metrics::EngineMetrics;

pub fn render_prometheus(m: &Arc<EngineMetrics>) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "aquawatch_engine_readings_processed_total", m.readings_processed_val());
    write_counter(&mut out, "aquawatch_engine_readings_malformed_total", m.readings_malformed_val());
    write_counter(&mut out, "aquawatch_engine_entries_evaluated_total", m.entries_evaluated_val());
    write_counter(&mut out, "aquawatch_engine_entries_skipped_total", m.entries_skipped_val());
    write_counter(&mut out, "aquawatch_engine_lock_timeouts_total", m.lock_timeouts_val());
    write_counter(&mut out, "aquawatch_engine_alerts_triggered_total", m.alerts_triggered_val());
    write_counter(&mut out, "aquawatch_engine_alerts_resolved_total", m.alerts_resolved_val());
    write_counter(&mut out, "aquawatch_engine_notifications_sent_total", m.notifications_sent_val());
    write_counter(&mut out, "aquawatch_engine_notifications_failed_total", m.notifications_failed_val());
    write_counter(&mut out, "aquawatch_engine_reconcile_runs_total", m.reconcile_runs_val());
    write_counter(&mut out, "aquawatch_engine_reconcile_failures_total", m.reconcile_failures_val());

    let (sum, count) = m.eval_latency_vals();
    write_summary(&mut out, "aquawatch_engine_eval_latency_us", sum, count);

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}

fn write_summary(out: &mut String, name: &str, sum: u64, count: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} summary");
    let _ = writeln!(out, "{name}_sum {sum}");
    let _ = writeln!(out, "{name}_count {count}");
}
