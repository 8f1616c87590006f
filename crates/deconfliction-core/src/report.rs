//! Human-readable text report (§6), pinned field labels and ordering.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{AssessedConflict, Metrics, Mission, Severity};

fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Render the pinned text report for one `check_mission` result.
pub fn generate_report(
    primary: &Mission,
    traffic_count: usize,
    cleared: bool,
    conflicts: &[AssessedConflict],
    metrics: &Metrics,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    out.push_str(&rule);
    out.push('\n');
    out.push_str("DECONFLICTION REPORT\n");
    out.push_str(&format!("Generated: {:.3}\n", current_timestamp()));
    out.push_str(&rule);
    out.push_str("\n\n");

    out.push_str("PRIMARY MISSION\n");
    out.push_str(&format!("  Drone ID:        {}\n", primary.drone_id));
    out.push_str(&format!("  Waypoints:       {}\n", primary.waypoints.len()));
    out.push_str(&format!(
        "  Time Window:     {:.1}s - {:.1}s\n",
        primary.start_time, primary.end_time
    ));
    out.push_str(&format!("  Duration:        {:.1}s\n", primary.duration()));
    out.push_str(&format!(
        "  Total Distance:  {:.1}m\n",
        primary.total_distance()
    ));
    out.push_str(&format!(
        "  Cruise Speed:    {:.1}m/s\n\n",
        primary.effective_cruise_speed()
    ));

    out.push_str("TRAFFIC ENVIRONMENT\n");
    out.push_str(&format!("  Registered Drones: {}\n\n", traffic_count));

    out.push_str("DECONFLICTION ANALYSIS\n");
    out.push_str(&format!(
        "  Stage 1 (Filter):    {:.3}ms  ->  {}/{} candidates\n",
        metrics.stage1_ms, metrics.stage1_out, metrics.input_count
    ));
    out.push_str(&format!(
        "  Stage 2 (Grid):      {:.3}ms  ->  {} raw conflicts\n",
        metrics.stage2_ms, metrics.stage2_raw_conflicts
    ));
    out.push_str(&format!(
        "  Stage 3 (Risk):      {:.3}ms  ->  {} assessed conflicts\n",
        metrics.stage3_ms, metrics.stage3_assessed
    ));
    out.push_str(&format!("  Total:               {:.3}ms\n\n", metrics.total_ms));

    out.push_str("DECISION: ");
    out.push_str(if cleared {
        "MISSION CLEARED\n\n"
    } else {
        "MISSION REJECTED\n\n"
    });

    out.push_str("CONFLICT SUMMARY\n");
    let mut counts = [0usize; 5];
    for c in conflicts {
        match c.severity {
            Severity::Critical => counts[0] += 1,
            Severity::High => counts[1] += 1,
            Severity::Warning => counts[2] += 1,
            Severity::Low => counts[3] += 1,
            Severity::Safe => counts[4] += 1,
        }
    }
    out.push_str(&format!(
        "  CRITICAL: {}  HIGH: {}  WARNING: {}  LOW: {}  SAFE: {}\n\n",
        counts[0], counts[1], counts[2], counts[3], counts[4]
    ));

    out.push_str("TOP 5 HIGHEST-RISK CONFLICTS\n");
    if conflicts.is_empty() {
        out.push_str("  (none)\n");
    }
    for (rank, conflict) in conflicts.iter().take(5).enumerate() {
        out.push_str(&format!(
            "  #{} [{}] vs {}  risk={:.2}  sep={:.1}m  t={:.1}s\n",
            rank + 1,
            conflict.severity.as_str(),
            conflict.other_id,
            conflict.risk_score,
            conflict.separation_distance,
            conflict.time,
        ));
        out.push_str(&format!("      {}\n", conflict.recommendation));
    }

    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    out
}
