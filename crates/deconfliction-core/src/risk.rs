//! Stage 3: conflict-window coalescing and risk scoring (§4.4).

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::grid::RawConflict;
use crate::models::{AssessedConflict, Severity};
use crate::trajectory::Trajectory;

/// A maximal contiguous run of [`RawConflict`]s against the same other
/// drone, with no gap larger than one grid time bucket.
struct ConflictWindow {
    other_index: usize,
    times: Vec<f64>,
    primary_positions: Vec<crate::models::Waypoint>,
    other_positions: Vec<crate::models::Waypoint>,
    separations: Vec<f64>,
}

/// Group raw conflicts by other drone (preserving time order, since the
/// Stage 2 sweep emits them in increasing `t`), then split each group on
/// any gap larger than `time_step`.
fn coalesce(raw: Vec<RawConflict>, time_step: f64) -> Vec<ConflictWindow> {
    let mut by_other: HashMap<usize, Vec<RawConflict>> = HashMap::new();
    for conflict in raw {
        by_other.entry(conflict.other_index).or_default().push(conflict);
    }

    let mut windows = Vec::new();
    // Deterministic ordering: iterate other_index ascending so two runs
    // over the same candidate set always coalesce identically.
    let mut keys: Vec<usize> = by_other.keys().copied().collect();
    keys.sort_unstable();

    for other_index in keys {
        let conflicts = &by_other[&other_index];
        let mut current = ConflictWindow {
            other_index,
            times: Vec::new(),
            primary_positions: Vec::new(),
            other_positions: Vec::new(),
            separations: Vec::new(),
        };
        let mut last_time: Option<f64> = None;

        for conflict in conflicts {
            if let Some(prev) = last_time {
                if conflict.time - prev > time_step + f64::EPSILON.sqrt() {
                    windows.push(std::mem::replace(
                        &mut current,
                        ConflictWindow {
                            other_index,
                            times: Vec::new(),
                            primary_positions: Vec::new(),
                            other_positions: Vec::new(),
                            separations: Vec::new(),
                        },
                    ));
                }
            }
            current.times.push(conflict.time);
            current.primary_positions.push(conflict.primary_pos);
            current.other_positions.push(conflict.other_pos);
            current.separations.push(conflict.separation);
            last_time = Some(conflict.time);
        }
        if !current.times.is_empty() {
            windows.push(current);
        }
    }

    windows
}

fn altitude_risk_factor(z: f64) -> f64 {
    if z < 30.0 {
        1.0
    } else if z <= 120.0 {
        1.2
    } else if z <= 300.0 {
        1.0
    } else {
        0.9
    }
}

fn recommendation(severity: Severity, other_id: &str, ttc: Option<f64>, separation: f64) -> String {
    let ttc_str = match ttc {
        Some(t) => format!("{t:.1}s"),
        None => "n/a".to_string(),
    };
    let verb = match severity {
        Severity::Critical => "REJECT \u{2013} imminent collision",
        Severity::High => "WARN \u{2013} altitude adjustment or delay",
        Severity::Warning => "ADJUST \u{2013} minor reroute recommended",
        Severity::Low => "MONITOR",
        Severity::Safe => "CLEAR",
    };
    format!(
        "{verb} with {other_id} (TTC {ttc_str}, separation {separation:.1}m)"
    )
}

fn score_window(
    primary: &Trajectory,
    other: &Trajectory,
    window: &ConflictWindow,
    config: &EngineConfig,
) -> AssessedConflict {
    let (min_idx, &separation_distance) = window
        .separations
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .expect("conflict window is never empty");

    let t_min = window.times[min_idx];
    let location = window.primary_positions[min_idx].midpoint(&window.other_positions[min_idx]);

    let v_primary_min = primary.velocity_at(t_min);
    let v_other_min = other.velocity_at(t_min);
    let relative_velocity = v_primary_min.sub(&v_other_min).norm();

    let t_a = window.times[0];
    let t_b = *window.times.last().unwrap();
    let conflict_duration = (t_b - t_a) + config.grid_time_step;

    let delta_p = window.other_positions[0].sub(&window.primary_positions[0]);
    let v_primary_a = primary.velocity_at(t_a);
    let v_other_a = other.velocity_at(t_a);
    let delta_v = v_other_a.sub(&v_primary_a);
    let dv_squared = delta_v.dot(&delta_v);
    let time_to_collision = if dv_squared < 1e-6 {
        None
    } else {
        let t_star = -(delta_p.dot(&delta_v)) / dv_squared;
        Some(t_star.max(0.0))
    };

    let altitude_risk_factor = altitude_risk_factor(location.z);

    let dynamic_buffer = config.dynamic_safety_buffer(relative_velocity);
    let sep_score = (1.0 - separation_distance / dynamic_buffer).clamp(0.0, 1.0);
    let vel_score = (relative_velocity / config.v_ref).clamp(0.0, 1.0);
    let dur_score = (conflict_duration / config.d_ref).clamp(0.0, 1.0);
    let ttc_score = match time_to_collision {
        None => 0.0,
        Some(ttc) => (1.0 - ttc / config.ttc_ref).clamp(0.0, 1.0),
    };

    let raw = 0.40 * sep_score + 0.25 * ttc_score + 0.20 * vel_score + 0.15 * dur_score;
    let risk_score = (raw * altitude_risk_factor).clamp(0.0, 1.0);
    let severity = Severity::from_risk_score(risk_score);

    AssessedConflict {
        time: t_min,
        location,
        primary_id: primary.drone_id().to_string(),
        other_id: other.drone_id().to_string(),
        separation_distance,
        relative_velocity,
        conflict_duration,
        altitude_risk_factor,
        risk_score,
        severity,
        time_to_collision,
        recommendation: recommendation(severity, other.drone_id(), time_to_collision, separation_distance),
    }
}

/// Coalesce raw conflicts into windows and score each one. Returns the
/// assessed conflicts sorted by risk score descending, ties broken by
/// ascending time (§4.4 ordering).
pub fn assess(
    primary: &Trajectory,
    candidates: &[&Trajectory],
    raw: Vec<RawConflict>,
    config: &EngineConfig,
) -> Vec<AssessedConflict> {
    let windows = coalesce(raw, config.grid_time_step);
    let mut assessed: Vec<AssessedConflict> = windows
        .iter()
        .map(|window| score_window(primary, candidates[window.other_index], window, config))
        .collect();

    assessed.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap()
            .then(a.time.partial_cmp(&b.time).unwrap())
    });
    assessed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::OccupancyGrid;
    use crate::models::{Mission, Waypoint};

    fn traj(drone_id: &str, start: f64, end: f64, from: Waypoint, to: Waypoint) -> Trajectory {
        Trajectory::from_mission(&Mission::new(drone_id, start, end, vec![from, to])).unwrap()
    }

    #[test]
    fn head_on_crossing_is_critical() {
        let primary = traj(
            "P",
            0.0,
            100.0,
            Waypoint::new(0.0, 0.0, 100.0),
            Waypoint::new(1000.0, 0.0, 100.0),
        );
        let other = traj(
            "T1",
            0.0,
            100.0,
            Waypoint::new(1000.0, 0.0, 100.0),
            Waypoint::new(0.0, 0.0, 100.0),
        );
        let config = EngineConfig::default();
        let candidates = vec![&other];
        let grid = OccupancyGrid::build(&candidates, primary.mission_start(), &config);
        let raw = grid.query(&primary, &candidates, &config);
        let assessed = assess(&primary, &candidates, raw, &config);

        assert_eq!(assessed.len(), 1);
        assert_eq!(assessed[0].other_id, "T1");
        assert_eq!(assessed[0].severity, Severity::Critical);
        assert!(assessed[0].separation_distance < 5.0);
        assert!((assessed[0].time - 50.0).abs() < 2.0);
    }

    #[test]
    fn stationary_hover_triggers_a_critical_conflict() {
        let primary = traj(
            "P",
            0.0,
            100.0,
            Waypoint::new(0.0, 0.0, 100.0),
            Waypoint::new(1000.0, 0.0, 100.0),
        );
        let hover = traj(
            "T6",
            0.0,
            100.0,
            Waypoint::new(500.0, 0.0, 100.0),
            Waypoint::new(500.0, 0.0, 100.0),
        );
        let config = EngineConfig::default();
        let candidates = vec![&hover];
        let grid = OccupancyGrid::build(&candidates, primary.mission_start(), &config);
        let raw = grid.query(&primary, &candidates, &config);
        let assessed = assess(&primary, &candidates, raw, &config);

        assert_eq!(assessed.len(), 1);
        assert_eq!(assessed[0].severity, Severity::Critical);
        assert!(assessed[0].separation_distance < 1.0);
    }

    #[test]
    fn altitude_stack_applies_1_2_factor() {
        let primary = traj(
            "P",
            0.0,
            100.0,
            Waypoint::new(0.0, 0.0, 100.0),
            Waypoint::new(1000.0, 0.0, 100.0),
        );
        let other = traj(
            "T4",
            0.0,
            100.0,
            Waypoint::new(0.0, 0.0, 60.0),
            Waypoint::new(1000.0, 0.0, 60.0),
        );
        let config = EngineConfig::default();
        let candidates = vec![&other];
        let grid = OccupancyGrid::build(&candidates, primary.mission_start(), &config);
        let raw = grid.query(&primary, &candidates, &config);
        let assessed = assess(&primary, &candidates, raw, &config);

        assert_eq!(assessed.len(), 1);
        assert!((assessed[0].altitude_risk_factor - 1.2).abs() < 1e-9);
        assert!(assessed[0].severity >= Severity::Warning);
    }
}
