//! Core data model: waypoints, missions, severity, and metrics.

use serde::{Deserialize, Serialize};

use crate::error::DeconflictError;

/// A point in the shared airspace, in meters. `z` may be zero for 2D usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Waypoint) -> Waypoint {
        Waypoint::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(&self, other: &Waypoint) -> Waypoint {
        Waypoint::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(&self, s: f64) -> Waypoint {
        Waypoint::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn dot(&self, other: &Waypoint) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Waypoint) -> f64 {
        self.sub(other).norm()
    }

    pub fn midpoint(&self, other: &Waypoint) -> Waypoint {
        self.add(other).scale(0.5)
    }
}

/// An ordered flight plan for a single drone over a shared time axis.
///
/// Invariants enforced at construction (see [`crate::error::DeconflictError`]):
/// at least 2 waypoints, `end_time >= start_time`, and `cruise_speed`, when
/// given, must be strictly positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub drone_id: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub cruise_speed: Option<f64>,
    pub waypoints: Vec<Waypoint>,
}

impl Mission {
    pub fn new(
        drone_id: impl Into<String>,
        start_time: f64,
        end_time: f64,
        waypoints: Vec<Waypoint>,
    ) -> Self {
        Self {
            drone_id: drone_id.into(),
            start_time,
            end_time,
            cruise_speed: None,
            waypoints,
        }
    }

    pub fn with_cruise_speed(mut self, cruise_speed: f64) -> Self {
        self.cruise_speed = Some(cruise_speed);
        self
    }

    /// Sum of the Euclidean lengths of every leg.
    pub fn total_distance(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }

    /// Scheduled time window duration.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// The cruise speed a trajectory evaluator would use: the mission's own
    /// if given, otherwise total distance over scheduled duration. Degenerate
    /// zero-duration, nonzero-distance missions fall back to speed 0 rather
    /// than an infinite speed, matching the "stationary" treatment the spec
    /// gives zero-distance missions.
    pub fn effective_cruise_speed(&self) -> f64 {
        if let Some(speed) = self.cruise_speed {
            return speed;
        }
        let duration = self.duration();
        let distance = self.total_distance();
        if duration > 0.0 && distance > 0.0 {
            distance / duration
        } else {
            0.0
        }
    }

    /// Arity, monotonicity, and numeric constraints from §3/§7.
    pub fn validate(&self) -> Result<(), DeconflictError> {
        if self.waypoints.len() < 2 {
            return Err(DeconflictError::InvalidMission {
                reason: format!(
                    "mission {} has {} waypoint(s), at least 2 required",
                    self.drone_id,
                    self.waypoints.len()
                ),
            });
        }
        if self.end_time < self.start_time {
            return Err(DeconflictError::InvalidMission {
                reason: format!(
                    "mission {} end_time {} precedes start_time {}",
                    self.drone_id, self.end_time, self.start_time
                ),
            });
        }
        if let Some(speed) = self.cruise_speed {
            if speed <= 0.0 {
                return Err(DeconflictError::InvalidMission {
                    reason: format!(
                        "mission {} cruise_speed {} must be positive",
                        self.drone_id, speed
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Ordinal conflict severity, derived purely from `risk_score` (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Safe,
    Low,
    Warning,
    High,
    Critical,
}

impl Severity {
    /// Bucket a risk score in `[0, 1]` into a severity label.
    pub fn from_risk_score(risk_score: f64) -> Self {
        if risk_score < 0.10 {
            Severity::Safe
        } else if risk_score < 0.30 {
            Severity::Low
        } else if risk_score < 0.55 {
            Severity::Warning
        } else if risk_score < 0.80 {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Safe => "SAFE",
            Severity::Low => "LOW",
            Severity::Warning => "WARNING",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// A conflict that survived risk scoring, one per (other drone, maximal
/// contiguous conflict window).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessedConflict {
    pub time: f64,
    pub location: Waypoint,
    #[serde(rename = "primary_drone")]
    pub primary_id: String,
    #[serde(rename = "conflicting_drone")]
    pub other_id: String,
    pub separation_distance: f64,
    pub relative_velocity: f64,
    pub conflict_duration: f64,
    pub altitude_risk_factor: f64,
    pub risk_score: f64,
    pub severity: Severity,
    pub time_to_collision: Option<f64>,
    pub recommendation: String,
}

/// Per-stage timing and reduction counts for a single `check_mission` call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Metrics {
    pub stage1_ms: f64,
    pub stage2_ms: f64,
    pub stage3_ms: f64,
    pub total_ms: f64,
    pub input_count: usize,
    pub stage1_out: usize,
    #[serde(rename = "stage2_raw")]
    pub stage2_raw_conflicts: usize,
    pub stage3_assessed: usize,
}

/// The full JSON result shape pinned in §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeconflictionResult {
    pub cleared: bool,
    pub metrics: Metrics,
    pub conflicts: Vec<AssessedConflict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_distance_sums_legs() {
        let m = Mission::new(
            "D1",
            0.0,
            100.0,
            vec![
                Waypoint::new(0.0, 0.0, 0.0),
                Waypoint::new(3.0, 4.0, 0.0),
                Waypoint::new(3.0, 4.0, 12.0),
            ],
        );
        assert!((m.total_distance() - 17.0).abs() < 1e-9);
    }

    #[test]
    fn effective_cruise_speed_derives_from_distance_and_duration() {
        let m = Mission::new(
            "D1",
            0.0,
            10.0,
            vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(100.0, 0.0, 0.0)],
        );
        assert!((m.effective_cruise_speed() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn effective_cruise_speed_prefers_explicit_value() {
        let m = Mission::new(
            "D1",
            0.0,
            10.0,
            vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(100.0, 0.0, 0.0)],
        )
        .with_cruise_speed(5.0);
        assert!((m.effective_cruise_speed() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn zero_distance_mission_is_stationary() {
        let m = Mission::new(
            "D1",
            0.0,
            100.0,
            vec![Waypoint::new(1.0, 1.0, 1.0), Waypoint::new(1.0, 1.0, 1.0)],
        );
        assert_eq!(m.effective_cruise_speed(), 0.0);
    }

    #[test]
    fn severity_bucket_boundaries() {
        assert_eq!(Severity::from_risk_score(0.0), Severity::Safe);
        assert_eq!(Severity::from_risk_score(0.09), Severity::Safe);
        assert_eq!(Severity::from_risk_score(0.10), Severity::Low);
        assert_eq!(Severity::from_risk_score(0.29), Severity::Low);
        assert_eq!(Severity::from_risk_score(0.30), Severity::Warning);
        assert_eq!(Severity::from_risk_score(0.54), Severity::Warning);
        assert_eq!(Severity::from_risk_score(0.55), Severity::High);
        assert_eq!(Severity::from_risk_score(0.79), Severity::High);
        assert_eq!(Severity::from_risk_score(0.80), Severity::Critical);
        assert_eq!(Severity::from_risk_score(1.0), Severity::Critical);
    }

    #[test]
    fn validate_rejects_single_waypoint() {
        let m = Mission::new("D1", 0.0, 10.0, vec![Waypoint::new(0.0, 0.0, 0.0)]);
        assert!(m.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_time_window() {
        let m = Mission::new(
            "D1",
            10.0,
            0.0,
            vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(1.0, 0.0, 0.0)],
        );
        assert!(m.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_cruise_speed() {
        let m = Mission::new(
            "D1",
            0.0,
            10.0,
            vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(1.0, 0.0, 0.0)],
        )
        .with_cruise_speed(0.0);
        assert!(m.validate().is_err());
    }

    #[test]
    fn mission_json_round_trip() {
        let m = Mission::new(
            "D1",
            0.0,
            100.0,
            vec![Waypoint::new(0.0, 0.0, 100.0), Waypoint::new(1000.0, 0.0, 100.0)],
        )
        .with_cruise_speed(10.0);
        let json = serde_json::to_string(&m).unwrap();
        let back: Mission = serde_json::from_str(&json).unwrap();
        assert_eq!(back.drone_id, m.drone_id);
        assert_eq!(back.waypoints.len(), m.waypoints.len());
        for (a, b) in m.waypoints.iter().zip(back.waypoints.iter()) {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
            assert!((a.z - b.z).abs() < 1e-9);
        }
        assert_eq!(back.cruise_speed, m.cruise_speed);
    }
}
