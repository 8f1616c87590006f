//! Trajectory evaluator (§4.1): turns a [`Mission`] into a continuous,
//! piecewise-linear position/velocity function plus a bounding box.

use crate::error::DeconflictError;
use crate::models::{Mission, Waypoint};

/// A derived, continuous view of a [`Mission`]. Immutable once built.
#[derive(Debug, Clone)]
pub struct Trajectory {
    drone_id: String,
    waypoints: Vec<Waypoint>,
    /// Unit direction vector per leg.
    leg_directions: Vec<Waypoint>,
    /// Cumulative absolute time at which each leg completes.
    leg_end_times: Vec<f64>,
    mission_start: f64,
    mission_end: f64,
    /// Time at which motion along the path completes, independent of
    /// `mission_end` (the drone may loiter at the final waypoint until
    /// `mission_end` if it arrives early).
    motion_end: f64,
    cruise_speed: f64,
    total_distance: f64,
}

impl Trajectory {
    /// Build a trajectory from a validated mission. Returns the same
    /// [`DeconflictError::InvalidMission`] the mission itself would on
    /// `validate()`.
    pub fn from_mission(mission: &Mission) -> Result<Self, DeconflictError> {
        mission.validate()?;

        let cruise_speed = mission.effective_cruise_speed();
        let total_distance = mission.total_distance();

        let mut leg_directions = Vec::with_capacity(mission.waypoints.len() - 1);
        let mut leg_end_times = Vec::with_capacity(mission.waypoints.len() - 1);
        let mut t = mission.start_time;

        for leg in mission.waypoints.windows(2) {
            let delta = leg[1].sub(&leg[0]);
            let len = delta.norm();
            let direction = if len > 0.0 {
                delta.scale(1.0 / len)
            } else {
                Waypoint::new(0.0, 0.0, 0.0)
            };
            let leg_duration = if cruise_speed > 0.0 { len / cruise_speed } else { 0.0 };
            t += leg_duration;
            leg_directions.push(direction);
            leg_end_times.push(t);
        }

        let motion_end = *leg_end_times.last().unwrap_or(&mission.start_time);

        Ok(Self {
            drone_id: mission.drone_id.clone(),
            waypoints: mission.waypoints.clone(),
            leg_directions,
            leg_end_times,
            mission_start: mission.start_time,
            mission_end: mission.end_time,
            motion_end,
            cruise_speed,
            total_distance,
        })
    }

    pub fn drone_id(&self) -> &str {
        &self.drone_id
    }

    pub fn mission_start(&self) -> f64 {
        self.mission_start
    }

    pub fn mission_end(&self) -> f64 {
        self.mission_end
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn cruise_speed(&self) -> f64 {
        self.cruise_speed
    }

    /// Scheduled time window duration (not the motion duration — a drone can
    /// arrive early and loiter at its final waypoint).
    pub fn duration(&self) -> f64 {
        self.mission_end - self.mission_start
    }

    /// Index of the leg active at absolute time `t`, and the leg's own
    /// start time. `t` is assumed to be within `[mission_start, motion_end)`.
    fn leg_at(&self, t: f64) -> (usize, f64) {
        // leg_end_times[i] is the time leg i completes; find the first leg
        // whose end time is strictly greater than t.
        let idx = self.leg_end_times.partition_point(|&end| end <= t);
        let idx = idx.min(self.leg_directions.len() - 1);
        let leg_start = if idx == 0 {
            self.mission_start
        } else {
            self.leg_end_times[idx - 1]
        };
        (idx, leg_start)
    }

    /// Position at absolute time `t`. Clamps to the first waypoint before
    /// `mission_start` and to the last waypoint once motion completes.
    pub fn position_at(&self, t: f64) -> Waypoint {
        if t <= self.mission_start {
            return self.waypoints[0];
        }
        if t >= self.motion_end {
            return *self.waypoints.last().unwrap();
        }
        let (idx, leg_start) = self.leg_at(t);
        let leg_duration = self.leg_end_times[idx] - leg_start;
        let progress = if leg_duration > 0.0 {
            ((t - leg_start) / leg_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let delta = self.waypoints[idx + 1].sub(&self.waypoints[idx]);
        self.waypoints[idx].add(&delta.scale(progress))
    }

    /// Velocity at absolute time `t`. Zero before `mission_start` and after
    /// motion completes; constant (direction × cruise speed) within a leg.
    pub fn velocity_at(&self, t: f64) -> Waypoint {
        if t <= self.mission_start || t >= self.motion_end {
            return Waypoint::new(0.0, 0.0, 0.0);
        }
        let (idx, _) = self.leg_at(t);
        self.leg_directions[idx].scale(self.cruise_speed)
    }

    /// Componentwise min/max over the mission's waypoints. Not inflated —
    /// inflation is the filter pipeline's job (§4.2).
    pub fn bounding_box(&self) -> (Waypoint, Waypoint) {
        let mut min = self.waypoints[0];
        let mut max = self.waypoints[0];
        for wp in &self.waypoints[1..] {
            min.x = min.x.min(wp.x);
            min.y = min.y.min(wp.y);
            min.z = min.z.min(wp.z);
            max.x = max.x.max(wp.x);
            max.y = max.y.max(wp.y);
            max.z = max.z.max(wp.z);
        }
        (min, max)
    }
}
