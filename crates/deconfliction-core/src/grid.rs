//! Stage 2: sparse 4D occupancy grid and the primary sweep that emits
//! [`RawConflict`]s (§4.3).

use std::collections::{HashMap, HashSet};

use crate::config::EngineConfig;
use crate::models::Waypoint;
use crate::trajectory::Trajectory;

/// A single instant at which the primary came within its dynamic safety
/// buffer of another drone. Consecutive raw conflicts for the same drone
/// coalesce into a conflict window before Stage 3 (see [`crate::risk`]).
#[derive(Debug, Clone)]
pub struct RawConflict {
    pub time: f64,
    pub primary_pos: Waypoint,
    pub other_index: usize,
    pub other_pos: Waypoint,
    pub separation: f64,
}

type CellKey = (i64, i64, i64, i64);

/// The sparse 4D (space × time) index. Exclusively owned by one
/// `check_mission` call; never shared or persisted across calls.
pub struct OccupancyGrid {
    cell_size: f64,
    time_step: f64,
    t0: f64,
    cells: HashMap<CellKey, HashSet<usize>>,
}

impl OccupancyGrid {
    fn cell_index(&self, pos: &Waypoint) -> (i64, i64, i64) {
        (
            (pos.x / self.cell_size).floor() as i64,
            (pos.y / self.cell_size).floor() as i64,
            (pos.z / self.cell_size).floor() as i64,
        )
    }

    fn time_index(&self, t: f64) -> i64 {
        ((t - self.t0) / self.time_step).floor() as i64
    }

    fn insert(&mut self, cell: (i64, i64, i64), time_bucket: i64, candidate: usize) {
        self.cells
            .entry((cell.0, cell.1, cell.2, time_bucket))
            .or_default()
            .insert(candidate);
    }

    /// Build the index over the Stage 1 survivors, indexed by position in
    /// `candidates` (the index is what's stored; the caller maps it back to
    /// a drone id / trajectory).
    pub fn build(candidates: &[&Trajectory], primary_start: f64, config: &EngineConfig) -> Self {
        let mut grid = OccupancyGrid {
            cell_size: config.grid_cell_size,
            time_step: config.grid_time_step,
            t0: primary_start,
            cells: HashMap::new(),
        };

        for (idx, traj) in candidates.iter().enumerate() {
            grid.insert_trajectory(idx, traj, config.grid_time_step);
        }

        grid
    }

    fn insert_trajectory(&mut self, idx: usize, traj: &Trajectory, time_step: f64) {
        let start = traj.mission_start();
        let end = traj.mission_end();
        if end < start {
            return;
        }

        let mut t = start;
        let mut prev: Option<((i64, i64, i64), i64)> = None;
        loop {
            let pos = traj.position_at(t);
            let cell = self.cell_index(&pos);
            let bucket = self.time_index(t);
            self.insert(cell, bucket, idx);

            if let Some((prev_cell, prev_bucket)) = prev {
                if chebyshev_gap(prev_cell, cell) > 1 {
                    for voxel in voxel_traversal(prev_cell, cell) {
                        self.insert(voxel, prev_bucket, idx);
                        self.insert(voxel, bucket, idx);
                    }
                }
            }
            prev = Some((cell, bucket));

            if t >= end {
                break;
            }
            t = (t + time_step).min(end);
        }
    }

    /// Sweep the primary trajectory against the grid, probing the 27-cell
    /// neighborhood at each sampled instant and emitting a [`RawConflict`]
    /// whenever exact separation falls below the dynamic safety buffer.
    pub fn query(
        &self,
        primary: &Trajectory,
        candidates: &[&Trajectory],
        config: &EngineConfig,
    ) -> Vec<RawConflict> {
        let mut raw = Vec::new();
        let start = primary.mission_start();
        let end = primary.mission_end();
        if end < start {
            return raw;
        }

        let mut t = start;
        loop {
            let primary_pos = primary.position_at(t);
            let primary_vel = primary.velocity_at(t);
            let cell = self.cell_index(&primary_pos);
            let bucket = self.time_index(t);

            let mut seen = HashSet::new();
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let key = (cell.0 + dx, cell.1 + dy, cell.2 + dz, bucket);
                        let Some(ids) = self.cells.get(&key) else { continue };
                        for &idx in ids {
                            if !seen.insert(idx) {
                                continue;
                            }
                            let other = candidates[idx];
                            let other_pos = other.position_at(t);
                            let separation = primary_pos.distance(&other_pos);
                            let other_vel = other.velocity_at(t);
                            let relative_speed = primary_vel.sub(&other_vel).norm();
                            let buffer = config.dynamic_safety_buffer(relative_speed);
                            if separation < buffer {
                                raw.push(RawConflict {
                                    time: t,
                                    primary_pos,
                                    other_index: idx,
                                    other_pos,
                                    separation,
                                });
                            }
                        }
                    }
                }
            }

            if t >= end {
                break;
            }
            t = (t + config.grid_time_step).min(end);
        }

        raw
    }
}

fn chebyshev_gap(a: (i64, i64, i64), b: (i64, i64, i64)) -> i64 {
    (a.0 - b.0).abs().max((a.1 - b.1).abs()).max((a.2 - b.2).abs())
}

/// A 3D Bresenham-like voxel walk between two cell indices, excluding both
/// endpoints. Prevents tunneling when a fast-moving drone crosses more than
/// one cell between consecutive samples (§9).
fn voxel_traversal(from: (i64, i64, i64), to: (i64, i64, i64)) -> Vec<(i64, i64, i64)> {
    let steps = chebyshev_gap(from, to).max(1);
    let mut out = Vec::new();
    for step in 1..steps {
        let t = step as f64 / steps as f64;
        let cell = (
            (from.0 as f64 + t * (to.0 - from.0) as f64).round() as i64,
            (from.1 as f64 + t * (to.1 - from.1) as f64).round() as i64,
            (from.2 as f64 + t * (to.2 - from.2) as f64).round() as i64,
        );
        out.push(cell);
    }
    out
}
