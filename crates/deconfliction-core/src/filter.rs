//! Stage 1: three-tier candidate filter (§4.2).
//!
//! Tier A (temporal overlap) → Tier B (inflated AABB overlap) → Tier C
//! (coarse sampled proximity). Tiers run in order so that the cheapest,
//! coarsest check rejects the most candidates before the expensive ones run.

use crate::config::EngineConfig;
use crate::trajectory::Trajectory;

/// Apply the three tiers in order, returning the indices (into `traffic`)
/// of trajectories that survive all of them.
pub fn filter_candidates(
    primary: &Trajectory,
    traffic: &[Trajectory],
    config: &EngineConfig,
) -> Vec<usize> {
    traffic
        .iter()
        .enumerate()
        .filter(|(_, other)| temporal_overlap(primary, other))
        .filter(|(_, other)| aabb_overlap(primary, other, config.coarse_buffer))
        .filter(|(_, other)| coarse_proximity(primary, other, config))
        .map(|(idx, _)| idx)
        .collect()
}

/// Tier A: do the scheduled time windows intersect at all?
fn temporal_overlap(primary: &Trajectory, other: &Trajectory) -> bool {
    let start = primary.mission_start().max(other.mission_start());
    let end = primary.mission_end().min(other.mission_end());
    start <= end
}

/// Tier B: do the (inflated) axis-aligned bounding boxes intersect?
fn aabb_overlap(primary: &Trajectory, other: &Trajectory, buffer: f64) -> bool {
    let (p_min, p_max) = primary.bounding_box();
    let (o_min, o_max) = other.bounding_box();

    let overlaps_axis = |p_lo: f64, p_hi: f64, o_lo: f64, o_hi: f64| {
        (p_lo - buffer) <= (o_hi + buffer) && (o_lo - buffer) <= (p_hi + buffer)
    };

    overlaps_axis(p_min.x, p_max.x, o_min.x, o_max.x)
        && overlaps_axis(p_min.y, p_max.y, o_min.y, o_max.y)
        && overlaps_axis(p_min.z, p_max.z, o_min.z, o_max.z)
}

/// Tier C: sample both trajectories on a shared coarse time grid and keep
/// the candidate if any sample pair is within `coarse_buffer`. The overlap
/// endpoint is always sampled, even if it falls off the `coarse_step` grid.
fn coarse_proximity(primary: &Trajectory, other: &Trajectory, config: &EngineConfig) -> bool {
    let start = primary.mission_start().max(other.mission_start());
    let end = primary.mission_end().min(other.mission_end());
    if start > end {
        return false;
    }

    let mut t = start;
    loop {
        let p = primary.position_at(t);
        let o = other.position_at(t);
        if p.distance(&o) <= config.coarse_buffer {
            return true;
        }
        if t >= end {
            break;
        }
        t = (t + config.coarse_step).min(end);
    }
    false
}
