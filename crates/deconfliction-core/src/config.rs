//! Engine configuration (§6): tunable buffers, steps, and scoring scales.

use crate::error::DeconflictError;
use serde::{Deserialize, Serialize};

/// Construction-time tunables for an [`crate::engine::Engine`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `B_base` — floor of the dynamic safety buffer, meters.
    pub base_safety_buffer: f64,
    /// `t_react` — assumed reaction time, seconds.
    pub reaction_time: f64,
    /// `a_max` — assumed maximum avoidance acceleration, m/s².
    pub max_accel: f64,
    /// `sigma_gps` — positional uncertainty budget, meters.
    pub gps_uncertainty: f64,
    /// `B_coarse` — Stage 1 Tier B/C inflation buffer, meters.
    pub coarse_buffer: f64,
    /// `Δt_coarse` — Stage 1 Tier C sampling step, seconds.
    pub coarse_step: f64,
    /// `S` — occupancy grid spatial cell size, meters.
    pub grid_cell_size: f64,
    /// `T` — occupancy grid temporal bucket size, seconds.
    pub grid_time_step: f64,
    /// `V_ref` — relative-velocity scoring reference scale, m/s.
    pub v_ref: f64,
    /// `D_ref` — conflict-duration scoring reference scale, seconds.
    pub d_ref: f64,
    /// `TTC_ref` — time-to-collision scoring reference scale, seconds.
    pub ttc_ref: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_safety_buffer: 50.0,
            reaction_time: 2.5,
            max_accel: 5.0,
            gps_uncertainty: 10.0,
            coarse_buffer: 200.0,
            coarse_step: 10.0,
            grid_cell_size: 100.0,
            grid_time_step: 1.0,
            v_ref: 30.0,
            d_ref: 10.0,
            ttc_ref: 10.0,
        }
    }
}

impl EngineConfig {
    /// Reject configurations that would make the pipeline degenerate
    /// (non-positive buffers or steps).
    pub fn validate(&self) -> Result<(), DeconflictError> {
        let fields: [(&str, f64); 9] = [
            ("base_safety_buffer", self.base_safety_buffer),
            ("coarse_buffer", self.coarse_buffer),
            ("coarse_step", self.coarse_step),
            ("grid_cell_size", self.grid_cell_size),
            ("grid_time_step", self.grid_time_step),
            ("v_ref", self.v_ref),
            ("d_ref", self.d_ref),
            ("ttc_ref", self.ttc_ref),
            ("reaction_time", self.reaction_time),
        ];
        for (name, value) in fields {
            if value <= 0.0 {
                return Err(DeconflictError::ConfigurationError {
                    reason: format!("{name} must be positive, got {value}"),
                });
            }
        }
        if self.max_accel < 0.0 {
            return Err(DeconflictError::ConfigurationError {
                reason: format!("max_accel must be non-negative, got {}", self.max_accel),
            });
        }
        if self.gps_uncertainty < 0.0 {
            return Err(DeconflictError::ConfigurationError {
                reason: format!(
                    "gps_uncertainty must be non-negative, got {}",
                    self.gps_uncertainty
                ),
            });
        }
        Ok(())
    }

    /// The velocity-dependent minimum permissible separation, `B_dyn`
    /// (§4.3), clamped to at least `base_safety_buffer`.
    pub fn dynamic_safety_buffer(&self, relative_speed: f64) -> f64 {
        let buffer = self.base_safety_buffer
            + relative_speed * self.reaction_time
            + 0.5 * self.max_accel * self.reaction_time.powi(2)
            + self.gps_uncertainty;
        buffer.max(self.base_safety_buffer)
    }
}
