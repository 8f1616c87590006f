//! Engine facade (section 4.5): registry, three-stage pipeline
//! orchestration, and decision synthesis.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::DeconflictError;
use crate::filter;
use crate::grid::OccupancyGrid;
use crate::models::{AssessedConflict, Mission, Metrics, Severity};
use crate::report;
use crate::risk;
use crate::trajectory::Trajectory;

/// The deconfliction engine. Owns a registry of traffic missions and the
/// tunable configuration. A call owns all transient pipeline state and
/// releases it before returning (section 5); the registry is the only
/// state that outlives a call.
pub struct Engine {
    config: EngineConfig,
    registry: RwLock<HashMap<String, Mission>>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default()).expect("default config is always valid")
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, DeconflictError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a traffic mission. Rejects invalid missions and duplicate
    /// drone ids; the registry is unchanged on failure.
    pub fn register_mission(&self, mission: Mission) -> Result<(), DeconflictError> {
        mission.validate()?;
        let mut registry = self.registry.write().expect("registry lock poisoned");
        if registry.contains_key(&mission.drone_id) {
            return Err(DeconflictError::DuplicateDroneId(mission.drone_id.clone()));
        }
        registry.insert(mission.drone_id.clone(), mission);
        Ok(())
    }

    /// Number of traffic missions currently registered.
    pub fn traffic_count(&self) -> usize {
        self.registry.read().expect("registry lock poisoned").len()
    }

    /// Run the three-stage pipeline against every registered traffic
    /// mission and synthesize a clearance decision. The primary mission is
    /// consumed for the duration of the call and not retained.
    pub fn check_mission(
        &self,
        primary: Mission,
    ) -> Result<(bool, Vec<AssessedConflict>, Metrics), DeconflictError> {
        let total_start = Instant::now();
        tracing::debug!(drone_id = %primary.drone_id, "starting deconfliction check");
        let primary_traj = Trajectory::from_mission(&primary)?;

        // Stage 2/3 need a borrowed Trajectory per survivor; snapshot the
        // registry and build every traffic trajectory up front so borrows
        // stay simple. Traffic missions are already validated at
        // registration, so this never fails.
        let traffic: Vec<Mission> = {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.values().cloned().collect()
        };
        let traffic_trajs: Vec<Trajectory> = traffic
            .iter()
            .map(|m| Trajectory::from_mission(m).expect("registered missions are pre-validated"))
            .collect();

        let input_count = traffic_trajs.len();

        let stage1_start = Instant::now();
        let survivors = filter::filter_candidates(&primary_traj, &traffic_trajs, &self.config);
        let stage1_ms = elapsed_ms(stage1_start);
        let stage1_out = survivors.len();
        tracing::trace!(input_count, stage1_out, "stage 1 coarse filter complete");

        let candidates: Vec<&Trajectory> = survivors.iter().map(|&i| &traffic_trajs[i]).collect();

        let stage2_start = Instant::now();
        let grid = OccupancyGrid::build(&candidates, primary_traj.mission_start(), &self.config);
        let raw_conflicts = grid.query(&primary_traj, &candidates, &self.config);
        let stage2_ms = elapsed_ms(stage2_start);
        let stage2_raw_conflicts = raw_conflicts.len();
        tracing::trace!(stage2_raw_conflicts, "stage 2 occupancy grid sweep complete");

        let stage3_start = Instant::now();
        let assessed = risk::assess(&primary_traj, &candidates, raw_conflicts, &self.config);
        let stage3_ms = elapsed_ms(stage3_start);
        let stage3_assessed = assessed.len();
        tracing::trace!(stage3_assessed, "stage 3 risk scoring complete");

        let cleared = !assessed.iter().any(|c| c.severity >= Severity::High);
        tracing::debug!(drone_id = %primary.drone_id, cleared, stage3_assessed, "deconfliction check complete");

        let metrics = Metrics {
            stage1_ms,
            stage2_ms,
            stage3_ms,
            total_ms: elapsed_ms(total_start),
            input_count,
            stage1_out,
            stage2_raw_conflicts,
            stage3_assessed,
        };

        Ok((cleared, assessed, metrics))
    }

    /// Render the pinned text report for a prior `check_mission` result.
    pub fn generate_report(
        &self,
        primary: &Mission,
        cleared: bool,
        conflicts: &[AssessedConflict],
        metrics: &Metrics,
    ) -> String {
        report::generate_report(primary, self.traffic_count(), cleared, conflicts, metrics)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Waypoint;

    fn head_on_primary() -> Mission {
        Mission::new(
            "PRIMARY",
            0.0,
            100.0,
            vec![Waypoint::new(0.0, 0.0, 100.0), Waypoint::new(1000.0, 0.0, 100.0)],
        )
    }

    #[test]
    fn register_rejects_duplicate_ids() {
        let engine = Engine::default();
        let mission = Mission::new(
            "T1",
            0.0,
            100.0,
            vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(1.0, 0.0, 0.0)],
        );
        engine.register_mission(mission.clone()).unwrap();
        let err = engine.register_mission(mission).unwrap_err();
        assert!(matches!(err, DeconflictError::DuplicateDroneId(_)));
    }

    #[test]
    fn register_rejects_invalid_missions() {
        let engine = Engine::default();
        let mission = Mission::new("T1", 0.0, 100.0, vec![Waypoint::new(0.0, 0.0, 0.0)]);
        assert!(engine.register_mission(mission).is_err());
    }

    #[test]
    fn head_on_crossing_rejects_the_mission() {
        let engine = Engine::default();
        engine
            .register_mission(Mission::new(
                "T1",
                0.0,
                100.0,
                vec![Waypoint::new(1000.0, 0.0, 100.0), Waypoint::new(0.0, 0.0, 100.0)],
            ))
            .unwrap();

        let (cleared, conflicts, metrics) = engine.check_mission(head_on_primary()).unwrap();
        assert!(!cleared);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].severity, Severity::Critical);
        assert_eq!(metrics.input_count, 1);
        assert_eq!(metrics.stage1_out, 1);
        assert!(metrics.stage2_raw_conflicts >= metrics.stage3_assessed);
    }

    #[test]
    fn parallel_traffic_300m_away_clears() {
        let engine = Engine::default();
        engine
            .register_mission(Mission::new(
                "T2",
                0.0,
                100.0,
                vec![Waypoint::new(0.0, 300.0, 100.0), Waypoint::new(1000.0, 300.0, 100.0)],
            ))
            .unwrap();

        let (cleared, conflicts, metrics) = engine.check_mission(head_on_primary()).unwrap();
        assert!(cleared);
        assert!(conflicts.is_empty());
        assert_eq!(metrics.stage1_out, 0);
    }

    #[test]
    fn temporal_miss_clears() {
        let engine = Engine::default();
        engine
            .register_mission(Mission::new(
                "T3",
                500.0,
                600.0,
                vec![Waypoint::new(0.0, 0.0, 100.0), Waypoint::new(1000.0, 0.0, 100.0)],
            ))
            .unwrap();

        let (cleared, conflicts, _metrics) = engine.check_mission(head_on_primary()).unwrap();
        assert!(cleared);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn registration_order_does_not_change_the_result() {
        let wp = |x: f64| Waypoint::new(x, 0.0, 100.0);
        let t1 = Mission::new("T1", 0.0, 100.0, vec![wp(1000.0), wp(0.0)]);
        let t2 = Mission::new(
            "T2",
            0.0,
            100.0,
            vec![Waypoint::new(0.0, 300.0, 100.0), Waypoint::new(1000.0, 300.0, 100.0)],
        );

        let engine_a = Engine::default();
        engine_a.register_mission(t1.clone()).unwrap();
        engine_a.register_mission(t2.clone()).unwrap();
        let (cleared_a, conflicts_a, _) = engine_a.check_mission(head_on_primary()).unwrap();

        let engine_b = Engine::default();
        engine_b.register_mission(t2).unwrap();
        engine_b.register_mission(t1).unwrap();
        let (cleared_b, conflicts_b, _) = engine_b.check_mission(head_on_primary()).unwrap();

        assert_eq!(cleared_a, cleared_b);
        assert_eq!(conflicts_a.len(), conflicts_b.len());
        for (a, b) in conflicts_a.iter().zip(conflicts_b.iter()) {
            assert_eq!(a.other_id, b.other_id);
            assert!((a.risk_score - b.risk_score).abs() < 1e-9);
        }
    }

    #[test]
    fn check_mission_is_deterministic_across_repeated_calls() {
        let engine = Engine::default();
        engine
            .register_mission(Mission::new(
                "T1",
                0.0,
                100.0,
                vec![Waypoint::new(1000.0, 0.0, 100.0), Waypoint::new(0.0, 0.0, 100.0)],
            ))
            .unwrap();

        let (cleared_1, conflicts_1, _) = engine.check_mission(head_on_primary()).unwrap();
        let (cleared_2, conflicts_2, _) = engine.check_mission(head_on_primary()).unwrap();

        assert_eq!(cleared_1, cleared_2);
        assert_eq!(conflicts_1.len(), conflicts_2.len());
        for (a, b) in conflicts_1.iter().zip(conflicts_2.iter()) {
            assert_eq!(a.other_id, b.other_id);
            assert!((a.risk_score - b.risk_score).abs() < 1e-9);
            assert!((a.time - b.time).abs() < 1e-9);
        }
    }
}
