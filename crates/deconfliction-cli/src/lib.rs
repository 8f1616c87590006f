//! Deconfliction CLI - loads mission JSON files from disk, runs the
//! deconfliction engine, and prints the pinned text report or JSON result.
//!
//! Mirrors `atc-cli`'s role in the source workspace: a thin, dependency-light
//! front end for exercising the core logic standalone, without the
//! networking/auth pieces that belong to an out-of-scope server integration.

use std::path::Path;

use anyhow::{Context, Result};
use deconfliction_core::{EngineConfig, Mission};

/// Parse a single mission JSON file (the §6 pinned shape).
pub fn load_mission(path: &Path) -> Result<Mission> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading mission file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing mission file {}", path.display()))
}

/// Parse every `*.json` file in a directory as a traffic mission. Missing or
/// empty directories yield an empty traffic set, not an error.
pub fn load_traffic_dir(dir: &Path) -> Result<Vec<Mission>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut missions = Vec::new();
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("reading traffic directory {}", dir.display()))?
        .collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        missions.push(load_mission(&path)?);
    }
    Ok(missions)
}

/// Read `EngineConfig` overrides from `DECONFLICT_*` environment variables,
/// falling back to the §6 defaults. Mirrors `atc-server::config::Config`'s
/// `env::var(...).ok().and_then(|s| s.parse().ok()).unwrap_or(default)` idiom.
pub fn config_from_env() -> EngineConfig {
    let mut config = EngineConfig::default();
    let env_f64 = |key: &str, default: f64| -> f64 {
        std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
    };

    config.base_safety_buffer = env_f64("DECONFLICT_BASE_SAFETY_BUFFER", config.base_safety_buffer);
    config.reaction_time = env_f64("DECONFLICT_REACTION_TIME", config.reaction_time);
    config.max_accel = env_f64("DECONFLICT_MAX_ACCEL", config.max_accel);
    config.gps_uncertainty = env_f64("DECONFLICT_GPS_UNCERTAINTY", config.gps_uncertainty);
    config.coarse_buffer = env_f64("DECONFLICT_COARSE_BUFFER", config.coarse_buffer);
    config.coarse_step = env_f64("DECONFLICT_COARSE_STEP", config.coarse_step);
    config.grid_cell_size = env_f64("DECONFLICT_GRID_CELL_SIZE", config.grid_cell_size);
    config.grid_time_step = env_f64("DECONFLICT_GRID_TIME_STEP", config.grid_time_step);
    config.v_ref = env_f64("DECONFLICT_V_REF", config.v_ref);
    config.d_ref = env_f64("DECONFLICT_D_REF", config.d_ref);
    config.ttc_ref = env_f64("DECONFLICT_TTC_REF", config.ttc_ref);

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_traffic_dir_yields_empty_traffic() {
        let missions = load_traffic_dir(Path::new("/nonexistent/path/for/tests")).unwrap();
        assert!(missions.is_empty());
    }

    #[test]
    fn config_from_env_falls_back_to_defaults_when_unset() {
        std::env::remove_var("DECONFLICT_COARSE_BUFFER");
        let config = config_from_env();
        assert_eq!(config.coarse_buffer, EngineConfig::default().coarse_buffer);
    }
}
