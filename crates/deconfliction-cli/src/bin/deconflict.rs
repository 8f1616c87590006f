//! `deconflict` - run the deconfliction engine against mission files on disk.
//!
//! Usage:
//!   deconflict --primary mission.json --traffic-dir traffic/ [--json]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use deconfliction_cli::{config_from_env, load_mission, load_traffic_dir};
use deconfliction_core::Engine;

/// Run the deconfliction engine against a primary mission and a directory of
/// registered traffic missions.
#[derive(Parser, Debug)]
#[command(author, version, about = "Drone mission deconfliction engine")]
struct Args {
    /// Path to the primary mission JSON file.
    #[arg(long)]
    primary: PathBuf,

    /// Directory containing traffic mission JSON files.
    #[arg(long, default_value = "traffic")]
    traffic_dir: PathBuf,

    /// Print the pinned JSON result instead of the text report.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let primary = load_mission(&args.primary)?;
    let traffic = load_traffic_dir(&args.traffic_dir)?;
    tracing::info!(traffic_count = traffic.len(), "loaded missions");

    let engine = Engine::new(config_from_env())?;
    for mission in traffic {
        engine.register_mission(mission)?;
    }

    let (cleared, conflicts, metrics) = engine.check_mission(primary.clone())?;

    if args.json {
        let result = deconfliction_core::DeconflictionResult {
            cleared,
            conflicts,
            metrics,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", engine.generate_report(&primary, cleared, &conflicts, &metrics));
    }

    if !cleared {
        std::process::exit(1);
    }
    Ok(())
}
