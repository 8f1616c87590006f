//! Deconfliction core - pure logic for multi-drone mission deconfliction.
//!
//! Given a primary mission and a registry of traffic missions sharing a 3D
//! airspace over a common time axis, the [`Engine`] answers which traffic
//! missions come dangerously close to the primary, when, where, and how
//! severely - a ranked list of assessed conflicts plus a binary clearance
//! decision.
//!
//! No networking, no persistence: this crate is a pure, offline
//! computation. Mission *pattern generators* (straight line, grid survey,
//! circular inspection, ...), scenario orchestration, and report
//! serialization beyond the pinned text/JSON shapes are treated as external
//! collaborators.

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod grid;
pub mod models;
pub mod report;
pub mod risk;
pub mod trajectory;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::DeconflictError;
pub use models::{AssessedConflict, DeconflictionResult, Mission, Metrics, Severity, Waypoint};
pub use trajectory::Trajectory;
