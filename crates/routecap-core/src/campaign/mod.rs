//! Capture campaigns.
//!
//! A campaign runs one route once per render config, recording the segments
//! its markers delimit. A run chains campaigns over several routes, with an
//! optional counter rollback first. `debug_routes` rehearses route chaining
//! without recording.

pub mod debug;
pub mod run;
pub mod runner;

pub use debug::{debug_routes, route_range, RehearsalReport};
pub use run::{select_routes, CaptureRun, RollbackReport, RouteSelection, RunSummary};
pub use runner::{Campaign, CampaignOutcome, CampaignState, Rig, RoutePortals, Timing};
