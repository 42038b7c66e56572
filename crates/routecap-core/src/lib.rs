pub mod action;
pub mod campaign;
pub mod checkpoint;
pub mod config;
pub mod counters;
pub mod device;
pub mod error;
pub mod io;
pub mod offsets;
pub mod pacing;
pub mod paths;
pub mod planner;
pub mod points;
pub mod portal;
pub mod profile;
pub mod recorder;
pub mod render;
pub mod route;
pub mod types;

pub use error::{CaptureError, Result};
