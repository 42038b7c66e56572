//! Counter rollback to a `(route, record_start ordinal)` checkpoint.
//!
//! Rebuilding replays counter advancement from the profile's base counts:
//! every route before the checkpoint route in full, then the checkpoint route
//! up to (not including) the given marker. Nothing is executed on the device.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::counters::ActionCounts;
use crate::error::{CaptureError, Result};
use crate::planner;
use crate::route::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub route: u32,
    /// 1-based ordinal of the `record_start` to resume from.
    pub ordinal: u32,
}

impl Checkpoint {
    pub fn new(route: u32, ordinal: u32) -> Result<Self> {
        if route == 0 || ordinal == 0 {
            return Err(CaptureError::Configuration(
                "checkpoint route and ordinal must be positive integers".to_string(),
            ));
        }
        Ok(Self { route, ordinal })
    }

    /// Parse an optional checkpoint; empty input means none.
    pub fn parse_opt(raw: &str) -> Result<Option<Self>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some)
    }
}

impl FromStr for Checkpoint {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || {
            CaptureError::Configuration(format!(
                "invalid checkpoint '{s}': use 'route:ordinal', e.g. 7:17"
            ))
        };
        let (route, ordinal) = s.split_once(':').ok_or_else(malformed)?;
        let route = parse_positive(route.trim()).ok_or_else(malformed)?;
        let ordinal = parse_positive(ordinal.trim()).ok_or_else(malformed)?;
        Self::new(route, ordinal)
    }
}

fn parse_positive(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.route, self.ordinal)
    }
}

/// Counters as they stood just before `checkpoint`, replayed over `routes`
/// (the active route list, in run order) from `base`.
pub fn rebuild_counters(
    routes: &[Route],
    base: &ActionCounts,
    checkpoint: Checkpoint,
) -> Result<ActionCounts> {
    let mut counts = base.clone();
    for route in routes {
        if route.id == checkpoint.route {
            let limit = (checkpoint.ordinal - 1) as usize;
            return Ok(planner::advance(route, &counts, Some(limit)));
        }
        counts = planner::end_counters(route, &counts);
    }
    let ids: Vec<u32> = routes.iter().map(|r| r.id).collect();
    Err(CaptureError::Configuration(format!(
        "rollback route {} not found in active route list {ids:?}",
        checkpoint.route
    )))
}
