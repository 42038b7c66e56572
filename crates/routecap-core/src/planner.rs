//! Output-slot reservation for recording markers.
//!
//! Every `record_start` in a route records the next non-marker step. Walking
//! the route once against a counter snapshot hands each marker the next
//! 1-based index for that action. The resulting plan is computed once per
//! campaign and reused for every config, so every config's take of a marker
//! lands in the same slot directory and a rerun from the same snapshot
//! produces the same paths.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::counters::ActionCounts;
use crate::paths;
use crate::route::{ActionStep, Route};

/// Action name used when a marker has nothing after it to record.
pub const UNKNOWN_ACTION: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSlot {
    pub action: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExecutionPlan {
    pub slots: Vec<PlanSlot>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&PlanSlot> {
        self.slots.get(ordinal)
    }
}

/// The action a marker at `marker` records.
pub fn recorded_action(steps: &[ActionStep], marker: usize) -> &'static str {
    steps
        .iter()
        .skip(marker + 1)
        .find(|s| !s.is_marker())
        .map(ActionStep::name)
        .unwrap_or(UNKNOWN_ACTION)
}

/// Walk `route`, bumping the counter of each recorded action. Stops after
/// `limit` markers when a limit is given. `on_slot` sees every reservation.
fn walk(
    route: &Route,
    counts: &ActionCounts,
    limit: Option<usize>,
    mut on_slot: impl FnMut(&str, u32),
) -> ActionCounts {
    let mut working = counts.clone();
    let mut consumed = 0;
    for (i, step) in route.steps.iter().enumerate() {
        if !matches!(step, ActionStep::RecordStart) {
            continue;
        }
        if limit.is_some_and(|l| consumed >= l) {
            break;
        }
        let action = recorded_action(&route.steps, i);
        let counter = working.entry(action.to_string()).or_insert(0);
        *counter += 1;
        on_slot(action, *counter);
        consumed += 1;
    }
    working
}

pub fn plan(route: &Route, counts: &ActionCounts) -> ExecutionPlan {
    let mut slots = Vec::new();
    walk(route, counts, None, |action, index| {
        slots.push(PlanSlot {
            action: action.to_string(),
            index,
        })
    });
    ExecutionPlan { slots }
}

/// Counters after one full pass of `route`.
pub fn end_counters(route: &Route, counts: &ActionCounts) -> ActionCounts {
    advance(route, counts, None)
}

/// Counters after the first `limit` markers of `route` (all when `None`).
pub fn advance(route: &Route, counts: &ActionCounts, limit: Option<usize>) -> ActionCounts {
    walk(route, counts, limit, |_, _| {})
}

// ---------------------------------------------------------------------------
// OutputLayout
// ---------------------------------------------------------------------------

/// Where a route's recordings go for one profile.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub video_base: PathBuf,
    pub profile: String,
    pub route_label: String,
}

impl OutputLayout {
    pub fn new(video_base: &Path, profile: &str, route: &Route) -> Self {
        Self {
            video_base: video_base.to_path_buf(),
            profile: profile.to_string(),
            route_label: route.label(),
        }
    }

    pub fn path_for(&self, slot: &PlanSlot, config_id: &str) -> PathBuf {
        paths::video_path(
            &self.video_base,
            &slot.action,
            &self.profile,
            slot.index,
            &self.route_label,
            config_id,
        )
    }

    /// Every file one config's pass of the route produces.
    pub fn planned_paths(&self, plan: &ExecutionPlan, config_id: &str) -> Vec<PathBuf> {
        plan.slots
            .iter()
            .map(|slot| self.path_for(slot, config_id))
            .collect()
    }
}
