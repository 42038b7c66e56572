//! One campaign: one route run against a bounded list of render configs.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::action::{Actions, GameAction};
use crate::config::CampaignConfig;
use crate::counters::{profile_counters, ActionCounts, CounterStore};
use crate::device::Device;
use crate::error::{CaptureError, Result};
use crate::pacing::{CancelToken, Pacer};
use crate::planner::{self, ExecutionPlan, OutputLayout};
use crate::portal::PortalTransform;
use crate::recorder::{RecorderFactory, RecorderSlot};
use crate::render::{ConfigEntry, RenderConfigApplier};
use crate::route::{ActionStep, Route};
use crate::types::Coord;

/// Executed configs between two in-game time adjustments.
pub const TIME_ADJUST_EVERY: usize = 5;

// ---------------------------------------------------------------------------
// Rig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// After every dispatched action and teleport.
    pub step_delay: Duration,
    /// After a recording starts.
    pub record_settle: Duration,
    /// After moving to the next route.
    pub route_gap: Duration,
}

impl Timing {
    pub fn from_config(config: &CampaignConfig) -> Self {
        Self {
            step_delay: Duration::from_millis(config.step_delay_ms),
            record_settle: Duration::from_millis(config.record_settle_ms),
            route_gap: Duration::from_millis(config.route_gap_ms),
        }
    }
}

/// The collaborators a campaign drives.
pub struct Rig<'a> {
    pub actions: &'a Actions,
    pub device: &'a dyn Device,
    pub pacer: &'a dyn Pacer,
    pub recorders: &'a dyn RecorderFactory,
    pub render: &'a dyn RenderConfigApplier,
    pub cancel: &'a CancelToken,
    pub timing: Timing,
}

impl Rig<'_> {
    pub fn perform(&self, action: &GameAction) -> Result<()> {
        self.actions.perform(action, self.device, self.pacer)
    }

    pub fn teleport(&self, portal: Coord) -> Result<()> {
        self.actions.teleport(portal, self.device, self.pacer)
    }

    pub fn pause(&self, duration: Duration) {
        self.pacer.sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// RoutePortals
// ---------------------------------------------------------------------------

/// A route's portals in the device frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutePortals {
    pub current: Coord,
    pub next: Option<Coord>,
}

impl RoutePortals {
    pub fn for_route(route: &Route, transform: &PortalTransform) -> Result<Self> {
        Ok(Self {
            current: transform.apply(route.portal)?,
            next: route.next_portal.map(|p| transform.apply(p)).transpose()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// Campaign lifecycle. `Done` and `Aborted` are terminal: `Done` means the
/// target was reached and counters were saved, `Aborted` that the configs
/// ran out first and the counter file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    Init,
    Planning,
    Executing,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignOutcome {
    pub route: u32,
    pub state: CampaignState,
    /// Configs counted toward the target, skipped ones included.
    pub completed: usize,
    pub executed: usize,
    pub skipped: usize,
    pub target: usize,
    /// Whether the counter file was rewritten.
    pub saved: bool,
    /// Whether the last config's own teleports already reached the next
    /// route's portal.
    pub transitioned: bool,
    pub end_counts: ActionCounts,
}

impl CampaignOutcome {
    pub fn is_complete(&self) -> bool {
        self.state == CampaignState::Done
    }
}

#[derive(Debug, Default)]
struct Tally {
    completed: usize,
    executed: usize,
    skipped: usize,
    transitioned: bool,
}

pub struct Campaign<'a> {
    pub route: &'a Route,
    pub portals: RoutePortals,
    pub layout: OutputLayout,
    pub configs: &'a [ConfigEntry],
    /// Configs that make the campaign complete.
    pub target: usize,
    pub skip_recorded: bool,
    pub store: &'a CounterStore,
    pub base_counts: &'a BTreeMap<String, ActionCounts>,
}

impl Campaign<'_> {
    pub fn run(&self, rig: &Rig) -> Result<CampaignOutcome> {
        let route = self.route.id;
        let mut state = CampaignState::Init;
        tracing::debug!(route, ?state);
        let mut persisted = self.store.load();
        let snapshot = profile_counters(&self.layout.profile, self.base_counts, &persisted);

        state = CampaignState::Planning;
        tracing::debug!(route, ?state);
        let plan = planner::plan(self.route, &snapshot);
        let end_counts = planner::end_counters(self.route, &snapshot);

        state = CampaignState::Executing;
        tracing::info!(route, portal = %self.portals.current, slots = plan.len(), "starting route");
        let tally = self.execute(rig, &plan).inspect_err(|e| {
            tracing::warn!(route, state = ?CampaignState::Aborted, "campaign aborted: {e}");
        })?;
        tracing::debug!(route, ?state, completed = tally.completed);

        state = if tally.completed == self.target {
            CampaignState::Done
        } else {
            CampaignState::Aborted
        };
        let saved = state == CampaignState::Done;
        if saved {
            persisted.insert(self.layout.profile.clone(), end_counts.clone());
            self.store.save(&persisted)?;
            tracing::info!(route, completed = tally.completed, "route finished, counters saved");
        } else {
            tracing::warn!(
                route,
                ?state,
                completed = tally.completed,
                target = self.target,
                "route incomplete, counters not saved"
            );
        }

        Ok(CampaignOutcome {
            route,
            state,
            completed: tally.completed,
            executed: tally.executed,
            skipped: tally.skipped,
            target: self.target,
            saved,
            transitioned: tally.transitioned,
            end_counts,
        })
    }

    fn execute(&self, rig: &Rig, plan: &ExecutionPlan) -> Result<Tally> {
        let mut tally = Tally::default();
        let total = self.configs.len();
        for (i, entry) in self.configs.iter().enumerate() {
            if tally.completed >= self.target {
                break;
            }
            rig.cancel.check()?;

            if self.skip_recorded {
                let expected = self.layout.planned_paths(plan, &entry.id);
                if !expected.is_empty() && expected.iter().all(|p| p.exists()) {
                    tracing::info!(route = self.route.id, config = %entry.id, "already recorded, skipping");
                    tally.completed += 1;
                    tally.skipped += 1;
                    continue;
                }
            }

            tracing::info!(
                route = self.route.id,
                config = %entry.id,
                "config {}/{total}",
                i + 1
            );
            if tally.executed > 0 && tally.executed % TIME_ADJUST_EVERY == 0 {
                self.adjust_time(rig, tally.executed + 1)?;
            }
            rig.render.apply(&entry.path, rig.device, rig.pacer)?;

            let last = tally.completed + 1 == self.target;
            let target = match (last, self.portals.next) {
                (true, Some(next)) => next,
                _ => self.portals.current,
            };
            let teleported = self.pass(rig, plan, &entry.id, target)?;
            if last && self.portals.next.is_some() && teleported {
                tally.transitioned = true;
            }

            tally.executed += 1;
            tally.completed += 1;
        }
        Ok(tally)
    }

    fn adjust_time(&self, rig: &Rig, config_no: usize) -> Result<()> {
        if !rig.actions.supports_time_adjust() {
            tracing::warn!(route = self.route.id, "adjust_game_time not available on this device");
            return Ok(());
        }
        tracing::info!(route = self.route.id, "adjusting game time before config #{config_no}");
        rig.perform(&GameAction::AdjustGameTime)
    }

    /// Run the route once for `config_id`. Returns whether any teleport step
    /// ran.
    fn pass(&self, rig: &Rig, plan: &ExecutionPlan, config_id: &str, teleport_to: Coord) -> Result<bool> {
        let mut recording = RecorderSlot::new();
        let mut ordinal = 0;
        let mut teleported = false;

        for step in &self.route.steps {
            rig.cancel.check()?;
            match step {
                ActionStep::RecordStart => {
                    let slot = plan.get(ordinal).ok_or(CaptureError::PlanMismatch {
                        ordinal: ordinal + 1,
                        planned: plan.len(),
                    })?;
                    ordinal += 1;
                    let path = self.layout.path_for(slot, config_id);
                    recording.stop()?;
                    if let Some(dir) = path.parent() {
                        crate::io::ensure_dir(dir)?;
                    }
                    recording.replace(rig.recorders.start(&path)?)?;
                    rig.pause(rig.recorders.startup_wait());
                    rig.cancel.check()?;
                    rig.pause(rig.timing.record_settle);
                }
                ActionStep::RecordStop => recording.stop()?,
                ActionStep::Teleport => {
                    rig.teleport(teleport_to)?;
                    teleported = true;
                    rig.pause(rig.timing.step_delay);
                }
                ActionStep::Action(action) => {
                    tracing::debug!(route = self.route.id, %action, "step");
                    rig.perform(action)?;
                    rig.pause(rig.timing.step_delay);
                }
            }
        }
        recording.stop()?;
        Ok(teleported)
    }
}
