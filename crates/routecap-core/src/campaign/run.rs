//! Multi-route runs: route selection, optional rollback, then one campaign
//! per route with a teleport between routes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::runner::{Campaign, CampaignOutcome, Rig, RoutePortals};
use crate::checkpoint::{self, Checkpoint};
use crate::config::CampaignConfig;
use crate::counters::{ActionCounts, CounterState, CounterStore};
use crate::error::{CaptureError, Result};
use crate::planner::OutputLayout;
use crate::render::{self, ConfigEntry};
use crate::route::{Route, RouteLibrary};

// ---------------------------------------------------------------------------
// Route selection
// ---------------------------------------------------------------------------

/// Which routes a run touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSelection {
    /// Every route after the skip filter. Rollback replays over this list.
    pub active: Vec<u32>,
    /// Routes that will actually run: `active` from the restart (or
    /// checkpoint) route on.
    pub run: Vec<u32>,
    pub checkpoint: Option<Checkpoint>,
}

/// Apply the skip list and restart route to `available`. A restart without
/// an explicit checkpoint rolls back to the restart route's first marker; a
/// checkpoint without a restart starts the run at the checkpoint route.
pub fn select_routes(
    available: &[u32],
    skip: &[u32],
    restart_from: Option<u32>,
    checkpoint: Option<Checkpoint>,
) -> Result<RouteSelection> {
    if available.is_empty() {
        return Err(CaptureError::Configuration("no routes found".to_string()));
    }
    let active: Vec<u32> = available
        .iter()
        .copied()
        .filter(|id| !skip.contains(id))
        .collect();
    if active.is_empty() {
        return Err(CaptureError::Configuration(format!(
            "no routes left after skipping {skip:?}"
        )));
    }

    let mut run = active.clone();
    let mut checkpoint = checkpoint;
    if let Some(restart) = restart_from {
        let at = active.iter().position(|id| *id == restart).ok_or_else(|| {
            CaptureError::Configuration(format!(
                "restart route {restart} not in active routes {active:?}"
            ))
        })?;
        run = active[at..].to_vec();
        if checkpoint.is_none() {
            checkpoint = Some(Checkpoint::new(restart, 1)?);
        }
    } else if let Some(cp) = checkpoint {
        // Earlier routes keep their recordings. An unknown checkpoint route is
        // reported by the rollback itself.
        if let Some(at) = active.iter().position(|id| *id == cp.route) {
            run = active[at..].to_vec();
        }
    }
    Ok(RouteSelection {
        active,
        run,
        checkpoint,
    })
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RollbackReport {
    pub checkpoint: Checkpoint,
    pub profile: String,
    pub counts: ActionCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub selection: RouteSelection,
    pub rollback: Option<RollbackReport>,
    pub routes: Vec<CampaignOutcome>,
}

// ---------------------------------------------------------------------------
// CaptureRun
// ---------------------------------------------------------------------------

/// A full run built from one resolved `CampaignConfig`.
pub struct CaptureRun<'a> {
    config: &'a CampaignConfig,
    library: RouteLibrary,
    store: CounterStore,
}

impl<'a> CaptureRun<'a> {
    pub fn new(config: &'a CampaignConfig) -> Self {
        Self {
            config,
            library: RouteLibrary::new(&config.route_root),
            store: CounterStore::in_video_base(&config.video_base),
        }
    }

    pub fn library(&self) -> &RouteLibrary {
        &self.library
    }

    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    /// Route ids in run order, before the skip filter.
    pub fn available_routes(&self) -> Result<Vec<u32>> {
        match &self.config.routes {
            Some(ids) => Ok(ids.clone()),
            None => self.library.discover(),
        }
    }

    pub fn select(&self) -> Result<RouteSelection> {
        select_routes(
            &self.available_routes()?,
            &self.config.skip_routes,
            self.config.restart_from_route,
            self.config.checkpoint()?,
        )
    }

    /// Rebuild the counters at `checkpoint` over `active` and overwrite the
    /// counter file with them.
    pub fn rollback(&self, active: &[u32], checkpoint: Checkpoint) -> Result<RollbackReport> {
        let routes = self.library.load_all(active)?;
        let base = self
            .config
            .base_counts
            .get(&self.config.region)
            .cloned()
            .unwrap_or_default();
        let counts = checkpoint::rebuild_counters(&routes, &base, checkpoint)?;

        let mut state = CounterState::new();
        state.insert(self.config.region.clone(), counts.clone());
        self.store.save(&state)?;
        tracing::info!(%checkpoint, counts = ?counts, "counters rolled back");
        Ok(RollbackReport {
            checkpoint,
            profile: self.config.region.clone(),
            counts,
        })
    }

    pub fn configs(&self) -> Result<Vec<ConfigEntry>> {
        let configs = render::collect_configs(
            &self.config.config_root,
            self.config.start_from_config,
            self.config.configs_per_route,
        )?;
        if configs.is_empty() {
            return Err(CaptureError::Configuration(format!(
                "no render configs under {}",
                self.config.config_root.display()
            )));
        }
        Ok(configs)
    }

    pub fn execute(&self, rig: &Rig) -> Result<RunSummary> {
        self.execute_selected(rig).map_err(|e| rig.cancel.classify(e))
    }

    fn execute_selected(&self, rig: &Rig) -> Result<RunSummary> {
        let started_at = Utc::now();
        let selection = self.select()?;
        if !self.config.skip_routes.is_empty() {
            tracing::info!(skip = ?self.config.skip_routes, "skipping routes");
        }
        // Load everything up front so a bad step fails before any recording.
        let routes = self.library.load_all(&selection.run)?;
        let configs = self.configs()?;
        crate::io::ensure_dir(&self.config.video_base)?;

        let rollback = match selection.checkpoint {
            Some(cp) => Some(self.rollback(&selection.active, cp)?),
            None => None,
        };
        tracing::info!(routes = ?selection.run, configs = configs.len(), "run starting");

        let mut outcomes = Vec::new();
        if rollback.is_some() && self.config.rollback_only {
            tracing::info!("rollback only, exiting");
        } else {
            for (i, route) in routes.iter().enumerate() {
                let is_last = i + 1 == routes.len();
                let outcome = self.run_route(rig, route, &configs)?;
                let transitioned = outcome.transitioned;
                let complete = outcome.is_complete();
                outcomes.push(outcome);
                if !is_last {
                    self.transition(rig, route, complete, transitioned)?;
                }
            }
        }

        Ok(RunSummary {
            started_at,
            finished_at: Utc::now(),
            selection,
            rollback,
            routes: outcomes,
        })
    }

    fn run_route(&self, rig: &Rig, route: &Route, configs: &[ConfigEntry]) -> Result<CampaignOutcome> {
        let campaign = Campaign {
            route,
            portals: RoutePortals::for_route(route, &self.config.portal)?,
            layout: OutputLayout::new(&self.config.video_base, &self.config.region, route),
            configs,
            target: self.config.configs_per_route,
            skip_recorded: self.config.skip_recorded,
            store: &self.store,
            base_counts: &self.config.base_counts,
        };
        campaign.run(rig)
    }

    fn transition(&self, rig: &Rig, route: &Route, complete: bool, transitioned: bool) -> Result<()> {
        if !complete {
            return Err(CaptureError::Configuration(format!(
                "route {} did not complete {} configs, stopping before the next route",
                route.id, self.config.configs_per_route
            )));
        }
        let portals = RoutePortals::for_route(route, &self.config.portal)?;
        let Some(next) = portals.next else {
            return Err(CaptureError::Configuration(format!(
                "route {} has no next_portal",
                route.id
            )));
        };
        if transitioned {
            tracing::info!(route = route.id, "already at next portal");
            return Ok(());
        }
        rig.cancel.check()?;
        tracing::info!(route = route.id, portal = %next, "moving to next route");
        rig.teleport(next)?;
        rig.pause(rig.timing.route_gap);
        Ok(())
    }
}
