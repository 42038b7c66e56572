//! Route-transition rehearsal.
//!
//! Walks a range of routes without recording: markers and in-route teleports
//! are skipped, every other step runs, and each route ends with a teleport
//! to its next portal. Used to check that chained routes actually line up.

use serde::Serialize;

use super::runner::{Rig, RoutePortals};
use crate::error::{CaptureError, Result};
use crate::portal::PortalTransform;
use crate::route::{ActionStep, Route, RouteLibrary};

/// Inclusive route id range, validated.
pub fn route_range(start: u32, end: u32) -> Result<Vec<u32>> {
    if start == 0 || end == 0 {
        return Err(CaptureError::Configuration(
            "route range bounds must be positive integers".to_string(),
        ));
    }
    if start > end {
        return Err(CaptureError::Configuration(format!(
            "route range start {start} is after end {end}"
        )));
    }
    Ok((start..=end).collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct RehearsalReport {
    pub routes: Vec<u32>,
    pub steps_run: usize,
    pub steps_skipped: usize,
}

pub fn debug_routes(
    library: &RouteLibrary,
    ids: &[u32],
    transform: &PortalTransform,
    rig: &Rig,
) -> Result<RehearsalReport> {
    rehearse_all(library, ids, transform, rig).map_err(|e| rig.cancel.classify(e))
}

fn rehearse_all(
    library: &RouteLibrary,
    ids: &[u32],
    transform: &PortalTransform,
    rig: &Rig,
) -> Result<RehearsalReport> {
    let routes = library.load_all(ids)?;
    let mut report = RehearsalReport {
        routes: ids.to_vec(),
        steps_run: 0,
        steps_skipped: 0,
    };
    for (i, route) in routes.iter().enumerate() {
        rehearse(route, rig, &mut report)?;

        let portals = RoutePortals::for_route(route, transform)?;
        let next = portals.next.ok_or_else(|| {
            CaptureError::Configuration(format!("route {} has no next_portal", route.id))
        })?;
        rig.cancel.check()?;
        tracing::info!(route = route.id, portal = %next, "moving to next route");
        rig.teleport(next)?;
        if i + 1 < routes.len() {
            rig.pause(rig.timing.route_gap);
        }
    }
    Ok(report)
}

fn rehearse(route: &Route, rig: &Rig, report: &mut RehearsalReport) -> Result<()> {
    tracing::info!(route = route.id, "rehearsing route");
    for step in &route.steps {
        rig.cancel.check()?;
        match step {
            ActionStep::RecordStart | ActionStep::RecordStop => {
                tracing::debug!(route = route.id, %step, "skipped");
                report.steps_skipped += 1;
            }
            ActionStep::Teleport => {
                tracing::debug!(route = route.id, "skipped in-route teleport");
                report.steps_skipped += 1;
                rig.pause(rig.timing.step_delay);
            }
            ActionStep::Action(action) => {
                tracing::debug!(route = route.id, %action, "step");
                rig.perform(action)?;
                report.steps_run += 1;
                rig.pause(rig.timing.step_delay);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::tests::{base_actions, Log};
    use crate::campaign::runner::tests::{identity_portals, timing, LogRender};
    use crate::pacing::CancelToken;
    use crate::recorder::tests::FakeFactory;
    use tempfile::TempDir;

    fn rehearse_dir(files: &[(u32, &str)], ids: &[u32]) -> (Result<RehearsalReport>, Log, FakeFactory) {
        let dir = TempDir::new().unwrap();
        for (id, body) in files {
            std::fs::write(dir.path().join(format!("{id}.yaml")), body).unwrap();
        }
        let log = Log::default();
        let recorders = FakeFactory::default();
        let actions = base_actions();
        let cancel = CancelToken::new();
        let result = {
            let rig = Rig {
                actions: &actions,
                device: &log,
                pacer: &log,
                recorders: &recorders,
                render: &LogRender,
                cancel: &cancel,
                timing: timing(),
            };
            debug_routes(&RouteLibrary::new(dir.path()), ids, &identity_portals(), &rig)
        };
        (result, log, recorders)
    }

    #[test]
    fn range_validation() {
        assert_eq!(route_range(2, 4).unwrap(), [2, 3, 4]);
        assert!(route_range(0, 3).is_err());
        assert!(route_range(5, 3).is_err());
    }

    #[test]
    fn rehearsal_skips_markers_and_in_route_teleports() {
        let body = "portal: [1, 1]\nnext_portal: [50, 60]\nsteps:\n  - [teleport]\n  - [record_start]\n  - [jump]\n  - [record_stop]\n";
        let (result, log, recorders) = rehearse_dir(&[(1, body), (2, body)], &[1, 2]);
        let report = result.unwrap();
        assert_eq!(report.steps_run, 2);
        assert_eq!(report.steps_skipped, 6);
        assert!(recorders.events.borrow().is_empty());

        let events = log.events.borrow();
        assert_eq!(events.iter().filter(|e| *e == "tap 1 1").count(), 0);
        assert_eq!(events.iter().filter(|e| *e == "tap 50 60").count(), 2);
    }

    #[test]
    fn missing_next_portal_is_fatal() {
        let (result, _, _) = rehearse_dir(&[(1, "portal: [1, 1]\nsteps:\n  - [jump]\n")], &[1]);
        assert!(matches!(result, Err(CaptureError::Configuration(_))));
    }
}
