use crate::output::{print_json, print_table};
use crate::session::Session;
use anyhow::Context;
use routecap_core::{
    campaign::{CaptureRun, RoutePortals},
    checkpoint,
    counters::{profile_counters, ActionCounts},
    paths, planner,
};
use std::path::PathBuf;

#[derive(serde::Serialize)]
struct PlannedSlot {
    ordinal: usize,
    action: String,
    index: u32,
    dir: PathBuf,
}

#[derive(serde::Serialize)]
struct RoutePlan {
    route: u32,
    portals: RoutePortals,
    slots: Vec<PlannedSlot>,
    end_counts: ActionCounts,
}

/// Show what a run would record, assuming every route completes. Nothing is
/// written and no device is touched; a configured rollback is simulated.
pub fn run(session: &Session, route: Option<u32>, json: bool) -> anyhow::Result<()> {
    let cfg = &session.config;
    let capture = CaptureRun::new(cfg);
    let selection = capture.select().context("failed to select routes")?;
    let ids = match route {
        Some(id) => vec![id],
        None => selection.run.clone(),
    };
    let routes = capture.library().load_all(&ids)?;

    let mut counts = match selection.checkpoint {
        Some(cp) => {
            let active = capture.library().load_all(&selection.active)?;
            let base = cfg.base_counts.get(&cfg.region).cloned().unwrap_or_default();
            checkpoint::rebuild_counters(&active, &base, cp)?
        }
        None => profile_counters(&cfg.region, &cfg.base_counts, &capture.store().load()),
    };

    let mut plans = Vec::new();
    for route in &routes {
        let plan = planner::plan(route, &counts);
        let label = route.label();
        let slots = plan
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| PlannedSlot {
                ordinal: i + 1,
                action: slot.action.clone(),
                index: slot.index,
                dir: paths::action_dir(&cfg.video_base, &slot.action, &cfg.region, slot.index, &label),
            })
            .collect();
        counts = planner::end_counters(route, &counts);
        plans.push(RoutePlan {
            route: route.id,
            portals: RoutePortals::for_route(route, &cfg.portal)?,
            slots,
            end_counts: counts.clone(),
        });
    }

    if json {
        return print_json(&plans);
    }

    for plan in &plans {
        let next = plan
            .portals
            .next
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "route {} (portal {}, next {next})",
            plan.route, plan.portals.current
        );
        let rows: Vec<Vec<String>> = plan
            .slots
            .iter()
            .map(|s| {
                vec![
                    s.ordinal.to_string(),
                    s.action.clone(),
                    s.index.to_string(),
                    s.dir.display().to_string(),
                ]
            })
            .collect();
        print_table(&["#", "ACTION", "INDEX", "DIR"], &rows);
        let end: Vec<String> = plan
            .end_counts
            .iter()
            .map(|(a, n)| format!("{a}={n}"))
            .collect();
        println!("end counts: {}\n", end.join(" "));
    }
    Ok(())
}
