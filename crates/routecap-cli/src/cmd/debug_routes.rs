use crate::output::print_json;
use crate::session::{Hardware, Session};
use anyhow::Context;
use routecap_core::campaign::{debug_routes, route_range};
use routecap_core::route::RouteLibrary;

pub fn run(session: Session, start: u32, end: u32, json: bool) -> anyhow::Result<()> {
    let ids = route_range(start, end)?;
    let hardware = Hardware::connect(&session)?;
    let library = RouteLibrary::new(&session.config.route_root);

    let report = debug_routes(&library, &ids, &session.config.portal, &hardware.rig())
        .context("route rehearsal failed")?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "Rehearsed routes {start}..={end}: {} steps run, {} skipped",
            report.steps_run, report.steps_skipped
        );
    }
    Ok(())
}
