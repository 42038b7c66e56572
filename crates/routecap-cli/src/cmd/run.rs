use crate::output::{print_json, print_table};
use crate::session::{Hardware, Session};
use anyhow::Context;
use clap::Args;
use routecap_core::campaign::{CaptureRun, RunSummary};
use routecap_core::config::parse_route_list;

/// Per-invocation overrides of `routecap.yaml`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configs each route must complete before its counters are saved
    #[arg(long)]
    pub configs: Option<usize>,

    /// 1-based render config to start from
    #[arg(long)]
    pub start_from: Option<usize>,

    /// Skip configs whose recordings already exist
    #[arg(long)]
    pub skip_recorded: bool,

    /// Comma-separated route ids to leave out
    #[arg(long, value_name = "IDS")]
    pub skip_routes: Option<String>,

    /// Start the run at this route (rolls counters back to it)
    #[arg(long, value_name = "ID")]
    pub restart_from: Option<u32>,
}

pub fn run(session: Session, args: RunArgs, json: bool) -> anyhow::Result<()> {
    let mut session = session;
    let cfg = &mut session.config;
    if let Some(n) = args.configs {
        cfg.configs_per_route = n;
    }
    if let Some(n) = args.start_from {
        cfg.start_from_config = n;
    }
    if args.skip_recorded {
        cfg.skip_recorded = true;
    }
    if let Some(raw) = &args.skip_routes {
        cfg.skip_routes = parse_route_list(raw)?;
    }
    if args.restart_from.is_some() {
        cfg.restart_from_route = args.restart_from;
    }
    cfg.validate().context("invalid run options")?;

    let hardware = Hardware::connect(&session)?;
    execute(&session, &hardware, json)
}

pub fn execute(session: &Session, hardware: &Hardware, json: bool) -> anyhow::Result<()> {
    let summary = CaptureRun::new(&session.config)
        .execute(&hardware.rig())
        .context("capture run failed")?;

    if json {
        return print_json(&summary);
    }
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    if let Some(rb) = &summary.rollback {
        println!("Rolled back {} to {}", rb.profile, rb.checkpoint);
    }
    if summary.routes.is_empty() {
        println!("No routes run.");
        return;
    }
    let rows: Vec<Vec<String>> = summary
        .routes
        .iter()
        .map(|r| {
            vec![
                r.route.to_string(),
                format!("{:?}", r.state).to_lowercase(),
                format!("{}/{}", r.completed, r.target),
                r.executed.to_string(),
                r.skipped.to_string(),
                if r.saved { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ROUTE", "STATE", "COMPLETED", "EXECUTED", "SKIPPED", "SAVED"], &rows);
    let elapsed = summary.finished_at - summary.started_at;
    println!("Finished in {}m{:02}s", elapsed.num_minutes(), elapsed.num_seconds() % 60);
}
