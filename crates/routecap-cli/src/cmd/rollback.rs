use crate::output::print_json;
use crate::session::{Hardware, Session};
use anyhow::Context;
use routecap_core::campaign::CaptureRun;
use routecap_core::checkpoint::Checkpoint;

/// Roll counters back to `checkpoint`. With `only`, stop there; otherwise
/// continue into a normal run that starts from the checkpoint route.
pub fn run(session: Session, checkpoint: &str, only: bool, json: bool) -> anyhow::Result<()> {
    let checkpoint: Checkpoint = checkpoint.parse()?;
    let mut session = session;
    session.config.rollback_checkpoint = Some(checkpoint.to_string());
    session.config.rollback_only = only;

    if !only {
        let hardware = Hardware::connect(&session)?;
        return super::run::execute(&session, &hardware, json);
    }

    let capture = CaptureRun::new(&session.config);
    let selection = capture.select().context("failed to select routes")?;
    let report = capture
        .rollback(&selection.active, checkpoint)
        .context("rollback failed")?;

    if json {
        print_json(&report)?;
    } else {
        let counts: Vec<String> = report
            .counts
            .iter()
            .map(|(a, n)| format!("{a}={n}"))
            .collect();
        println!(
            "Rolled back {} to route {} record_start #{}: {}",
            report.profile,
            checkpoint.route,
            checkpoint.ordinal,
            counts.join(" ")
        );
        println!("Counters written to {}", capture.store().path().display());
    }
    Ok(())
}
