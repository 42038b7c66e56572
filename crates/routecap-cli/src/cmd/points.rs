use crate::output::{print_json, print_table};
use crate::session::Session;
use anyhow::Context;

pub fn run(session: &Session, json: bool) -> anyhow::Result<()> {
    let resolved = session.points().context("failed to resolve points")?;

    if json {
        return print_json(&resolved);
    }

    println!(
        "{} ({} -> {})",
        session.config.device, resolved.base, resolved.target
    );
    let rows: Vec<Vec<String>> = resolved
        .points
        .iter()
        .map(|(name, c)| vec![name.clone(), c.x.to_string(), c.y.to_string()])
        .collect();
    print_table(&["POINT", "X", "Y"], &rows);
    Ok(())
}
