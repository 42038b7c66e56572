use crate::output::{print_json, print_table};
use crate::session::Session;
use routecap_core::counters::CounterStore;

pub fn run(session: &Session, json: bool) -> anyhow::Result<()> {
    let store = CounterStore::in_video_base(&session.config.video_base);
    let state = store.load();

    if json {
        return print_json(&state);
    }

    if state.is_empty() {
        println!("No counters recorded at {}.", store.path().display());
        return Ok(());
    }
    let rows: Vec<Vec<String>> = state
        .iter()
        .flat_map(|(profile, counts)| {
            counts
                .iter()
                .map(move |(action, n)| vec![profile.clone(), action.clone(), n.to_string()])
        })
        .collect();
    print_table(&["PROFILE", "ACTION", "COUNT"], &rows);
    Ok(())
}
