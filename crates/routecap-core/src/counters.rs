//! Persisted per-profile action counters.
//!
//! The counter file is the single source of truth for output-file numbering:
//!
//! ```json
//! { "natlan": { "glide": 12, "run": 30, "swim": 9 } }
//! ```
//!
//! It is rewritten only when a campaign completes all of its configs (or by
//! an explicit rollback), always as a whole and always atomically.

use crate::error::Result;
use crate::paths;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Action name → highest index handed out so far.
pub type ActionCounts = BTreeMap<String, u32>;

/// Profile id → action counts.
pub type CounterState = BTreeMap<String, ActionCounts>;

pub struct CounterStore {
    path: PathBuf,
}

impl CounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store kept next to the recordings it numbers.
    pub fn in_video_base(video_base: &Path) -> Self {
        Self::new(paths::counter_file(video_base))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state. A missing or unreadable file yields an empty
    /// state; it never fails.
    pub fn load(&self) -> CounterState {
        if !self.path.exists() {
            return CounterState::new();
        }
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "counter file unreadable, starting empty: {e}");
                return CounterState::new();
            }
        };
        match serde_json::from_str::<CounterState>(&data) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "counter file corrupt, starting empty: {e}");
                CounterState::new()
            }
        }
    }

    /// Write the full state with sorted keys.
    pub fn save(&self, state: &CounterState) -> Result<()> {
        let data = serde_json::to_string_pretty(state)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }
}

/// Counters for `profile`: the static base table overlaid with whatever was
/// persisted for that profile. Persisted values win per key.
pub fn profile_counters(
    profile: &str,
    base_counts: &BTreeMap<String, ActionCounts>,
    state: &CounterState,
) -> ActionCounts {
    let mut merged = base_counts.get(profile).cloned().unwrap_or_default();
    if let Some(stored) = state.get(profile) {
        merged.extend(stored.iter().map(|(k, v)| (k.clone(), *v)));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn counts(pairs: &[(&str, u32)]) -> ActionCounts {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = CounterStore::new(dir.path().join("_action_counts.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("_action_counts.json");
        for bad in ["{not json", "[1, 2, 3]", r#"{"natlan": {"glide": -1}}"#] {
            std::fs::write(&path, bad).unwrap();
            assert!(CounterStore::new(&path).load().is_empty(), "input: {bad}");
        }
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CounterStore::in_video_base(dir.path());
        let mut state = CounterState::new();
        state.insert("natlan".into(), counts(&[("swim", 2), ("glide", 5)]));
        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn save_orders_keys() {
        let dir = TempDir::new().unwrap();
        let store = CounterStore::new(dir.path().join("nested/counts.json"));
        let mut state = CounterState::new();
        state.insert("zeta".into(), counts(&[("run", 1)]));
        state.insert("alpha".into(), counts(&[("swim", 2), ("glide", 3)]));
        store.save(&state).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let alpha = text.find("alpha").unwrap();
        let zeta = text.find("zeta").unwrap();
        let glide = text.find("glide").unwrap();
        let swim = text.find("swim").unwrap();
        assert!(alpha < zeta);
        assert!(glide < swim);
        assert!(text.contains("\n  \"alpha\": {"));
    }

    #[test]
    fn persisted_values_override_base_per_key() {
        let mut base = BTreeMap::new();
        base.insert("natlan".to_string(), counts(&[("glide", 10), ("run", 10), ("swim", 9)]));
        let mut state = CounterState::new();
        state.insert("natlan".into(), counts(&[("glide", 14), ("climb", 2)]));

        let merged = profile_counters("natlan", &base, &state);
        assert_eq!(
            merged,
            counts(&[("climb", 2), ("glide", 14), ("run", 10), ("swim", 9)])
        );
    }

    #[test]
    fn unknown_profile_without_state_is_empty() {
        let merged = profile_counters("mondstadt", &BTreeMap::new(), &CounterState::new());
        assert!(merged.is_empty());
    }
}
