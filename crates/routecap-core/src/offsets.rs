//! Per-key pixel corrections and the `{KEY}_X_OFFSET` / `{KEY}_Y_OFFSET`
//! environment convention.

use crate::error::{CaptureError, Result};
use crate::types::Offset;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Offset key (`GLOBAL`, a group tag, or a point name) → correction.
pub type OffsetMap = BTreeMap<String, Offset>;

/// The device-wide key, applied to every point before group and point keys.
pub const GLOBAL_KEY: &str = "GLOBAL";

static ENV_OFFSET_RE: OnceLock<Regex> = OnceLock::new();

fn env_offset_re() -> &'static Regex {
    ENV_OFFSET_RE.get_or_init(|| Regex::new(r"^([A-Z0-9_]+?)_([XY])_OFFSET$").unwrap())
}

/// Collect offsets from `(name, value)` pairs following the
/// `{KEY}_X_OFFSET` / `{KEY}_Y_OFFSET` convention. Unrelated names are
/// ignored; a matching name with a non-integer value is a configuration error.
pub fn offsets_from_vars<I, K, V>(vars: I) -> Result<OffsetMap>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map = OffsetMap::new();
    for (name, value) in vars {
        let name = name.as_ref();
        let Some(caps) = env_offset_re().captures(name) else {
            continue;
        };
        let amount: i32 = value.as_ref().trim().parse().map_err(|_| {
            CaptureError::Configuration(format!(
                "{name} must be an integer, got {:?}",
                value.as_ref()
            ))
        })?;
        let entry = map.entry(caps[1].to_string()).or_default();
        match &caps[2] {
            "X" => entry.dx = amount,
            _ => entry.dy = amount,
        }
    }
    Ok(map)
}

/// Snapshot the process environment once.
pub fn offsets_from_env() -> Result<OffsetMap> {
    offsets_from_vars(std::env::vars())
}

/// Overlay `extra` onto `base`; keys present in both are summed.
pub fn merge(base: &OffsetMap, extra: &OffsetMap) -> OffsetMap {
    let mut out = base.clone();
    for (key, off) in extra {
        let entry = out.entry(key.clone()).or_default();
        *entry = *entry + *off;
    }
    out
}
