use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "routecap.yaml";
pub const COUNTER_FILE: &str = "_action_counts.json";
pub const VIDEO_EXT: &str = "mp4";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn counter_file(video_base: &Path) -> PathBuf {
    video_base.join(COUNTER_FILE)
}

/// Label used in output directory names for a route.
pub fn route_label(route_id: u32) -> String {
    format!("h{route_id}")
}

/// Directory collecting every config's take of one recorded action slot:
/// `{video_base}/{action}/{profile}_{index}_{route_label}`.
pub fn action_dir(
    video_base: &Path,
    action: &str,
    profile: &str,
    index: u32,
    route_label: &str,
) -> PathBuf {
    video_base
        .join(action)
        .join(format!("{profile}_{index}_{route_label}"))
}

pub fn video_path(
    video_base: &Path,
    action: &str,
    profile: &str,
    index: u32,
    route_label: &str,
    config_id: &str,
) -> PathBuf {
    action_dir(video_base, action, profile, index, route_label)
        .join(format!("{config_id}.{VIDEO_EXT}"))
}
