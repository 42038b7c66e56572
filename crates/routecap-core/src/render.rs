//! Render configs: scripted in-game graphics settings applied before each
//! campaign pass.
//!
//! ```json
//! {"steps": [
//!   {"type": "tap", "x": 2600, "y": 80},
//!   {"type": "swipe", "start": [1200, 400], "end": [1200, 900], "duration": 300},
//!   {"type": "sleep", "time": 0.5},
//!   {"type": "info", "message": "shadows: low"}
//! ]}
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::device::Device;
use crate::error::{CaptureError, Result};
use crate::pacing::Pacer;
use crate::types::{self, Coord, Resolution};

const SETTLE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderStep {
    Tap { x: i32, y: i32 },
    Swipe { start: Coord, end: Coord, duration: u64 },
    Sleep { time: f64 },
    Info {
        #[serde(default)]
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderConfig {
    pub steps: Vec<RenderStep>,
}

impl RenderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Copy with tap and swipe coordinates moved from `from` to `to`.
    pub fn rescaled(&self, from: Resolution, to: Resolution) -> Result<Self> {
        let steps = self
            .steps
            .iter()
            .map(|step| {
                Ok(match step {
                    RenderStep::Tap { x, y } => {
                        let c = types::scale(Coord::new(*x, *y), from, to)?;
                        RenderStep::Tap { x: c.x, y: c.y }
                    }
                    RenderStep::Swipe {
                        start,
                        end,
                        duration,
                    } => RenderStep::Swipe {
                        start: types::scale(*start, from, to)?,
                        end: types::scale(*end, from, to)?,
                        duration: *duration,
                    },
                    other => other.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }
}

// ---------------------------------------------------------------------------
// Applier
// ---------------------------------------------------------------------------

pub trait RenderConfigApplier {
    fn apply(&self, config: &Path, device: &dyn Device, pacer: &dyn Pacer) -> Result<()>;
}

/// Applies JSON render configs authored against `source`, rescaled to
/// `target`.
#[derive(Debug, Clone, Copy)]
pub struct JsonRenderConfigs {
    pub source: Resolution,
    pub target: Resolution,
}

impl JsonRenderConfigs {
    pub fn new(source: Resolution, target: Resolution) -> Self {
        Self { source, target }
    }
}

impl RenderConfigApplier for JsonRenderConfigs {
    fn apply(&self, config: &Path, device: &dyn Device, pacer: &dyn Pacer) -> Result<()> {
        let doc = RenderConfig::load(config)?.rescaled(self.source, self.target)?;
        for step in &doc.steps {
            match step {
                RenderStep::Tap { x, y } => device.tap(Coord::new(*x, *y))?,
                RenderStep::Swipe {
                    start,
                    end,
                    duration,
                } => device.swipe(*start, *end, Duration::from_millis(*duration))?,
                RenderStep::Sleep { time } => pacer.sleep_secs(*time),
                RenderStep::Info { message } => tracing::info!(config = %config.display(), "{message}"),
            }
        }
        pacer.sleep(SETTLE);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config discovery
// ---------------------------------------------------------------------------

/// One render config file and the id its recordings are named by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub path: PathBuf,
    /// `{subdir}_{stem}`.
    pub id: String,
}

/// Collect `{root}/{subdir}/*.json` in sorted order, starting at the 1-based
/// `start_from` and returning at most `limit` entries.
pub fn collect_configs(root: &Path, start_from: usize, limit: usize) -> Result<Vec<ConfigEntry>> {
    if !root.is_dir() {
        return Err(CaptureError::Configuration(format!(
            "render config root {} is not a directory",
            root.display()
        )));
    }
    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();

    let mut all = Vec::new();
    for dir in subdirs {
        let group = file_name(&dir);
        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        for path in files {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            all.push(ConfigEntry {
                id: format!("{group}_{stem}"),
                path,
            });
        }
    }

    Ok(all
        .into_iter()
        .skip(start_from.max(1) - 1)
        .take(limit)
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::tests::Log;
    use tempfile::TempDir;

    const DOC: &str = r#"{"steps": [
        {"type": "tap", "x": 2772, "y": 1284},
        {"type": "info", "message": "low"},
        {"type": "swipe", "start": [100, 50], "end": [200, 60], "duration": 300},
        {"type": "sleep", "time": 0.5}
    ]}"#;

    #[test]
    fn apply_rescales_and_settles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("low.json");
        std::fs::write(&path, DOC).unwrap();

        let applier = JsonRenderConfigs::new(Resolution::new(2772, 1284), Resolution::new(1386, 642));
        let log = Log::default();
        applier.apply(&path, &log, &log).unwrap();
        assert_eq!(
            *log.events.borrow(),
            [
                "tap 1386 642",
                "swipe 50 25 100 30 300",
                "sleep 500",
                "sleep 1000",
            ]
        );
    }

    #[test]
    fn unknown_step_type_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"steps": [{"type": "pinch"}]}"#).unwrap();
        assert!(matches!(RenderConfig::load(&path), Err(CaptureError::Json(_))));
    }

    #[test]
    fn collect_orders_offsets_and_limits() {
        let dir = TempDir::new().unwrap();
        for (sub, files) in [("b_high", ["02.json", "01.json"]), ("a_low", ["x.json", "y.txt"])] {
            let d = dir.path().join(sub);
            std::fs::create_dir(&d).unwrap();
            for f in files {
                std::fs::write(d.join(f), DOC).unwrap();
            }
        }
        std::fs::write(dir.path().join("stray.json"), DOC).unwrap();

        let ids = |start, limit| -> Vec<String> {
            collect_configs(dir.path(), start, limit)
                .unwrap()
                .into_iter()
                .map(|c| c.id)
                .collect()
        };
        assert_eq!(ids(1, 80), ["a_low_x", "b_high_01", "b_high_02"]);
        assert_eq!(ids(2, 1), ["b_high_01"]);
        assert_eq!(ids(0, 2), ["a_low_x", "b_high_01"]);
        assert!(ids(9, 80).is_empty());
    }

    #[test]
    fn missing_root_is_configuration_error() {
        let err = collect_configs(Path::new("/nonexistent/configs"), 1, 1).unwrap_err();
        assert!(matches!(err, CaptureError::Configuration(_)));
    }
}
