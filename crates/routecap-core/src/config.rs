use crate::checkpoint::Checkpoint;
use crate::counters::ActionCounts;
use crate::error::{CaptureError, Result};
use crate::offsets::OffsetMap;
use crate::paths;
use crate::portal::PortalTransform;
use crate::recorder::RecorderSettings;
use crate::types::Resolution;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

pub const ENV_SRC_W: &str = "ROUTECAP_SRC_W";
pub const ENV_SRC_H: &str = "ROUTECAP_SRC_H";
pub const ENV_DST_W: &str = "ROUTECAP_DST_W";
pub const ENV_DST_H: &str = "ROUTECAP_DST_H";
pub const ENV_PORT_W: &str = "ROUTECAP_PORT_W";
pub const ENV_ROLLBACK_CHECKPOINT: &str = "ROUTECAP_ROLLBACK_CHECKPOINT";
pub const ENV_ROLLBACK_ONLY: &str = "ROUTECAP_ROLLBACK_ONLY";
pub const ENV_RESTART_FROM_ROUTE: &str = "ROUTECAP_RESTART_FROM_ROUTE";
pub const ENV_SKIP_ROUTES: &str = "ROUTECAP_SKIP_ROUTES";

// ---------------------------------------------------------------------------
// CampaignConfig
// ---------------------------------------------------------------------------

/// Every option of a capture run, read once from `routecap.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Device profile id (`huaweipura`, `huaweimate`, `oppofindx`).
    pub device: String,
    /// Counter profile: the key in the counter file and the prefix of every
    /// output directory.
    pub region: String,
    pub route_root: PathBuf,
    pub config_root: PathBuf,
    pub video_base: PathBuf,
    /// Explicit route order; all routes in `route_root` when absent.
    pub routes: Option<Vec<u32>>,
    pub skip_routes: Vec<u32>,
    pub configs_per_route: usize,
    /// 1-based index of the first render config to run.
    pub start_from_config: usize,
    pub skip_recorded: bool,
    pub step_delay_ms: u64,
    pub route_gap_ms: u64,
    pub record_settle_ms: u64,
    /// Whether the device supports the in-game time adjustment sequence.
    pub time_adjust: bool,
    pub portal: PortalTransform,
    /// `"route:ordinal"`; rebuilds counters before the run.
    pub rollback_checkpoint: Option<String>,
    pub rollback_only: bool,
    pub restart_from_route: Option<u32>,
    /// Extra static offsets, added to the device profile's own.
    pub offsets: OffsetMap,
    pub use_env_offsets: bool,
    pub base_counts: BTreeMap<String, ActionCounts>,
    pub recorder: RecorderSettings,
    /// adb / scrcpy device serial.
    pub serial: Option<String>,
}

fn default_base_counts() -> BTreeMap<String, ActionCounts> {
    let natlan: ActionCounts = [("glide", 0), ("run", 0), ("swim", 0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    BTreeMap::from([("natlan".to_string(), natlan)])
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            device: "huaweipura".to_string(),
            region: "natlan".to_string(),
            route_root: PathBuf::from("routes"),
            config_root: PathBuf::from("render_configs"),
            video_base: PathBuf::from("recordings"),
            routes: None,
            skip_routes: Vec::new(),
            configs_per_route: 80,
            start_from_config: 1,
            skip_recorded: false,
            step_delay_ms: 400,
            route_gap_ms: 1000,
            record_settle_ms: 300,
            time_adjust: true,
            portal: PortalTransform::default(),
            rollback_checkpoint: None,
            rollback_only: false,
            restart_from_route: None,
            offsets: OffsetMap::new(),
            use_env_offsets: true,
            base_counts: default_base_counts(),
            recorder: RecorderSettings::default(),
            serial: None,
        }
    }
}

impl CampaignConfig {
    /// Load `routecap.yaml` from `root`; defaults when the file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: CampaignConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Apply the `ROUTECAP_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(std::env::vars())
    }

    /// Apply `ROUTECAP_*` overrides from `(name, value)` pairs. Empty values
    /// are ignored.
    pub fn apply_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in vars {
            let (name, value) = (name.as_ref(), value.as_ref().trim());
            if value.is_empty() {
                continue;
            }
            match name {
                ENV_SRC_W => self.portal.source.width = env_int(name, value)?,
                ENV_SRC_H => self.portal.source.height = env_int(name, value)?,
                ENV_DST_W => self.portal.destination.width = env_int(name, value)?,
                ENV_DST_H => self.portal.destination.height = env_int(name, value)?,
                ENV_PORT_W => self.portal.port_width = Some(env_int(name, value)?),
                ENV_ROLLBACK_CHECKPOINT => self.rollback_checkpoint = Some(value.to_string()),
                ENV_ROLLBACK_ONLY => self.rollback_only = env_flag(value),
                ENV_RESTART_FROM_ROUTE => {
                    self.restart_from_route = Some(parse_route_id(name, value)?)
                }
                ENV_SKIP_ROUTES => self.skip_routes = parse_route_list(value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Make every relative directory absolute under `root`, expanding `~`.
    pub fn resolve_paths(&mut self, root: &Path) -> Result<()> {
        for dir in [&mut self.route_root, &mut self.config_root, &mut self.video_base] {
            let expanded = crate::io::expand_home(dir)?;
            *dir = if expanded.is_absolute() {
                expanded
            } else {
                root.join(expanded)
            };
        }
        Ok(())
    }

    /// The parsed rollback checkpoint, if one is configured.
    pub fn checkpoint(&self) -> Result<Option<Checkpoint>> {
        match &self.rollback_checkpoint {
            Some(raw) => Checkpoint::parse_opt(raw),
            None => Ok(None),
        }
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.configs_per_route == 0 {
            return Err(CaptureError::Configuration(
                "configs_per_route must be at least 1".to_string(),
            ));
        }
        if self.start_from_config == 0 {
            return Err(CaptureError::Configuration(
                "start_from_config is 1-based".to_string(),
            ));
        }
        if self.skip_routes.contains(&0) || self.routes.as_ref().is_some_and(|r| r.contains(&0)) {
            return Err(CaptureError::Configuration(
                "route ids must be positive integers".to_string(),
            ));
        }
        for res in [self.portal.source, self.portal.destination] {
            res.validate()?;
        }
        if let Some(w) = self.portal.port_width {
            Resolution::new(w, 1).validate()?;
        }
        self.checkpoint()?;
        Ok(())
    }
}

fn env_int(name: &str, value: &str) -> Result<i64> {
    value.parse().map_err(|_| {
        CaptureError::Configuration(format!("{name} must be an integer, got {value:?}"))
    })
}

fn env_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_route_id(name: &str, value: &str) -> Result<u32> {
    match value.parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CaptureError::Configuration(format!(
            "{name} must be a positive route id, got {value:?}"
        ))),
    }
}

/// Parse a comma-separated list of route ids, e.g. `"3, 5,9"`.
pub fn parse_route_list(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_route_id(ENV_SKIP_ROUTES, s))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = CampaignConfig::load(dir.path()).unwrap();
        assert_eq!(cfg, CampaignConfig::default());
        assert_eq!(cfg.configs_per_route, 80);
        assert_eq!(cfg.recorder.stop_grace_ms, 8000);
        assert_eq!(cfg.base_counts["natlan"]["glide"], 0);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = CampaignConfig::default();
        cfg.device = "huaweimate".into();
        cfg.skip_routes = vec![4, 9];
        cfg.rollback_checkpoint = Some("7:17".into());
        cfg.save(dir.path()).unwrap();
        assert_eq!(CampaignConfig::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("routecap.yaml"),
            "device: oppofindx\nconfigs_per_route: 5\nportal:\n  source: {width: 2848, height: 1276}\n  destination: {width: 2772, height: 1272}\noffsets:\n  ATTACK: [3, -2]\n",
        )
        .unwrap();
        let cfg = CampaignConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.device, "oppofindx");
        assert_eq!(cfg.configs_per_route, 5);
        assert_eq!(cfg.step_delay_ms, 400);
        assert!(cfg.portal.rotate);
        assert_eq!(cfg.offsets["ATTACK"], crate::types::Offset::new(3, -2));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = CampaignConfig::default();
        cfg.apply_vars([
            (ENV_SRC_W, "3000"),
            (ENV_DST_H, "1272"),
            (ENV_PORT_W, "1272"),
            (ENV_ROLLBACK_CHECKPOINT, "7:17"),
            (ENV_ROLLBACK_ONLY, "1"),
            (ENV_RESTART_FROM_ROUTE, "5"),
            (ENV_SKIP_ROUTES, "3, 9,"),
            ("PATH", "/usr/bin"),
            (ENV_SRC_H, ""),
        ])
        .unwrap();
        assert_eq!(cfg.portal.source, Resolution::new(3000, 1276));
        assert_eq!(cfg.portal.destination.height, 1272);
        assert_eq!(cfg.portal.port_width, Some(1272));
        assert_eq!(cfg.checkpoint().unwrap(), Some(Checkpoint { route: 7, ordinal: 17 }));
        assert!(cfg.rollback_only);
        assert_eq!(cfg.restart_from_route, Some(5));
        assert_eq!(cfg.skip_routes, [3, 9]);
    }

    #[test]
    fn invalid_env_values_are_configuration_errors() {
        for (name, value) in [
            (ENV_SRC_W, "wide"),
            (ENV_SKIP_ROUTES, "3,x"),
            (ENV_SKIP_ROUTES, "0"),
            (ENV_RESTART_FROM_ROUTE, "-2"),
        ] {
            let mut cfg = CampaignConfig::default();
            assert!(
                matches!(cfg.apply_vars([(name, value)]), Err(CaptureError::Configuration(_))),
                "{name}={value}"
            );
        }
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = CampaignConfig::default();
        assert!(cfg.validate().is_ok());

        cfg.rollback_checkpoint = Some("7".into());
        assert!(cfg.validate().is_err());

        let mut cfg = CampaignConfig::default();
        cfg.portal.destination = Resolution::new(0, 1260);
        assert!(cfg.validate().is_err());

        let mut cfg = CampaignConfig::default();
        cfg.configs_per_route = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn resolve_paths_anchors_relative_dirs() {
        let mut cfg = CampaignConfig::default();
        cfg.video_base = PathBuf::from("/abs/videos");
        cfg.resolve_paths(Path::new("/proj")).unwrap();
        assert_eq!(cfg.route_root, PathBuf::from("/proj/routes"));
        assert_eq!(cfg.config_root, PathBuf::from("/proj/render_configs"));
        assert_eq!(cfg.video_base, PathBuf::from("/abs/videos"));
    }
}
