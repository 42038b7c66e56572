//! Loading the project config and wiring the real device collaborators.

use anyhow::Context;
use routecap_core::{
    action::Actions,
    campaign::{Rig, Timing},
    config::CampaignConfig,
    device::AdbDevice,
    offsets,
    pacing::{CancelToken, ThreadPacer},
    paths,
    points::{PointCatalog, ResolvedPoints, BASE_RESOLUTION},
    profile::{self, DeviceProfile},
    recorder::ScrcpyRecorderFactory,
    render::JsonRenderConfigs,
};
use std::path::Path;

pub struct Session {
    pub config: CampaignConfig,
}

impl Session {
    /// `routecap.yaml`, then `ROUTECAP_*` env overrides, then the global
    /// `--profile` flag.
    pub fn load(root: &Path, device: Option<&str>) -> anyhow::Result<Self> {
        let mut config = CampaignConfig::load(root)
            .with_context(|| format!("failed to load {}", paths::config_path(root).display()))?;
        config
            .apply_env()
            .context("invalid ROUTECAP_* environment override")?;
        if let Some(device) = device {
            config.device = device.to_string();
        }
        config.resolve_paths(root)?;
        config.validate().context("invalid configuration")?;
        Ok(Self { config })
    }

    pub fn device_profile(&self) -> anyhow::Result<&'static DeviceProfile> {
        Ok(profile::lookup(&self.config.device)?)
    }

    /// The catalog resolved for the configured device, offsets applied.
    pub fn points(&self) -> anyhow::Result<ResolvedPoints> {
        let device = self.device_profile()?;
        let static_offsets = offsets::merge(&device.offset_map(), &self.config.offsets);
        let env = if self.config.use_env_offsets {
            Some(offsets::offsets_from_env().context("invalid *_OFFSET environment variable")?)
        } else {
            None
        };
        Ok(PointCatalog::standard().resolve(device.resolution, &static_offsets, env.as_ref())?)
    }
}

/// The real device, recorder and pacing behind a `Rig`.
pub struct Hardware {
    actions: Actions,
    device: AdbDevice,
    recorders: ScrcpyRecorderFactory,
    render: JsonRenderConfigs,
    pacer: ThreadPacer,
    cancel: CancelToken,
    timing: Timing,
}

impl Hardware {
    pub fn connect(session: &Session) -> anyhow::Result<Self> {
        let cfg = &session.config;
        let profile = session.device_profile()?;
        let points = session.points()?;
        let device = AdbDevice::locate(cfg.serial.clone())?;
        let recorders = ScrcpyRecorderFactory::locate(cfg.serial.clone(), cfg.recorder.clone())?;

        let cancel = CancelToken::new();
        install_interrupt_handler(cancel.clone())?;
        tracing::info!(device = profile.id, resolution = %profile.resolution, "device ready");

        Ok(Self {
            actions: Actions::new(points, cfg.time_adjust),
            device,
            recorders,
            render: JsonRenderConfigs::new(BASE_RESOLUTION, profile.resolution),
            pacer: ThreadPacer::new(cancel.clone()),
            cancel,
            timing: Timing::from_config(cfg),
        })
    }

    pub fn rig(&self) -> Rig<'_> {
        Rig {
            actions: &self.actions,
            device: &self.device,
            pacer: &self.pacer,
            recorders: &self.recorders,
            render: &self.render,
            cancel: &self.cancel,
            timing: self.timing,
        }
    }
}

/// Turn Ctrl+C into a cancellation of `cancel`. The campaign notices it at
/// the next step boundary and stops its recorder on the way out.
fn install_interrupt_handler(cancel: CancelToken) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::warn!("interrupt handler unavailable: {e}");
                    return;
                }
            };
            rt.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, stopping after the current step");
                    cancel.cancel();
                }
            });
        })
        .context("failed to start interrupt handler")?;
    Ok(())
}
