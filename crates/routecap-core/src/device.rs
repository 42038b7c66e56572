//! Touch input on the target device.
//!
//! The orchestrator only ever needs two gestures: a tap and a timed swipe.
//! `AdbDevice` issues them through `adb shell input`.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::{CaptureError, Result};
use crate::types::Coord;

pub trait Device {
    fn tap(&self, at: Coord) -> Result<()>;

    fn swipe(&self, from: Coord, to: Coord, duration: Duration) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct AdbDevice {
    adb: PathBuf,
    serial: Option<String>,
}

impl AdbDevice {
    pub fn new(adb: impl Into<PathBuf>, serial: Option<String>) -> Self {
        Self {
            adb: adb.into(),
            serial,
        }
    }

    /// Find `adb` on PATH.
    pub fn locate(serial: Option<String>) -> Result<Self> {
        let adb = which::which("adb").map_err(|_| {
            CaptureError::Configuration("adb not found on PATH".to_string())
        })?;
        Ok(Self::new(adb, serial))
    }

    fn input(&self, args: &[String]) -> Result<()> {
        let mut cmd = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            cmd.args(["-s", serial]);
        }
        cmd.args(["shell", "input"]).args(args);
        cmd.stdin(Stdio::null()).stdout(Stdio::null());

        let status = cmd
            .status()
            .map_err(|e| CaptureError::Device(format!("failed to run adb: {e}")))?;
        if !status.success() {
            return Err(CaptureError::Device(format!(
                "adb shell input {} exited with {status}",
                args.join(" ")
            )));
        }
        Ok(())
    }
}

impl Device for AdbDevice {
    fn tap(&self, at: Coord) -> Result<()> {
        tracing::debug!(x = at.x, y = at.y, "tap");
        self.input(&["tap".into(), at.x.to_string(), at.y.to_string()])
    }

    fn swipe(&self, from: Coord, to: Coord, duration: Duration) -> Result<()> {
        tracing::debug!(%from, %to, ms = duration.as_millis() as u64, "swipe");
        self.input(&[
            "swipe".into(),
            from.x.to_string(),
            from.y.to_string(),
            to.x.to_string(),
            to.y.to_string(),
            duration.as_millis().to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_device_error() {
        let dev = AdbDevice::new("/nonexistent/adb-binary", None);
        let err = dev.tap(Coord::new(1, 2)).unwrap_err();
        assert!(matches!(err, CaptureError::Device(_)));
    }
}
