//! Screen recording sessions.
//!
//! One `Recorder` is one running capture writing to one file. The
//! orchestrator holds at most one at a time through a `RecorderSlot`, which
//! stops whatever it holds when replaced, cleared, or dropped.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, Result};

pub trait Recorder {
    /// Output file this session writes.
    fn path(&self) -> &Path;

    /// End the session. Must leave no process behind, even on error.
    fn stop(&mut self) -> Result<()>;
}

pub trait RecorderFactory {
    fn start(&self, output: &Path) -> Result<Box<dyn Recorder>>;

    /// How long a fresh session needs before it captures frames. The caller
    /// waits this out through its `Pacer`, so an interrupt cuts it short.
    fn startup_wait(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// RecorderSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Recorder binary; looked up on PATH when not absolute.
    pub binary: String,
    pub max_fps: u32,
    /// Time the recorder needs before frames start landing in the file.
    pub startup_wait_ms: u64,
    /// How long a graceful stop may take before the process is killed.
    pub stop_grace_ms: u64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            binary: "scrcpy".to_string(),
            max_fps: 60,
            startup_wait_ms: 1000,
            stop_grace_ms: 8000,
        }
    }
}

// ---------------------------------------------------------------------------
// scrcpy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScrcpyRecorderFactory {
    binary: PathBuf,
    serial: Option<String>,
    settings: RecorderSettings,
}

impl ScrcpyRecorderFactory {
    pub fn new(binary: impl Into<PathBuf>, serial: Option<String>, settings: RecorderSettings) -> Self {
        Self {
            binary: binary.into(),
            serial,
            settings,
        }
    }

    /// Resolve `settings.binary` on PATH.
    pub fn locate(serial: Option<String>, settings: RecorderSettings) -> Result<Self> {
        let binary = which::which(&settings.binary).map_err(|_| {
            CaptureError::Configuration(format!("{} not found on PATH", settings.binary))
        })?;
        Ok(Self::new(binary, serial, settings))
    }

    fn command(&self, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(serial) = &self.serial {
            cmd.args(["--serial", serial]);
        }
        cmd.arg("--record")
            .arg(output)
            .arg("--no-playback")
            .args(["--max-fps", &self.settings.max_fps.to_string()])
            .arg("--no-audio")
            .arg("--no-window");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group, so a stop signal reaches scrcpy's helpers and a
        // terminal Ctrl+C does not.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }
}

impl RecorderFactory for ScrcpyRecorderFactory {
    fn start(&self, output: &Path) -> Result<Box<dyn Recorder>> {
        let child = self.command(output).spawn().map_err(|e| {
            CaptureError::Recorder(format!("failed to spawn {}: {e}", self.binary.display()))
        })?;
        tracing::info!(pid = child.id(), path = %output.display(), "recording started");
        Ok(Box::new(ScrcpyRecorder {
            child: Some(child),
            path: output.to_path_buf(),
            grace: Duration::from_millis(self.settings.stop_grace_ms),
        }))
    }

    fn startup_wait(&self) -> Duration {
        Duration::from_millis(self.settings.startup_wait_ms)
    }
}

pub struct ScrcpyRecorder {
    child: Option<Child>,
    path: PathBuf,
    grace: Duration,
}

impl ScrcpyRecorder {
    fn interrupt(child: &mut Child) {
        #[cfg(unix)]
        {
            let group = format!("-{}", child.id());
            let sent = Command::new("kill")
                .args(["-INT", "--", &group])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            match sent {
                Ok(status) if status.success() => return,
                Ok(status) => tracing::warn!(pid = child.id(), "kill -INT exited with {status}"),
                Err(e) => tracing::warn!(pid = child.id(), "kill -INT failed: {e}"),
            }
        }
        let _ = child.kill();
    }
}

/// Wait up to `grace` for `child` to exit on its own. Returns whether it did.
fn wait_with_grace(child: &mut Child, grace: Duration) -> Result<bool> {
    let deadline = Instant::now() + grace;
    loop {
        if child.try_wait()?.is_some() {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

impl Recorder for ScrcpyRecorder {
    fn path(&self) -> &Path {
        &self.path
    }

    fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if child.try_wait()?.is_none() {
            Self::interrupt(&mut child);
            if !wait_with_grace(&mut child, self.grace)? {
                tracing::warn!(pid = child.id(), "recorder ignored interrupt, killing");
                let _ = child.kill();
            }
        }
        child.wait()?;
        tracing::info!(path = %self.path.display(), "recording stopped");
        Ok(())
    }
}

impl Drop for ScrcpyRecorder {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSlot
// ---------------------------------------------------------------------------

/// Holds the single active recording, if any.
#[derive(Default)]
pub struct RecorderSlot {
    active: Option<Box<dyn Recorder>>,
}

impl RecorderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Stop the current recording (if any) and hold `next` instead.
    pub fn replace(&mut self, next: Box<dyn Recorder>) -> Result<()> {
        self.stop()?;
        self.active = Some(next);
        Ok(())
    }

    /// Stop and clear the current recording, if any.
    pub fn stop(&mut self) -> Result<()> {
        match self.active.take() {
            Some(mut rec) => rec.stop(),
            None => Ok(()),
        }
    }
}

impl Drop for RecorderSlot {
    fn drop(&mut self) {
        if let Some(mut rec) = self.active.take() {
            if let Err(e) = rec.stop() {
                tracing::warn!(path = %rec.path().display(), "failed to stop recorder: {e}");
            }
        }
    }
}
