//! Fixed delays and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CaptureError, Result};

/// Shared interrupt flag. Set from a signal handler, polled by the orchestrator
/// between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(CaptureError::Interrupted);
        }
        Ok(())
    }

    /// Report any error raised after cancellation as `Interrupted`. Ctrl+C
    /// also reaches child processes such as `adb`, and their failure is not
    /// the cause.
    pub fn classify(&self, err: CaptureError) -> CaptureError {
        if self.is_cancelled() && !matches!(err, CaptureError::Interrupted) {
            tracing::debug!("error after interrupt: {err}");
            return CaptureError::Interrupted;
        }
        err
    }
}

/// Source of the fixed delays between device actions.
pub trait Pacer {
    fn sleep(&self, duration: Duration);

    fn sleep_secs(&self, secs: f64) {
        if secs > 0.0 {
            self.sleep(Duration::from_secs_f64(secs));
        }
    }
}

const SLICE: Duration = Duration::from_millis(100);

/// Real-time pacer. Sleeps in short slices and returns early once `cancel`
/// is set so an interrupt is noticed without waiting out a long delay.
#[derive(Debug, Clone, Default)]
pub struct ThreadPacer {
    cancel: CancelToken,
}

impl ThreadPacer {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

impl Pacer for ThreadPacer {
    fn sleep(&self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.cancel.is_cancelled() {
                return;
            }
            let step = remaining.min(SLICE);
            std::thread::sleep(step);
            remaining -= step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn check_fails_after_cancel() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        let clone = token.clone();
        clone.cancel();
        assert!(matches!(token.check(), Err(CaptureError::Interrupted)));
    }

    #[test]
    fn classify_masks_errors_only_after_cancel() {
        let token = CancelToken::new();
        let err = token.classify(CaptureError::Device("adb exited 130".into()));
        assert!(matches!(err, CaptureError::Device(_)));

        token.cancel();
        let err = token.classify(CaptureError::Device("adb exited 130".into()));
        assert!(matches!(err, CaptureError::Interrupted));
    }

    #[test]
    fn cancelled_pacer_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        let pacer = ThreadPacer::new(token);
        let start = Instant::now();
        pacer.sleep(Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
