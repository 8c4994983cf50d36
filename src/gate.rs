use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::{Result, ValidationError};

const IDLE: u8 = 0;
const PREVIEWING: u8 = 1;
const RENDERING: u8 = 2;

/// Mutual exclusion between preview playback and the synthesis worker.
///
/// Both touch the music file, so concurrently previewing and encoding risks
/// interleaved file access. The gate holds one activity at a time and hands
/// out an RAII token; dropping the token releases the gate.
#[derive(Debug, Default)]
pub struct ActivityGate {
    state: AtomicU8,
}

impl ActivityGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { state: AtomicU8::new(IDLE) })
    }

    /// Claim the gate for preview playback
    pub fn begin_preview(self: &Arc<Self>) -> Result<ActivityToken> {
        self.begin(PREVIEWING)
    }

    /// Claim the gate for a render job
    pub fn begin_render(self: &Arc<Self>) -> Result<ActivityToken> {
        self.begin(RENDERING)
    }

    fn begin(self: &Arc<Self>, activity: u8) -> Result<ActivityToken> {
        match self.state.compare_exchange(IDLE, activity, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => Ok(ActivityToken { gate: Arc::clone(self) }),
            Err(PREVIEWING) => Err(ValidationError::PreviewActive.into()),
            Err(_) => Err(ValidationError::RenderInFlight.into()),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state.load(Ordering::Acquire) == IDLE
    }
}

/// Held for the duration of one preview or render; releases the gate on drop
#[derive(Debug)]
pub struct ActivityToken {
    gate: Arc<ActivityGate>,
}

impl Drop for ActivityToken {
    fn drop(&mut self) {
        self.gate.state.store(IDLE, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlidesError;

    #[test]
    fn test_render_rejected_while_previewing() {
        let gate = ActivityGate::new();
        let _token = gate.begin_preview().unwrap();

        match gate.begin_render() {
            Err(SlidesError::Validation(ValidationError::PreviewActive)) => {}
            other => panic!("expected PreviewActive, got {other:?}"),
        }
    }

    #[test]
    fn test_preview_rejected_while_rendering() {
        let gate = ActivityGate::new();
        let _token = gate.begin_render().unwrap();

        match gate.begin_preview() {
            Err(SlidesError::Validation(ValidationError::RenderInFlight)) => {}
            other => panic!("expected RenderInFlight, got {other:?}"),
        }
    }

    #[test]
    fn test_token_drop_releases_gate() {
        let gate = ActivityGate::new();
        assert!(gate.is_idle());

        let token = gate.begin_render().unwrap();
        assert!(!gate.is_idle());
        assert!(gate.begin_render().is_err());

        drop(token);
        assert!(gate.is_idle());
        assert!(gate.begin_preview().is_ok());
    }
}
