//! Frame clock - strictly increasing timestamps for the video detector
//!
//! The landmarker rejects a video frame whose timestamp does not advance.
//! Host clocks can repeat a value (coarse timers) or step back after a tab
//! is resumed, so each stamp is bumped past the previous one when needed.

/// Advance applied when the host clock repeats or steps back (ms)
const MIN_STEP_MS: f64 = 1.0;

#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp to hand to the detector for a frame observed at `now_ms`
    pub fn next(&mut self, now_ms: f64) -> f64 {
        let stamp = match self.last_ms {
            Some(last) if now_ms <= last => last + MIN_STEP_MS,
            _ => now_ms,
        };
        self.last_ms = Some(stamp);
        stamp
    }

    pub fn last(&self) -> Option<f64> {
        self.last_ms
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}
