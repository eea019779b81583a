//! Frame rate estimation for the processing pipeline
//!
//! The host calls [`FrameClock::sample`] once per frame; the smoothed
//! estimate feeds the processor's batch adaptation. Tests drive the
//! processor with an explicit fps value instead, so nothing here sleeps.

use web_time::Instant;

/// Exponentially smoothed frames-per-second estimator
#[derive(Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    smoothed: f32,
}

impl FrameClock {
    /// Smoothing weight of the newest sample
    const ALPHA: f32 = 0.1;

    pub fn new(initial_fps: f32) -> Self {
        Self {
            last: None,
            smoothed: initial_fps,
        }
    }

    /// Records a frame boundary and returns the updated estimate
    pub fn sample(&mut self) -> f32 {
        let now = Instant::now();
        if let Some(last) = self.last {
            let dt = now.duration_since(last).as_secs_f32();
            if dt > 0.0 {
                let fps = 1.0 / dt;
                self.smoothed += (fps - self.smoothed) * Self::ALPHA;
            }
        }
        self.last = Some(now);
        self.smoothed
    }

    /// Current estimate without recording a frame
    pub fn fps(&self) -> f32 {
        self.smoothed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}
