use log::{error, trace, warn};

use crate::{backend::GraphicsBackend, error::RenderError, session::RenderSession};

/// Host hook asking for one more display synchronized callback.
pub trait FrameScheduler {
    fn request_frame(&self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Drawn { time: f32 },
    /// The frame failed and the next one was requested anyway.
    Skipped { time: f32 },
    /// Detached or halted, nothing was written and nothing rescheduled.
    Suppressed,
}

/// Seconds into the looping animation at a host timestamp.
pub fn animation_time(timestamp_millis: f64, duration: f32) -> f32 {
    if !timestamp_millis.is_finite() || !(duration > 0.0) {
        return 0.0;
    }
    (timestamp_millis / 1000.0).rem_euclid(duration as f64) as f32
}

/// Per frame driver: evaluate, write, draw, reschedule.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    max_consecutive_failures: u32,
    consecutive_failures: u32,
    halted: bool,
}

impl FrameDriver {
    pub fn new(max_consecutive_failures: u32) -> Self {
        Self {
            max_consecutive_failures: max_consecutive_failures.max(1),
            consecutive_failures: 0,
            halted: false,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn on_frame<B: GraphicsBackend, S: FrameScheduler + ?Sized>(
        &mut self,
        session: &mut RenderSession<B>,
        backend: &mut B,
        scheduler: &S,
        timestamp_millis: f64,
    ) -> Result<FrameOutcome, RenderError> {
        if self.halted || session.is_detached() {
            return Ok(FrameOutcome::Suppressed);
        }

        let time = animation_time(timestamp_millis, session.duration());
        trace!("Frame at {:.1}ms, animation time {:.3}s", timestamp_millis, time);

        match session.render_frame(backend, time) {
            Ok(()) => {
                self.consecutive_failures = 0;
                scheduler.request_frame();
                Ok(FrameOutcome::Drawn { time })
            }
            Err(error) if error.is_transient() => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.max_consecutive_failures {
                    error!(
                        "Giving up after {} failed frames in a row: {}",
                        self.consecutive_failures, error
                    );
                    self.halted = true;
                    return Err(error);
                }
                warn!("Skipped frame: {}", error);
                scheduler.request_frame();
                Ok(FrameOutcome::Skipped { time })
            }
            Err(error) => {
                error!("Frame failed: {}", error);
                self.halted = true;
                Err(error)
            }
        }
    }
}
