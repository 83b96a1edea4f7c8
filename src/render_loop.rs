//! The per-frame draw schedule.
//!
//! A running loop always holds exactly one pending [`FrameToken`]. When the
//! host delivers that token the loop requests the next one and tells the
//! caller to draw. Any other token is stale and ignored, which is what makes
//! [`LoopHandle::stop`] final: once it returns, no frame event can lead to a
//! draw, even one the host had already queued.

use instant::{Duration, Instant};

use crate::host::{FrameToken, Host};

#[derive(Debug)]
pub struct LoopHandle {
    pending: Option<FrameToken>,
    running: bool,
    frames: u64,
    last_time: Option<Instant>,
}

impl LoopHandle {
    pub fn start(host: &mut dyn Host) -> Self {
        let pending = host.request_frame();
        log::debug!("render loop started, first frame {:?}", pending);
        Self {
            pending: Some(pending),
            running: true,
            frames: 0,
            last_time: None,
        }
    }

    /// Handle a delivered frame. Returns the time since the previous drawn
    /// frame when this frame should be drawn, `None` for stale tokens.
    ///
    /// The next frame is requested before the caller draws, so a failing draw
    /// does not stop the loop.
    pub fn accept(&mut self, token: FrameToken, host: &mut dyn Host) -> Option<Duration> {
        if !self.running || self.pending != Some(token) {
            log::trace!("ignoring stale frame {:?}", token);
            return None;
        }
        self.pending = Some(host.request_frame());
        let now = Instant::now();
        let dt = self
            .last_time
            .map(|last| now.duration_since(last))
            .unwrap_or(Duration::from_millis(0));
        self.last_time = Some(now);
        self.frames += 1;
        Some(dt)
    }

    /// Cancel the pending frame. Safe to call repeatedly.
    pub fn stop(&mut self, host: &mut dyn Host) {
        if let Some(token) = self.pending.take() {
            host.cancel_frame(token);
            log::debug!("render loop stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames accepted for drawing since `start`.
    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }
}
