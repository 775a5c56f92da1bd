use std::time::{Duration, Instant};

use tracing::debug;

use crate::movement::AvatarMotion;

/// Keeps the local walk cycle alive when frame callbacks stall.
#[derive(Debug, Clone)]
pub struct LocalWalkWatchdog {
    stall: Duration,
    last_toggle_at: Option<Instant>,
}

impl LocalWalkWatchdog {
    pub fn new(stall: Duration) -> Self {
        Self {
            stall,
            last_toggle_at: None,
        }
    }

    pub fn note_toggle(&mut self, now: Instant) {
        self.last_toggle_at = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_toggle_at = None;
    }

    /// Forces a walk-frame toggle if the avatar is moving and the frame has
    /// not changed for the stall window. Returns whether it intervened.
    pub fn check(&mut self, motion: &mut AvatarMotion, now: Instant) -> bool {
        if !motion.is_moving {
            self.last_toggle_at = None;
            return false;
        }
        let Some(last) = self.last_toggle_at else {
            self.last_toggle_at = Some(now);
            return false;
        };
        if now.saturating_duration_since(last) < self.stall {
            return false;
        }
        motion.toggle_walk_frame();
        self.last_toggle_at = Some(now);
        debug!(walk_frame = ?motion.walk_frame, "walk_frame_forced");
        true
    }
}
