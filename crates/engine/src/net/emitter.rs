use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::movement::{AvatarMotion, Facing, GrabController, MoveDirection, WalkFrame};
use crate::world::Vec2;

/// Movement state published to peers, one message per emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionUpdate {
    pub position: Vec2,
    pub is_moving: bool,
    pub movement_direction: Option<MoveDirection>,
    pub walk_frame: WalkFrame,
    pub facing_direction: Facing,
    pub is_grabbing: bool,
    pub is_resizing: bool,
    pub is_sitting: bool,
    pub vehicle: Option<String>,
    pub speed_multiplier: f32,
}

impl MotionUpdate {
    pub fn capture(motion: &AvatarMotion, grab: &GrabController) -> Self {
        Self {
            position: motion.position,
            is_moving: motion.is_moving,
            movement_direction: motion.direction,
            walk_frame: motion.walk_frame,
            facing_direction: motion.facing,
            is_grabbing: grab.is_grabbing(),
            is_resizing: grab.is_resizing(),
            is_sitting: motion.is_sitting,
            vehicle: motion.vehicle.clone(),
            speed_multiplier: motion.speed_multiplier,
        }
    }

    pub fn to_wire_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Outbound side of the network channel. Fire-and-forget: nothing is
/// acknowledged and failures stay inside the transport.
pub trait Transport {
    fn send(&mut self, update: &MotionUpdate);
}

impl Transport for Vec<MotionUpdate> {
    fn send(&mut self, update: &MotionUpdate) {
        self.push(update.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Steady-state movement; subject to the minimum send interval.
    Throttled,
    /// State edges remote renderers must not miss.
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    Sent,
    Deferred,
}

#[derive(Debug, Clone)]
pub struct Emitter {
    min_interval: Duration,
    last_sent_at: Option<Instant>,
    pending: Option<MotionUpdate>,
    sent: u64,
}

impl Emitter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent_at: None,
            pending: None,
            sent: 0,
        }
    }

    pub fn offer<T: Transport + ?Sized>(
        &mut self,
        update: MotionUpdate,
        urgency: Urgency,
        now: Instant,
        transport: &mut T,
    ) -> EmitOutcome {
        if urgency == Urgency::Throttled && !self.window_closed(now) {
            trace!("motion_update_deferred");
            self.pending = Some(update);
            return EmitOutcome::Deferred;
        }
        self.send(&update, now, transport);
        EmitOutcome::Sent
    }

    /// Sends the latest deferred update once the throttle window has closed.
    pub fn flush_due<T: Transport + ?Sized>(&mut self, now: Instant, transport: &mut T) -> bool {
        if !self.window_closed(now) {
            return false;
        }
        match self.pending.take() {
            Some(update) => {
                self.send(&update, now, transport);
                true
            }
            None => false,
        }
    }

    /// When the pending update, if any, may go out.
    pub fn next_flush_at(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_sent_at.map(|last| last + self.min_interval)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn sent_count(&self) -> u64 {
        self.sent
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    fn window_closed(&self, now: Instant) -> bool {
        self.last_sent_at
            .map_or(true, |last| now.saturating_duration_since(last) >= self.min_interval)
    }

    fn send<T: Transport + ?Sized>(&mut self, update: &MotionUpdate, now: Instant, transport: &mut T) {
        transport.send(update);
        self.last_sent_at = Some(now);
        self.pending = None;
        self.sent = self.sent.saturating_add(1);
    }
}
