use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::movement::WalkFrame;
use crate::world::AvatarId;

use super::emitter::MotionUpdate;

/// Timing of the locally driven walk cycle used while a peer's own walk
/// frames stop arriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackTiming {
    pub after: Duration,
    pub max: Duration,
    pub frame_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    Idle,
    Active { started_at: Instant },
    /// Ran for its full duration; stays off until the peer's frame changes.
    Spent,
}

#[derive(Debug, Clone)]
pub struct RemoteAvatar {
    snapshot: MotionUpdate,
    received_at: Instant,
    frame_changed_at: Instant,
    fallback: Fallback,
}

impl RemoteAvatar {
    fn new(snapshot: MotionUpdate, now: Instant) -> Self {
        Self {
            snapshot,
            received_at: now,
            frame_changed_at: now,
            fallback: Fallback::Idle,
        }
    }

    pub fn snapshot(&self) -> &MotionUpdate {
        &self.snapshot
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    pub fn fallback_active(&self) -> bool {
        matches!(self.fallback, Fallback::Active { .. })
    }

    /// Walk frame to render at `now`.
    ///
    /// Normally the peer's own frame. If the peer is moving but its frame has
    /// not changed for `timing.after`, a local alternating frame takes over
    /// for at most `timing.max`, then control returns to the peer's frame.
    pub fn display_walk_frame(&mut self, now: Instant, timing: &FallbackTiming) -> WalkFrame {
        let authoritative = self.snapshot.walk_frame;
        if !self.snapshot.is_moving {
            self.fallback = Fallback::Idle;
            return authoritative;
        }
        let stalled_for = now.saturating_duration_since(self.frame_changed_at);
        if stalled_for < timing.after {
            return authoritative;
        }

        let started_at = match self.fallback {
            Fallback::Spent => return authoritative,
            Fallback::Active { started_at } => started_at,
            Fallback::Idle => {
                self.fallback = Fallback::Active { started_at: now };
                now
            }
        };
        let running_for = now.saturating_duration_since(started_at);
        if running_for >= timing.max {
            self.fallback = Fallback::Spent;
            return authoritative;
        }

        let interval_ms = timing.frame_interval.as_millis().max(1);
        let phase = running_for.as_millis() / interval_ms;
        if phase % 2 == 0 {
            authoritative.toggled()
        } else {
            authoritative
        }
    }

    fn apply(&mut self, update: MotionUpdate, now: Instant) {
        let frame_changed = update.walk_frame != self.snapshot.walk_frame
            || update.is_moving != self.snapshot.is_moving;
        if frame_changed {
            self.frame_changed_at = now;
            self.fallback = Fallback::Idle;
        }
        self.snapshot = update;
        self.received_at = now;
    }

    fn force_stop(&mut self) {
        self.snapshot.is_moving = false;
        self.snapshot.movement_direction = None;
        self.snapshot.walk_frame = WalkFrame::One;
        self.fallback = Fallback::Idle;
    }
}

/// Last known state of every peer, keyed by avatar id.
#[derive(Debug, Clone, Default)]
pub struct RemoteAvatars {
    peers: BTreeMap<AvatarId, RemoteAvatar>,
}

impl RemoteAvatars {
    /// Stores a peer snapshot as-is; peer values are not validated.
    pub fn receive(&mut self, peer: AvatarId, update: MotionUpdate, now: Instant) {
        match self.peers.get_mut(&peer) {
            Some(avatar) => avatar.apply(update, now),
            None => {
                debug!(peer = %peer, "remote_avatar_joined");
                self.peers.insert(peer, RemoteAvatar::new(update, now));
            }
        }
    }

    pub fn remove(&mut self, peer: AvatarId) -> Option<RemoteAvatar> {
        let removed = self.peers.remove(&peer);
        if removed.is_some() {
            debug!(peer = %peer, "remote_avatar_left");
        }
        removed
    }

    pub fn get(&self, peer: AvatarId) -> Option<&RemoteAvatar> {
        self.peers.get(&peer)
    }

    pub fn get_mut(&mut self, peer: AvatarId) -> Option<&mut RemoteAvatar> {
        self.peers.get_mut(&peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AvatarId, &RemoteAvatar)> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Forces peers that claim to be moving but have been silent for at least
    /// `stale_after` into a stopped state. Returns the corrected ids.
    pub fn sweep_stale(&mut self, now: Instant, stale_after: Duration) -> Vec<AvatarId> {
        let mut corrected = Vec::new();
        for (peer, avatar) in &mut self.peers {
            if !avatar.snapshot.is_moving {
                continue;
            }
            let silent_for = now.saturating_duration_since(avatar.received_at);
            if silent_for >= stale_after {
                warn!(
                    peer = %peer,
                    silent_ms = silent_for.as_millis() as u64,
                    "remote_stale_forced_stop"
                );
                avatar.force_stop();
                corrected.push(*peer);
            }
        }
        corrected
    }
}
