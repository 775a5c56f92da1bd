use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};
use winit::keyboard::KeyCode;

use crate::config::{ConfigError, EngineConfig};
use crate::movement::{
    integrate, nearby_icon, nearby_window, ActionStates, AvatarMotion, FrameContext,
    GrabController, GrabState, GrabTransition, InputAction, WalkFrame,
};
use crate::net::{
    EmitOutcome, Emitter, FallbackTiming, MotionUpdate, RemoteAvatars, Transport, Urgency,
};
use crate::world::{AvatarId, Icon, IconId, IconKind, Topology, Vec2, WindowId, WindowRegistry};

use super::host::{FrameHost, FrameRequestId, TimerId, TimerKind};
use super::watchdog::LocalWalkWatchdog;

/// Request to open whatever an icon points at, handed to the program
/// manager.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenIntent {
    pub icon: IconId,
    pub kind: IconKind,
    pub spawn_position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Stopped,
    Running,
}

#[derive(Debug, Default)]
struct EngineTimers {
    local_watchdog: Option<TimerId>,
    remote_sweep: Option<TimerId>,
    throttle_flush: Option<TimerId>,
}

/// Movement and interaction engine for one locally controlled avatar.
///
/// All mutable state lives here; the window registry is passed in by the
/// caller on every call that needs it, since it is shared with the rest of
/// the client.
pub struct MovementEngine<H: FrameHost, T: Transport> {
    avatar: AvatarId,
    config: EngineConfig,
    topology: Topology,
    host: H,
    transport: T,
    lifecycle: Lifecycle,
    pressed_keys: HashSet<KeyCode>,
    held: ActionStates,
    text_entry_focused: bool,
    motion: AvatarMotion,
    grab: GrabController,
    emitter: Emitter,
    walk_watchdog: LocalWalkWatchdog,
    remotes: RemoteAvatars,
    pending_frame: Option<FrameRequestId>,
    last_frame_at: Option<Instant>,
    timers: EngineTimers,
}

impl<H: FrameHost, T: Transport> MovementEngine<H, T> {
    pub fn new(
        avatar: AvatarId,
        config: EngineConfig,
        topology: Topology,
        spawn: Vec2,
        host: H,
        transport: T,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let motion = AvatarMotion::at(topology.bounds().clamp_point(spawn));
        let emitter = Emitter::new(config.network.min_send_interval());
        let walk_watchdog = LocalWalkWatchdog::new(config.watchdog.local_stall());
        Ok(Self {
            avatar,
            config,
            topology,
            host,
            transport,
            lifecycle: Lifecycle::Stopped,
            pressed_keys: HashSet::new(),
            held: ActionStates::default(),
            text_entry_focused: false,
            motion,
            grab: GrabController::new(avatar),
            emitter,
            walk_watchdog,
            remotes: RemoteAvatars::default(),
            pending_frame: None,
            last_frame_at: None,
            timers: EngineTimers::default(),
        })
    }

    /// Arms the watchdog timers and announces the initial state.
    pub fn start(&mut self, now: Instant) {
        if self.lifecycle == Lifecycle::Running {
            return;
        }
        self.lifecycle = Lifecycle::Running;
        let watchdog = &self.config.watchdog;
        self.timers.local_watchdog = Some(self.host.set_timer(
            TimerKind::LocalWatchdog,
            watchdog.local_check_interval(),
            true,
        ));
        self.timers.remote_sweep = Some(self.host.set_timer(
            TimerKind::RemoteSweep,
            watchdog.remote_sweep_interval(),
            true,
        ));
        info!(
            avatar = %self.avatar,
            x = self.motion.position.x,
            y = self.motion.position.y,
            "engine_started"
        );
        self.publish(Urgency::Immediate, now);
    }

    /// Cancels the pending frame and every timer, lets go of any grabbed
    /// window and leaves the avatar idle. Nothing mutates engine state after
    /// this returns.
    pub fn stop<R: WindowRegistry + ?Sized>(&mut self, windows: &mut R) {
        if self.lifecycle == Lifecycle::Stopped {
            return;
        }
        self.grab.release(windows);
        self.cancel_scheduled();
        self.pressed_keys.clear();
        self.held.clear();
        self.motion.is_moving = false;
        self.motion.direction = None;
        self.motion.reset_walk_cycle();
        self.emitter.clear_pending();
        self.walk_watchdog.reset();
        self.last_frame_at = None;
        self.lifecycle = Lifecycle::Stopped;
        info!(avatar = %self.avatar, "engine_stopped");
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    /// Physical key input. An action stays down while any key bound to it is
    /// still held, so releasing `ArrowRight` with `KeyD` down keeps walking.
    pub fn key_event<R: WindowRegistry + ?Sized>(
        &mut self,
        key: KeyCode,
        pressed: bool,
        now: Instant,
        windows: &mut R,
    ) -> Option<OpenIntent> {
        if self.lifecycle != Lifecycle::Running || self.text_entry_focused {
            return None;
        }
        let action = self.config.keys.action_for(key)?;
        if pressed {
            self.pressed_keys.insert(key);
        } else {
            self.pressed_keys.remove(&key);
        }
        let down = pressed || self.is_bound_key_held(action);
        self.action_event(action, down, now, windows)
    }

    /// Scripted or remapped input, bypassing the key bindings. Repeated
    /// presses and releases of an action already in that state are ignored.
    pub fn action_event<R: WindowRegistry + ?Sized>(
        &mut self,
        action: InputAction,
        pressed: bool,
        now: Instant,
        windows: &mut R,
    ) -> Option<OpenIntent> {
        if self.lifecycle != Lifecycle::Running || self.text_entry_focused {
            return None;
        }
        if !self.held.set(action, pressed) {
            return None;
        }

        if action.is_movement() {
            // Releases schedule a frame too, so the final idle state is
            // integrated and published.
            self.ensure_frame(now);
            return None;
        }
        match action {
            InputAction::Grab => {
                let transition = if pressed {
                    let center = self.avatar_center();
                    self.grab
                        .start_grab(center, self.config.proximity.grab_radius, windows)
                } else {
                    self.grab.release(windows)
                };
                self.on_grab_transition(transition, now);
                None
            }
            InputAction::ResizeModifier => {
                let transition = if pressed {
                    let center = self.avatar_center();
                    self.grab.start_resize(center, &*windows)
                } else {
                    self.grab.stop_resize()
                };
                self.on_grab_transition(transition, now);
                None
            }
            InputAction::Interact => {
                if pressed {
                    self.interact()
                } else {
                    None
                }
            }
            InputAction::SitToggle => {
                if pressed {
                    self.toggle_sit(now);
                }
                None
            }
            InputAction::MoveUp
            | InputAction::MoveDown
            | InputAction::MoveLeft
            | InputAction::MoveRight => None,
        }
    }

    /// Runs one integration step. Order within the frame is fixed: axis
    /// resolution and collision, grab/resize delegation, then emission.
    pub fn on_frame<R: WindowRegistry + ?Sized>(&mut self, now: Instant, windows: &mut R) {
        self.pending_frame = None;
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        let dt = self
            .last_frame_at
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_frame_at = Some(now);

        let outcome = {
            let ctx = FrameContext {
                bounds: self.topology.bounds(),
                windows: windows.windows(),
                grabbed: self.grab.grabbed_window(),
                movement: &self.config.movement,
                collision: &self.config.collision,
                walk_frame_interval: self.config.animation.walk_frame_interval(),
            };
            integrate(&mut self.motion, &self.held, dt, &ctx)
        };
        if outcome.walk_toggled || outcome.started_moving {
            self.walk_watchdog.note_toggle(now);
        }
        if outcome.stopped_moving {
            self.walk_watchdog.reset();
        }

        if self.grab.is_grabbing() {
            let center = self.avatar_center();
            let vanished = self.grab.apply(
                center,
                self.topology.bounds(),
                &self.config.windows,
                windows,
            );
            self.on_grab_transition(vanished, now);
        }

        if outcome.stopped_moving || (self.motion.is_sitting && outcome.facing_changed) {
            self.publish(Urgency::Immediate, now);
        } else if self.motion.is_moving {
            self.publish(Urgency::Throttled, now);
        }

        if self.held.any_movement() {
            self.ensure_frame(now);
        } else {
            self.last_frame_at = None;
        }
    }

    pub fn on_timer(&mut self, id: TimerId, now: Instant) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        if self.timers.local_watchdog == Some(id) {
            if self.walk_watchdog.check(&mut self.motion, now) {
                self.publish(Urgency::Throttled, now);
            }
        } else if self.timers.remote_sweep == Some(id) {
            let corrected = self
                .remotes
                .sweep_stale(now, self.config.watchdog.remote_stale());
            if !corrected.is_empty() {
                debug!(count = corrected.len(), "remote_sweep_corrected");
            }
        } else if self.timers.throttle_flush == Some(id) {
            self.timers.throttle_flush = None;
            self.emitter.flush_due(now, &mut self.transport);
            self.arm_throttle_flush(now);
        } else {
            debug!(timer = id.0, "unknown_timer_ignored");
        }
    }

    /// Icon within interaction range, if any.
    pub fn nearby_icon(&self) -> Option<&Icon> {
        nearby_icon(
            self.avatar_center(),
            self.topology.icons(),
            self.config.proximity.icon_radius,
        )
    }

    /// Window a grab would pick up right now.
    pub fn grab_candidate<R: WindowRegistry + ?Sized>(&self, windows: &R) -> Option<WindowId> {
        if self.grab.is_grabbing() {
            return None;
        }
        nearby_window(
            self.avatar_center(),
            windows.windows(),
            self.config.proximity.grab_radius,
            self.avatar,
        )
    }

    pub fn interact(&self) -> Option<OpenIntent> {
        let icon = self.nearby_icon()?;
        let spawn_position = self
            .topology
            .bounds()
            .clamp_point(self.motion.position.add(self.config.proximity.spawn_offset));
        info!(icon = %icon.id, "open_intent");
        Some(OpenIntent {
            icon: icon.id.clone(),
            kind: icon.kind.clone(),
            spawn_position,
        })
    }

    /// Sitting is refused while carrying a window.
    pub fn toggle_sit(&mut self, now: Instant) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        if self.grab.is_grabbing() {
            debug!("sit_refused_while_grabbing");
            return;
        }
        self.motion.is_sitting = !self.motion.is_sitting;
        if self.motion.is_sitting && self.motion.is_moving {
            self.motion.is_moving = false;
            self.motion.direction = None;
            self.motion.reset_walk_cycle();
            self.walk_watchdog.reset();
        }
        info!(sitting = self.motion.is_sitting, "sit_toggled");
        self.publish(Urgency::Immediate, now);
        if !self.motion.is_sitting && self.held.any_movement() {
            self.ensure_frame(now);
        }
    }

    pub fn set_vehicle(&mut self, vehicle: Option<String>, speed_multiplier: f32, now: Instant) {
        if !(speed_multiplier.is_finite() && speed_multiplier > 0.0) {
            warn!(speed_multiplier, "vehicle_multiplier_rejected");
            return;
        }
        self.motion.vehicle = vehicle;
        self.motion.speed_multiplier = speed_multiplier;
        info!(
            vehicle = self.motion.vehicle.as_deref().unwrap_or("none"),
            speed_multiplier,
            "vehicle_changed"
        );
        if self.lifecycle == Lifecycle::Running {
            self.publish(Urgency::Immediate, now);
        }
    }

    /// Server-side correction or spawn into a new location.
    pub fn teleport(&mut self, position: Vec2, now: Instant) {
        self.motion.position = self.topology.bounds().clamp_point(position);
        if self.lifecycle == Lifecycle::Running {
            self.publish(Urgency::Immediate, now);
        }
    }

    /// While a text field has focus every key event is ignored. Gaining focus
    /// releases whatever was held so nothing stays stuck down.
    pub fn set_text_entry_focused<R: WindowRegistry + ?Sized>(
        &mut self,
        focused: bool,
        now: Instant,
        windows: &mut R,
    ) {
        if focused && !self.text_entry_focused {
            let held = self.held;
            for action in [
                InputAction::MoveUp,
                InputAction::MoveDown,
                InputAction::MoveLeft,
                InputAction::MoveRight,
                InputAction::ResizeModifier,
                InputAction::Grab,
            ] {
                if held.is_down(action) {
                    self.action_event(action, false, now, windows);
                }
            }
            self.held.clear();
            self.pressed_keys.clear();
        }
        self.text_entry_focused = focused;
    }

    pub fn receive_remote(&mut self, peer: AvatarId, update: MotionUpdate, now: Instant) {
        if peer == self.avatar {
            return;
        }
        self.remotes.receive(peer, update, now);
    }

    pub fn remove_remote(&mut self, peer: AvatarId) {
        self.remotes.remove(peer);
    }

    /// Walk frame to draw for a peer, including the local fallback cycle.
    pub fn remote_walk_frame(&mut self, peer: AvatarId, now: Instant) -> Option<WalkFrame> {
        let timing = FallbackTiming {
            after: self.config.watchdog.fallback_after(),
            max: self.config.watchdog.fallback_max(),
            frame_interval: self.config.animation.walk_frame_interval(),
        };
        self.remotes
            .get_mut(peer)
            .map(|avatar| avatar.display_walk_frame(now, &timing))
    }

    pub fn avatar_id(&self) -> AvatarId {
        self.avatar
    }

    pub fn motion(&self) -> &AvatarMotion {
        &self.motion
    }

    /// Current state in wire form, whether or not it has been sent.
    pub fn snapshot(&self) -> MotionUpdate {
        MotionUpdate::capture(&self.motion, &self.grab)
    }

    pub fn avatar_center(&self) -> Vec2 {
        self.motion.center(self.config.movement.avatar_center_offset)
    }

    pub fn grab_state(&self) -> GrabState {
        self.grab.state()
    }

    pub fn held(&self) -> &ActionStates {
        &self.held
    }

    pub fn remotes(&self) -> &RemoteAvatars {
        &self.remotes
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pending_frame(&self) -> Option<FrameRequestId> {
        self.pending_frame
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sent_count(&self) -> u64 {
        self.emitter.sent_count()
    }

    fn is_bound_key_held(&self, action: InputAction) -> bool {
        self.pressed_keys
            .iter()
            .any(|key| self.config.keys.action_for(*key) == Some(action))
    }

    fn ensure_frame(&mut self, now: Instant) {
        if self.pending_frame.is_some() {
            return;
        }
        self.pending_frame = Some(self.host.request_frame());
        if self.last_frame_at.is_none() {
            self.last_frame_at = Some(now);
        }
    }

    fn on_grab_transition(&mut self, transition: Option<GrabTransition>, now: Instant) {
        if let Some(transition) = transition {
            debug!(transition = ?transition, "grab_transition");
            self.publish(Urgency::Immediate, now);
        }
    }

    fn publish(&mut self, urgency: Urgency, now: Instant) {
        let update = self.snapshot();
        let outcome = self.emitter.offer(update, urgency, now, &mut self.transport);
        if outcome == EmitOutcome::Deferred {
            self.arm_throttle_flush(now);
        }
    }

    fn arm_throttle_flush(&mut self, now: Instant) {
        if self.timers.throttle_flush.is_some() {
            return;
        }
        let Some(flush_at) = self.emitter.next_flush_at() else {
            return;
        };
        let delay = flush_at.saturating_duration_since(now);
        self.timers.throttle_flush =
            Some(self.host.set_timer(TimerKind::ThrottleFlush, delay, false));
    }

    fn cancel_scheduled(&mut self) {
        if let Some(frame) = self.pending_frame.take() {
            self.host.cancel_frame(frame);
        }
        for timer in [
            self.timers.local_watchdog.take(),
            self.timers.remote_sweep.take(),
            self.timers.throttle_flush.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.host.clear_timer(timer);
        }
    }
}

impl<H: FrameHost, T: Transport> Drop for MovementEngine<H, T> {
    fn drop(&mut self) {
        if self.lifecycle == Lifecycle::Running {
            warn!(avatar = %self.avatar, "engine_dropped_without_stop");
            self.cancel_scheduled();
        }
    }
}

#[cfg(test)]
mod tests {
    include!("engine_tests.rs");
}
