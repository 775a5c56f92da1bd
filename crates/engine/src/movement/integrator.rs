use std::time::Duration;

use crate::config::{CollisionConfig, MovementConfig};
use crate::world::{Vec2, WindowId, WindowObject, WorldBounds};

use super::collision::CollisionResolver;
use super::input::{ActionStates, InputAction};
use super::motion::{AvatarMotion, Facing, MoveDirection};

/// Everything one integration step reads besides the avatar itself.
pub struct FrameContext<'a> {
    pub bounds: WorldBounds,
    pub windows: &'a [WindowObject],
    pub grabbed: Option<WindowId>,
    pub movement: &'a MovementConfig,
    pub collision: &'a CollisionConfig,
    pub walk_frame_interval: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub position_changed: bool,
    pub started_moving: bool,
    pub stopped_moving: bool,
    pub facing_changed: bool,
    pub walk_toggled: bool,
}

fn axis(held: &ActionStates, negative: InputAction, positive: InputAction) -> i8 {
    i8::from(held.is_down(positive)) - i8::from(held.is_down(negative))
}

/// Advances `motion` by one frame of `dt` given the held keys.
///
/// Axes are resolved independently (x first), so a blocked axis never
/// prevents sliding along the other. Diagonals are not normalised.
pub fn integrate(
    motion: &mut AvatarMotion,
    held: &ActionStates,
    dt: Duration,
    ctx: &FrameContext<'_>,
) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    let was_moving = motion.is_moving;
    let horizontal = axis(held, InputAction::MoveLeft, InputAction::MoveRight);
    let vertical = axis(held, InputAction::MoveUp, InputAction::MoveDown);

    if motion.is_sitting {
        let facing = match horizontal {
            h if h < 0 => Some(Facing::Left),
            h if h > 0 => Some(Facing::Right),
            _ => None,
        };
        if let Some(facing) = facing {
            outcome.facing_changed = facing != motion.facing;
            motion.facing = facing;
        }
        motion.direction = None;
        motion.is_moving = false;
        if was_moving {
            motion.reset_walk_cycle();
            outcome.stopped_moving = true;
        }
        return outcome;
    }

    let clamped_dt = dt.min(ctx.movement.max_frame_delta());
    let step = ctx.movement.base_speed * motion.speed_multiplier * clamped_dt.as_secs_f32();
    let resolver = CollisionResolver::new(ctx.windows, ctx.grabbed, ctx.collision);

    let start = motion.position;
    let mut position = start;
    if horizontal != 0 {
        let candidate = Vec2::new(position.x + f32::from(horizontal) * step, position.y);
        if !resolver.blocked(position, candidate) {
            position = candidate;
        }
    }
    if vertical != 0 {
        let candidate = Vec2::new(position.x, position.y + f32::from(vertical) * step);
        if !resolver.blocked(position, candidate) {
            position = candidate;
        }
    }
    let position = ctx.bounds.clamp_point(position);

    let moved_x = position.x - start.x;
    if ctx.grabbed.is_none() && moved_x != 0.0 {
        let facing = if moved_x < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        };
        outcome.facing_changed = facing != motion.facing;
        motion.facing = facing;
    }

    outcome.position_changed = position != start;
    motion.position = position;
    motion.is_moving = held.any_movement();
    motion.direction = MoveDirection::from_axes(horizontal, vertical);

    if motion.is_moving {
        outcome.started_moving = !was_moving;
        // The walk cycle runs on wall time; only displacement is clamped.
        motion.walk_elapsed += dt;
        if motion.walk_elapsed >= ctx.walk_frame_interval {
            motion.toggle_walk_frame();
            outcome.walk_toggled = true;
        }
    } else if was_moving {
        motion.reset_walk_cycle();
        outcome.stopped_moving = true;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::motion::WalkFrame;
    use crate::world::Size;

    struct Fixture {
        movement: MovementConfig,
        collision: CollisionConfig,
        windows: Vec<WindowObject>,
        grabbed: Option<WindowId>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                movement: MovementConfig {
                    base_speed: 100.0,
                    ..MovementConfig::default()
                },
                collision: CollisionConfig::default(),
                windows: Vec::new(),
                grabbed: None,
            }
        }

        fn ctx(&self) -> FrameContext<'_> {
            FrameContext {
                bounds: WorldBounds {
                    width: 1000.0,
                    height: 1000.0,
                },
                windows: &self.windows,
                grabbed: self.grabbed,
                movement: &self.movement,
                collision: &self.collision,
                walk_frame_interval: Duration::from_millis(60),
            }
        }
    }

    fn held(actions: &[InputAction]) -> ActionStates {
        actions
            .iter()
            .fold(ActionStates::default(), |states, action| states.with(*action))
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() <= 1e-3,
            "{actual} vs {expected}"
        );
    }

    #[test]
    fn displacement_scales_with_dt_and_multiplier() {
        let fixture = Fixture::new();
        let keys = held(&[InputAction::MoveRight]);

        let mut motion = AvatarMotion::at(Vec2::new(100.0, 100.0));
        integrate(&mut motion, &keys, Duration::from_millis(20), &fixture.ctx());
        assert_close(motion.position.x, 102.0);

        let mut motion = AvatarMotion::at(Vec2::new(100.0, 100.0));
        motion.speed_multiplier = 2.5;
        integrate(&mut motion, &keys, Duration::from_millis(40), &fixture.ctx());
        assert_close(motion.position.x, 110.0);
    }

    #[test]
    fn long_frames_use_the_clamp_not_the_raw_delta() {
        let fixture = Fixture::new();
        let keys = held(&[InputAction::MoveDown]);
        let mut motion = AvatarMotion::at(Vec2::new(100.0, 100.0));
        integrate(&mut motion, &keys, Duration::from_secs(3), &fixture.ctx());
        assert_close(motion.position.y, 105.0);
    }

    #[test]
    fn diagonals_are_not_normalised() {
        let fixture = Fixture::new();
        let keys = held(&[InputAction::MoveUp, InputAction::MoveLeft]);
        let mut motion = AvatarMotion::at(Vec2::new(100.0, 100.0));
        integrate(&mut motion, &keys, Duration::from_millis(50), &fixture.ctx());
        assert_close(motion.position.x, 95.0);
        assert_close(motion.position.y, 95.0);
        assert_eq!(motion.direction, Some(MoveDirection::UpLeft));
    }

    #[test]
    fn blocked_axis_does_not_stop_the_free_axis() {
        let mut fixture = Fixture::new();
        // Blocking rect (110,30)-(310,230): directly right of the avatar.
        fixture.windows.push(WindowObject::new(
            WindowId(1),
            Vec2::new(100.0, 0.0),
            Size::new(220.0, 240.0),
        ));
        let keys = held(&[InputAction::MoveRight, InputAction::MoveDown]);
        let mut motion = AvatarMotion::at(Vec2::new(108.0, 100.0));
        let outcome = integrate(&mut motion, &keys, Duration::from_millis(50), &fixture.ctx());

        assert_close(motion.position.x, 108.0);
        assert_close(motion.position.y, 105.0);
        assert!(outcome.position_changed);
        assert_eq!(motion.direction, Some(MoveDirection::DownRight));
    }

    #[test]
    fn grabbed_window_does_not_block_and_facing_is_frozen() {
        let mut fixture = Fixture::new();
        fixture.windows.push(WindowObject::new(
            WindowId(1),
            Vec2::new(0.0, 0.0),
            Size::new(400.0, 400.0),
        ));
        fixture.grabbed = Some(WindowId(1));
        let keys = held(&[InputAction::MoveLeft]);
        let mut motion = AvatarMotion::at(Vec2::new(200.0, 200.0));
        motion.facing = Facing::Right;
        integrate(&mut motion, &keys, Duration::from_millis(50), &fixture.ctx());

        assert_close(motion.position.x, 195.0);
        assert_eq!(motion.facing, Facing::Right);
    }

    #[test]
    fn facing_follows_actual_horizontal_movement() {
        let fixture = Fixture::new();
        let keys = held(&[InputAction::MoveLeft]);
        let mut motion = AvatarMotion::at(Vec2::new(0.0, 100.0));
        let outcome = integrate(&mut motion, &keys, Duration::from_millis(50), &fixture.ctx());
        // Pinned against the left bound: no actual movement, facing unchanged.
        assert_eq!(motion.facing, Facing::Right);
        assert!(!outcome.facing_changed);

        let mut motion = AvatarMotion::at(Vec2::new(50.0, 100.0));
        let outcome = integrate(&mut motion, &keys, Duration::from_millis(50), &fixture.ctx());
        assert_eq!(motion.facing, Facing::Left);
        assert!(outcome.facing_changed);
    }

    #[test]
    fn position_is_clamped_to_world_bounds() {
        let fixture = Fixture::new();
        let keys = held(&[InputAction::MoveRight, InputAction::MoveDown]);
        let mut motion = AvatarMotion::at(Vec2::new(998.0, 999.0));
        integrate(&mut motion, &keys, Duration::from_millis(50), &fixture.ctx());
        assert_eq!(motion.position, Vec2::new(1000.0, 1000.0));
    }

    #[test]
    fn sitting_blocks_translation_but_not_facing() {
        let fixture = Fixture::new();
        let keys = held(&[InputAction::MoveLeft, InputAction::MoveUp]);
        let mut motion = AvatarMotion::at(Vec2::new(100.0, 100.0));
        motion.is_sitting = true;
        let outcome = integrate(&mut motion, &keys, Duration::from_millis(50), &fixture.ctx());

        assert_eq!(motion.position, Vec2::new(100.0, 100.0));
        assert!(!motion.is_moving);
        assert_eq!(motion.facing, Facing::Left);
        assert!(outcome.facing_changed);
    }

    #[test]
    fn walk_frame_alternates_every_interval_and_resets_on_stop() {
        let fixture = Fixture::new();
        let keys = held(&[InputAction::MoveRight]);
        let mut motion = AvatarMotion::at(Vec2::new(100.0, 100.0));
        let frame = Duration::from_millis(60);

        let outcome = integrate(&mut motion, &keys, frame, &fixture.ctx());
        assert!(outcome.started_moving);
        assert_eq!(motion.walk_frame, WalkFrame::Two);
        integrate(&mut motion, &keys, frame, &fixture.ctx());
        assert_eq!(motion.walk_frame, WalkFrame::One);
        integrate(&mut motion, &keys, frame, &fixture.ctx());
        assert_eq!(motion.walk_frame, WalkFrame::Two);

        let outcome = integrate(&mut motion, &ActionStates::default(), frame, &fixture.ctx());
        assert!(outcome.stopped_moving);
        assert!(!motion.is_moving);
        assert_eq!(motion.walk_frame, WalkFrame::One);
        assert_eq!(motion.direction, None);
    }
}
