mod collision;
mod grab;
mod input;
mod integrator;
mod motion;
mod proximity;

pub use collision::{blocking_rect, CollisionResolver};
pub use grab::{
    resized_rect, GrabController, GrabSession, GrabState, GrabTransition, HorizontalSide,
    ResizeSession, VerticalSide,
};
pub use input::{ActionStates, InputAction, KeyBinding, KeyBindings};
pub use integrator::{integrate, FrameContext, StepOutcome};
pub use motion::{AvatarMotion, Facing, MoveDirection, WalkFrame};
pub use proximity::{nearby_icon, nearby_window};
