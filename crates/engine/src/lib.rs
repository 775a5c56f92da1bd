//! Client-side movement, collision and interaction for avatars moving across
//! a shared desktop of windows and icons.

pub mod config;
pub mod movement;
pub mod net;
pub mod runtime;
pub mod world;

pub use config::{
    AnimationConfig, CollisionConfig, ConfigError, EngineConfig, MovementConfig, NetworkConfig,
    ProximityConfig, WatchdogConfig,
};
pub use movement::{
    ActionStates, AvatarMotion, Facing, GrabState, InputAction, KeyBinding, KeyBindings,
    MoveDirection, WalkFrame,
};
pub use net::{MotionUpdate, RemoteAvatar, RemoteAvatars, Transport};
pub use runtime::{
    FrameHost, FrameRequestId, ManualFrameHost, MovementEngine, OpenIntent, TimerId, TimerKind,
};
pub use winit::keyboard::KeyCode;
pub use world::{
    AvatarId, Icon, IconId, IconKind, Insets, Rect, Size, Topology, Vec2, WindowId, WindowLimits,
    WindowObject, WindowRegistry, WindowTable, WorldBounds,
};
