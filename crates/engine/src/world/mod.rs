mod geometry;
mod topology;
mod windows;

pub use geometry::{Insets, Rect, Size, Vec2};
pub use topology::{Icon, IconId, IconKind, Topology, WorldBounds};
pub use windows::{AvatarId, WindowId, WindowLimits, WindowObject, WindowRegistry, WindowTable};
