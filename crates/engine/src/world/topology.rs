use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{Insets, Rect, Size, Vec2};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconId(pub String);

impl fmt::Display for IconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum IconKind {
    /// Opens a program panel.
    Program(String),
    /// Moves the avatar to another room.
    Portal(String),
    Notice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub id: IconId,
    pub position: Vec2,
    pub kind: IconKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl WorldBounds {
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(0.0, self.width.max(0.0)),
            point.y.clamp(0.0, self.height.max(0.0)),
        )
    }

    /// Clamps the origin of a `size`-sized rectangle so it lies inside the
    /// world minus `margin`. Rectangles larger than the usable area are pinned
    /// to the top-left of it.
    pub fn clamp_rect_origin(&self, origin: Vec2, size: Size, margin: Insets) -> Vec2 {
        let min_x = margin.left;
        let min_y = margin.top;
        let max_x = (self.width - margin.right - size.width).max(min_x);
        let max_y = (self.height - margin.bottom - size.height).max(min_y);
        Vec2::new(origin.x.clamp(min_x, max_x), origin.y.clamp(min_y, max_y))
    }

    pub fn usable_rect(&self, margin: Insets) -> Rect {
        self.rect().inset(margin)
    }
}

/// Static description of the movable surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    bounds: WorldBounds,
    icons: Vec<Icon>,
}

impl Topology {
    pub fn new(bounds: WorldBounds, icons: Vec<Icon>) -> Self {
        Self { bounds, icons }
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Icons in the order they were supplied; proximity lookups rely on it.
    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn icon(&self, id: &IconId) -> Option<&Icon> {
        self.icons.iter().find(|icon| &icon.id == id)
    }
}
