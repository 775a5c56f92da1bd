use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::geometry::{Insets, Rect, Size, Vec2};
use super::topology::WorldBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarId(pub u64);

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "avatar#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowObject {
    pub id: WindowId,
    pub position: Vec2,
    pub size: Size,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub controller: Option<AvatarId>,
    #[serde(default)]
    pub kind: String,
    /// Program-specific payload; the engine never looks inside.
    #[serde(default)]
    pub state: serde_json::Value,
}

impl WindowObject {
    pub fn new(id: WindowId, position: Vec2, size: Size) -> Self {
        Self {
            id,
            position,
            size,
            minimized: false,
            controller: None,
            kind: String::new(),
            state: serde_json::Value::Null,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }
}

/// Size range and reserved screen margin every window must respect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowLimits {
    pub min_size: Size,
    pub max_size: Size,
    pub ui_margin: Insets,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            min_size: Size::new(160.0, 120.0),
            max_size: Size::new(1200.0, 800.0),
            ui_margin: Insets {
                top: 0.0,
                right: 0.0,
                bottom: 60.0,
                left: 0.0,
            },
        }
    }
}

impl WindowLimits {
    pub fn clamp_size(&self, size: Size) -> Size {
        Size::new(
            size.width.clamp(self.min_size.width, self.max_size.width),
            size.height.clamp(self.min_size.height, self.max_size.height),
        )
    }
}

/// Shared collection of movable windows. Reads happen every frame; writes
/// only come from the avatar holding a grab on the window.
pub trait WindowRegistry {
    fn windows(&self) -> &[WindowObject];

    fn update_position(&mut self, id: WindowId, position: Vec2) -> bool;

    fn update_size(&mut self, id: WindowId, size: Size) -> bool;

    fn set_controller(&mut self, id: WindowId, controller: Option<AvatarId>) -> bool;

    fn window(&self, id: WindowId) -> Option<&WindowObject> {
        self.windows().iter().find(|window| window.id == id)
    }
}

/// In-memory registry that keeps every window inside the usable world area.
#[derive(Debug, Clone, Default)]
pub struct WindowTable {
    bounds: WorldBounds,
    limits: WindowLimits,
    windows: Vec<WindowObject>,
}

impl WindowTable {
    pub fn new(bounds: WorldBounds, limits: WindowLimits) -> Self {
        Self {
            bounds,
            limits,
            windows: Vec::new(),
        }
    }

    /// Inserts or replaces a window, normalising its rectangle first.
    pub fn upsert(&mut self, mut window: WindowObject) {
        window.size = self.limits.clamp_size(window.size);
        window.position =
            self.bounds
                .clamp_rect_origin(window.position, window.size, self.limits.ui_margin);
        match self.windows.iter_mut().find(|existing| existing.id == window.id) {
            Some(existing) => *existing = window,
            None => self.windows.push(window),
        }
    }

    pub fn remove(&mut self, id: WindowId) -> Option<WindowObject> {
        let index = self.windows.iter().position(|window| window.id == id)?;
        Some(self.windows.remove(index))
    }

    pub fn set_minimized(&mut self, id: WindowId, minimized: bool) -> bool {
        match self.windows.iter_mut().find(|window| window.id == id) {
            Some(window) => {
                window.minimized = minimized;
                true
            }
            None => false,
        }
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    fn find_mut(&mut self, id: WindowId) -> Option<&mut WindowObject> {
        self.windows.iter_mut().find(|window| window.id == id)
    }
}

impl WindowRegistry for WindowTable {
    fn windows(&self) -> &[WindowObject] {
        &self.windows
    }

    fn update_position(&mut self, id: WindowId, position: Vec2) -> bool {
        let bounds = self.bounds;
        let margin = self.limits.ui_margin;
        let Some(window) = self.find_mut(id) else {
            debug!(window = %id, "update_position_unknown_window");
            return false;
        };
        window.position = bounds.clamp_rect_origin(position, window.size, margin);
        true
    }

    fn update_size(&mut self, id: WindowId, size: Size) -> bool {
        let bounds = self.bounds;
        let limits = self.limits;
        let Some(window) = self.find_mut(id) else {
            debug!(window = %id, "update_size_unknown_window");
            return false;
        };
        window.size = limits.clamp_size(size);
        window.position = bounds.clamp_rect_origin(window.position, window.size, limits.ui_margin);
        true
    }

    fn set_controller(&mut self, id: WindowId, controller: Option<AvatarId>) -> bool {
        match self.find_mut(id) {
            Some(window) => {
                window.controller = controller;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> WindowTable {
        WindowTable::new(
            WorldBounds {
                width: 1000.0,
                height: 800.0,
            },
            WindowLimits::default(),
        )
    }

    #[test]
    fn upsert_clamps_size_and_position() {
        let mut windows = table();
        windows.upsert(WindowObject::new(
            WindowId(1),
            Vec2::new(950.0, 790.0),
            Size::new(50.0, 5000.0),
        ));
        let window = windows.window(WindowId(1)).expect("window");
        assert_eq!(window.size, Size::new(160.0, 800.0));
        // 800 tall window cannot fit above the 60px bottom margin; pinned to top.
        assert_eq!(window.position, Vec2::new(840.0, 0.0));
    }

    #[test]
    fn unknown_ids_are_silent_no_ops() {
        let mut windows = table();
        assert!(!windows.update_position(WindowId(9), Vec2::ZERO));
        assert!(!windows.update_size(WindowId(9), Size::new(200.0, 200.0)));
        assert!(!windows.set_controller(WindowId(9), Some(AvatarId(1))));
        assert!(windows.windows().is_empty());
    }

    #[test]
    fn update_position_keeps_window_above_reserved_margin() {
        let mut windows = table();
        windows.upsert(WindowObject::new(
            WindowId(1),
            Vec2::new(10.0, 10.0),
            Size::new(200.0, 150.0),
        ));
        assert!(windows.update_position(WindowId(1), Vec2::new(10.0, 700.0)));
        let window = windows.window(WindowId(1)).expect("window");
        assert_eq!(window.position, Vec2::new(10.0, 590.0));
    }

    #[test]
    fn window_json_defaults_optional_fields() {
        let window: WindowObject = serde_json::from_str(
            r#"{"id":4,"position":{"x":1.0,"y":2.0},"size":{"width":300.0,"height":200.0}}"#,
        )
        .expect("window json");
        assert!(!window.minimized);
        assert_eq!(window.controller, None);
        assert!(window.state.is_null());
    }
}
