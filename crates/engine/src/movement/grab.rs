use tracing::{debug, info};

use crate::world::{AvatarId, Rect, Size, Vec2, WindowId, WindowLimits, WindowRegistry, WorldBounds};

use super::proximity::nearby_window;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabSession {
    pub window: WindowId,
    /// `window.position - avatar_center`, captured once at grab start.
    pub offset: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalSide {
    Top,
    Bottom,
}

/// Frozen at resize start so crossing the window's centerline mid-session
/// never flips the edge being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    pub anchor: Rect,
    pub start_center: Vec2,
    pub horizontal: HorizontalSide,
    pub vertical: VerticalSide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GrabState {
    #[default]
    Idle,
    Grabbing(GrabSession),
    Resizing(GrabSession, ResizeSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabTransition {
    GrabStarted(WindowId),
    ResizeStarted(WindowId),
    ResizeStopped(WindowId),
    Released(WindowId),
}

/// Converts avatar displacement into window translation or deformation.
#[derive(Debug, Clone)]
pub struct GrabController {
    avatar: AvatarId,
    state: GrabState,
}

impl GrabController {
    pub fn new(avatar: AvatarId) -> Self {
        Self {
            avatar,
            state: GrabState::Idle,
        }
    }

    pub fn state(&self) -> GrabState {
        self.state
    }

    pub fn grabbed_window(&self) -> Option<WindowId> {
        match self.state {
            GrabState::Idle => None,
            GrabState::Grabbing(session) | GrabState::Resizing(session, _) => Some(session.window),
        }
    }

    pub fn is_grabbing(&self) -> bool {
        !matches!(self.state, GrabState::Idle)
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.state, GrabState::Resizing(..))
    }

    /// Starts a grab on the window nearest to `center`, claiming it for this
    /// avatar. A no-op while a session is active or nothing is in reach.
    pub fn start_grab<R: WindowRegistry + ?Sized>(
        &mut self,
        center: Vec2,
        grab_radius: f32,
        registry: &mut R,
    ) -> Option<GrabTransition> {
        if self.is_grabbing() {
            return None;
        }
        let id = nearby_window(center, registry.windows(), grab_radius, self.avatar)?;
        let position = registry.window(id)?.position;
        registry.set_controller(id, Some(self.avatar));
        let offset = position.sub(center);
        self.state = GrabState::Grabbing(GrabSession { window: id, offset });
        info!(window = %id, offset_x = offset.x, offset_y = offset.y, "grab_started");
        Some(GrabTransition::GrabStarted(id))
    }

    pub fn start_resize<R: WindowRegistry + ?Sized>(
        &mut self,
        center: Vec2,
        registry: &R,
    ) -> Option<GrabTransition> {
        let GrabState::Grabbing(session) = self.state else {
            return None;
        };
        let anchor = registry.window(session.window)?.rect();
        let anchor_center = anchor.center();
        let horizontal = if center.x < anchor_center.x {
            HorizontalSide::Left
        } else {
            HorizontalSide::Right
        };
        let vertical = if center.y < anchor_center.y {
            VerticalSide::Top
        } else {
            VerticalSide::Bottom
        };
        self.state = GrabState::Resizing(
            session,
            ResizeSession {
                anchor,
                start_center: center,
                horizontal,
                vertical,
            },
        );
        info!(
            window = %session.window,
            horizontal = ?horizontal,
            vertical = ?vertical,
            "resize_started"
        );
        Some(GrabTransition::ResizeStarted(session.window))
    }

    /// Ends deformation but keeps carrying the window with the offset
    /// captured at grab start.
    pub fn stop_resize(&mut self) -> Option<GrabTransition> {
        let GrabState::Resizing(session, _) = self.state else {
            return None;
        };
        self.state = GrabState::Grabbing(session);
        info!(window = %session.window, "resize_stopped");
        Some(GrabTransition::ResizeStopped(session.window))
    }

    pub fn release<R: WindowRegistry + ?Sized>(
        &mut self,
        registry: &mut R,
    ) -> Option<GrabTransition> {
        let id = self.grabbed_window()?;
        self.state = GrabState::Idle;
        registry.set_controller(id, None);
        info!(window = %id, "grab_released");
        Some(GrabTransition::Released(id))
    }

    /// Applies the active session for an avatar now centered at `center`.
    /// Returns `Released` if the grabbed window disappeared from the registry.
    pub fn apply<R: WindowRegistry + ?Sized>(
        &mut self,
        center: Vec2,
        bounds: WorldBounds,
        limits: &WindowLimits,
        registry: &mut R,
    ) -> Option<GrabTransition> {
        match self.state {
            GrabState::Idle => None,
            GrabState::Grabbing(session) => {
                let Some(window) = registry.window(session.window) else {
                    return self.drop_vanished(session.window);
                };
                let target = bounds.clamp_rect_origin(
                    center.add(session.offset),
                    window.size,
                    limits.ui_margin,
                );
                if target != window.position {
                    registry.update_position(session.window, target);
                }
                None
            }
            GrabState::Resizing(session, resize) => {
                if registry.window(session.window).is_none() {
                    return self.drop_vanished(session.window);
                }
                let rect = resized_rect(&resize, center, bounds, limits);
                registry.update_size(session.window, rect.size());
                registry.update_position(session.window, rect.origin());
                None
            }
        }
    }

    fn drop_vanished(&mut self, id: WindowId) -> Option<GrabTransition> {
        debug!(window = %id, "grabbed_window_vanished");
        self.state = GrabState::Idle;
        Some(GrabTransition::Released(id))
    }
}

/// Window rectangle for an avatar centered at `center` during `session`.
///
/// The anchored side follows the avatar's displacement since resize start;
/// the opposite edge stays where it was. Each dimension is clamped to the
/// window size limits and to the room left in the usable world area.
pub fn resized_rect(
    session: &ResizeSession,
    center: Vec2,
    bounds: WorldBounds,
    limits: &WindowLimits,
) -> Rect {
    let delta = center.sub(session.start_center);
    let anchor = session.anchor;
    let usable = bounds.usable_rect(limits.ui_margin);

    let (x, width) = match session.horizontal {
        HorizontalSide::Right => {
            let room = usable.right() - anchor.x;
            let width = clamp_dimension(
                anchor.width + delta.x,
                limits.min_size.width,
                limits.max_size.width,
                room,
            );
            (anchor.x, width)
        }
        HorizontalSide::Left => {
            let room = anchor.right() - usable.x;
            let width = clamp_dimension(
                anchor.width - delta.x,
                limits.min_size.width,
                limits.max_size.width,
                room,
            );
            (anchor.right() - width, width)
        }
    };

    let (y, height) = match session.vertical {
        VerticalSide::Bottom => {
            let room = usable.bottom() - anchor.y;
            let height = clamp_dimension(
                anchor.height + delta.y,
                limits.min_size.height,
                limits.max_size.height,
                room,
            );
            (anchor.y, height)
        }
        VerticalSide::Top => {
            let room = anchor.bottom() - usable.y;
            let height = clamp_dimension(
                anchor.height - delta.y,
                limits.min_size.height,
                limits.max_size.height,
                room,
            );
            (anchor.bottom() - height, height)
        }
    };

    Rect::from_parts(Vec2::new(x, y), Size::new(width, height))
}

fn clamp_dimension(value: f32, min: f32, max: f32, room: f32) -> f32 {
    let upper = max.min(room).max(min);
    value.clamp(min, upper)
}
