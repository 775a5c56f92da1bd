use crate::config::CollisionConfig;
use crate::world::{Insets, Rect, Vec2, WindowId, WindowObject};

/// The part of a window that stops the avatar: everything but the title bar
/// strip and a thin border, so windows can be approached and grabbed by
/// their edges.
pub fn blocking_rect(window: &WindowObject, config: &CollisionConfig) -> Rect {
    window.rect().inset(Insets {
        top: config.title_bar_height,
        right: config.border_inset,
        bottom: config.border_inset,
        left: config.border_inset,
    })
}

pub struct CollisionResolver<'a> {
    windows: &'a [WindowObject],
    grabbed: Option<WindowId>,
    config: &'a CollisionConfig,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(
        windows: &'a [WindowObject],
        grabbed: Option<WindowId>,
        config: &'a CollisionConfig,
    ) -> Self {
        Self {
            windows,
            grabbed,
            config,
        }
    }

    /// Whether moving from `current` to `candidate` is rejected by any window.
    pub fn blocked(&self, current: Vec2, candidate: Vec2) -> bool {
        self.windows
            .iter()
            .filter(|window| !window.minimized && Some(window.id) != self.grabbed)
            .any(|window| {
                let rect = blocking_rect(window, self.config);
                !rect.is_empty() && blocks_move(&rect, current, candidate)
            })
    }
}

fn blocks_move(rect: &Rect, current: Vec2, candidate: Vec2) -> bool {
    if rect.contains(current) {
        // Already inside: only moves that strictly increase the distance to
        // the center are allowed, so a trapped avatar can always walk out.
        let center = rect.center();
        return candidate.distance_sq(center) <= current.distance_sq(center);
    }
    rect.contains(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Size;

    fn window(id: u64, x: f32, y: f32, width: f32, height: f32) -> WindowObject {
        WindowObject::new(WindowId(id), Vec2::new(x, y), Size::new(width, height))
    }

    #[test]
    fn blocking_rect_excludes_title_bar_and_border() {
        let config = CollisionConfig::default();
        let rect = blocking_rect(&window(1, 120.0, 100.0, 200.0, 150.0), &config);
        assert_eq!(rect, Rect::new(130.0, 130.0, 180.0, 110.0));
        assert_eq!(rect.right(), 310.0);
        assert_eq!(rect.bottom(), 240.0);
    }

    #[test]
    fn scenario_moves_into_content_are_blocked_and_beside_it_allowed() {
        let config = CollisionConfig::default();
        let windows = [window(1, 120.0, 100.0, 200.0, 150.0)];
        let resolver = CollisionResolver::new(&windows, None, &config);
        let current = Vec2::new(100.0, 100.0);

        assert!(resolver.blocked(current, Vec2::new(140.0, 140.0)));
        assert!(!resolver.blocked(current, Vec2::new(100.0, 200.0)));
    }

    #[test]
    fn title_bar_strip_is_walkable() {
        let config = CollisionConfig::default();
        let windows = [window(1, 120.0, 100.0, 200.0, 150.0)];
        let resolver = CollisionResolver::new(&windows, None, &config);
        assert!(!resolver.blocked(Vec2::new(200.0, 90.0), Vec2::new(200.0, 115.0)));
    }

    #[test]
    fn minimized_and_grabbed_windows_are_ignored() {
        let config = CollisionConfig::default();
        let mut minimized = window(1, 0.0, 0.0, 300.0, 300.0);
        minimized.minimized = true;
        let grabbed = window(2, 400.0, 0.0, 300.0, 300.0);
        let windows = [minimized, grabbed];
        let resolver = CollisionResolver::new(&windows, Some(WindowId(2)), &config);

        assert!(!resolver.blocked(Vec2::new(0.0, 500.0), Vec2::new(150.0, 150.0)));
        assert!(!resolver.blocked(Vec2::new(0.0, 500.0), Vec2::new(550.0, 150.0)));
    }

    #[test]
    fn trapped_avatar_may_only_move_away_from_center() {
        let config = CollisionConfig::default();
        let windows = [window(1, 0.0, 0.0, 220.0, 240.0)];
        let resolver = CollisionResolver::new(&windows, None, &config);
        // Blocking rect is (10,30)-(210,230), center (110,130).
        let current = Vec2::new(150.0, 130.0);

        assert!(!resolver.blocked(current, Vec2::new(155.0, 130.0)));
        assert!(resolver.blocked(current, Vec2::new(145.0, 130.0)));
        // Sideways at equal distance is not an improvement.
        assert!(resolver.blocked(current, Vec2::new(150.0, 130.0)));
    }

    #[test]
    fn any_single_window_blocks() {
        let config = CollisionConfig::default();
        let windows = [
            window(1, 0.0, 0.0, 100.0, 100.0),
            window(2, 500.0, 500.0, 200.0, 200.0),
        ];
        let resolver = CollisionResolver::new(&windows, None, &config);
        assert!(resolver.blocked(Vec2::new(450.0, 600.0), Vec2::new(600.0, 600.0)));
    }
}
