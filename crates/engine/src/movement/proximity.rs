use crate::world::{AvatarId, Icon, Vec2, WindowId, WindowObject};

/// First icon, in enumeration order, within `radius` of `center`. Icons are
/// not ranked by distance.
pub fn nearby_icon<'a>(center: Vec2, icons: &'a [Icon], radius: f32) -> Option<&'a Icon> {
    let radius_sq = radius * radius;
    icons
        .iter()
        .find(|icon| icon.position.distance_sq(center) <= radius_sq)
}

/// Window eligible for a grab from `center`.
///
/// Distance is measured to the closest point of each window's rectangle; the
/// nearest window within `radius` wins and ties keep enumeration order. When
/// nothing is in range, a window that contains `center` is accepted instead.
/// Minimized windows and windows controlled by another avatar never qualify.
pub fn nearby_window(
    center: Vec2,
    windows: &[WindowObject],
    radius: f32,
    avatar: AvatarId,
) -> Option<WindowId> {
    let radius_sq = radius * radius;
    let eligible = || {
        windows.iter().filter(move |window| {
            !window.minimized && window.controller.map_or(true, |owner| owner == avatar)
        })
    };

    let mut best: Option<(WindowId, f32)> = None;
    for window in eligible() {
        let distance_sq = window.rect().closest_point(center).distance_sq(center);
        if distance_sq > radius_sq {
            continue;
        }
        if best.map_or(true, |(_, best_sq)| distance_sq < best_sq) {
            best = Some((window.id, distance_sq));
        }
    }

    best.map(|(id, _)| id).or_else(|| {
        eligible()
            .find(|window| window.rect().contains(center))
            .map(|window| window.id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{IconId, IconKind, Size};

    fn icon(id: &str, x: f32, y: f32) -> Icon {
        Icon {
            id: IconId(id.to_string()),
            position: Vec2::new(x, y),
            kind: IconKind::Notice,
        }
    }

    fn window(id: u64, x: f32, y: f32, width: f32, height: f32) -> WindowObject {
        WindowObject::new(WindowId(id), Vec2::new(x, y), Size::new(width, height))
    }

    #[test]
    fn first_icon_in_range_wins_even_if_farther() {
        let icons = [icon("far", 60.0, 0.0), icon("near", 5.0, 0.0)];
        let found = nearby_icon(Vec2::ZERO, &icons, 80.0).expect("icon");
        assert_eq!(found.id.0, "far");
    }

    #[test]
    fn icon_radius_is_inclusive() {
        let icons = [icon("edge", 80.0, 0.0)];
        assert!(nearby_icon(Vec2::ZERO, &icons, 80.0).is_some());
        assert!(nearby_icon(Vec2::ZERO, &icons, 79.9).is_none());
    }

    #[test]
    fn window_distance_uses_perimeter_not_center() {
        // Big window whose center is far away but whose left edge is close.
        let windows = [window(1, 50.0, -500.0, 1000.0, 1000.0)];
        assert_eq!(
            nearby_window(Vec2::ZERO, &windows, 60.0, AvatarId(1)),
            Some(WindowId(1))
        );
    }

    #[test]
    fn closest_window_in_range_is_chosen() {
        let windows = [
            window(1, 50.0, 0.0, 100.0, 100.0),
            window(2, 20.0, 0.0, 100.0, 100.0),
        ];
        assert_eq!(
            nearby_window(Vec2::ZERO, &windows, 60.0, AvatarId(1)),
            Some(WindowId(2))
        );
    }

    #[test]
    fn containment_is_the_fallback_rule() {
        let windows = [window(1, 0.0, 0.0, 500.0, 500.0)];
        // Zero radius: nothing is "in range" except by containment, which the
        // clamped projection already reports as distance zero.
        assert_eq!(
            nearby_window(Vec2::new(250.0, 250.0), &windows, 0.0, AvatarId(1)),
            Some(WindowId(1))
        );
        assert_eq!(
            nearby_window(Vec2::new(600.0, 250.0), &windows, 10.0, AvatarId(1)),
            None
        );
    }

    #[test]
    fn minimized_or_foreign_windows_are_not_grabbable() {
        let mut minimized = window(1, 0.0, 0.0, 100.0, 100.0);
        minimized.minimized = true;
        let mut foreign = window(2, 0.0, 0.0, 100.0, 100.0);
        foreign.controller = Some(AvatarId(7));
        let mut own = window(3, 0.0, 0.0, 100.0, 100.0);
        own.controller = Some(AvatarId(1));

        let windows = [minimized, foreign.clone()];
        assert_eq!(nearby_window(Vec2::new(10.0, 10.0), &windows, 60.0, AvatarId(1)), None);

        let windows = [foreign, own];
        assert_eq!(
            nearby_window(Vec2::new(10.0, 10.0), &windows, 60.0, AvatarId(1)),
            Some(WindowId(3))
        );
    }
}
