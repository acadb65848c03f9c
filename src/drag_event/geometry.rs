use egui::{CornerRadius, Pos2, Rect, Vec2};

use super::constants::{BLUR_SIGMA_SCALE, MENU_DRAG_SCALE};

/// Gaussian sigma for a blur radius.
pub(super) fn blur_radius_to_sigma(radius: f32) -> f32 {
    if radius > 0.0 {
        BLUR_SIGMA_SCALE * radius + 0.5
    } else {
        0.0
    }
}

/// Top-left corner that centers `size` on `frame`.
pub(super) fn centered_origin(frame: Rect, size: Vec2) -> Pos2 {
    frame.center() - size / 2.0
}

/// The point the damped preview follows: `ratio` of the way from `start` to `point`.
pub(super) fn damped_point(point: Pos2, start: Pos2, ratio: f32) -> Pos2 {
    Pos2::new(
        ratio * point.x + (1.0 - ratio) * start.x,
        ratio * point.y + (1.0 - ratio) * start.y,
    )
}

/// Shrink of the context-menu preview after `distance` of drift, bottoming out at
/// `1 - MENU_DRAG_SCALE`.
pub(super) fn menu_preview_scale(distance: f32, limit: f32) -> f32 {
    let floor = 1.0 - MENU_DRAG_SCALE;
    if !(limit > 0.0) {
        return floor;
    }
    (1.0 - distance / limit * MENU_DRAG_SCALE).clamp(floor, 1.0)
}

/// Uniform scale that makes `size` fit inside `target`, never enlarging.
pub(super) fn fit_scale(size: Vec2, target: Vec2) -> f32 {
    if !(size.x > 0.0 && size.y > 0.0) {
        return 1.0;
    }
    (target.x / size.x).min(target.y / size.y).min(1.0)
}

/// Badge placement: straddling the top-right corner of the floating image.
pub(super) fn badge_origin(image: Rect, badge_size: Vec2, offset_px: f32) -> Pos2 {
    Pos2::new(
        image.right() - badge_size.x + offset_px,
        image.top() - offset_px,
    )
}

/// Response region, relative to `node_rect`, that covers the whole window.
pub(super) fn full_window_hot_zone(node_rect: Rect, window: Rect) -> Rect {
    Rect::from_min_size(window.min - node_rect.min.to_vec2(), window.size())
}

pub(super) fn corner_radius(px: f32) -> CornerRadius {
    CornerRadius::same(px.round().clamp(0.0, f32::from(u8::MAX)) as u8)
}

#[cfg(test)]
mod tests {
    use egui::{pos2, vec2};

    use super::*;

    #[test]
    fn sigma_matches_radius_conversion() {
        assert_eq!(blur_radius_to_sigma(0.0), 0.0);
        assert_eq!(blur_radius_to_sigma(-3.0), 0.0);
        let sigma = blur_radius_to_sigma(10.0);
        assert!((sigma - 6.2735).abs() < 1e-4, "sigma={sigma}");
    }

    #[test]
    fn damped_point_blends_toward_start() {
        let p = damped_point(pos2(100.0, 50.0), pos2(0.0, 0.0), 0.2);
        assert_eq!(p, pos2(20.0, 10.0));
        assert_eq!(damped_point(pos2(7.0, 7.0), pos2(3.0, 3.0), 1.0), pos2(7.0, 7.0));
    }

    #[test]
    fn menu_scale_bottoms_out() {
        assert_eq!(menu_preview_scale(0.0, 2.0), 1.0);
        assert!((menu_preview_scale(1.0, 2.0) - 0.975).abs() < 1e-6);
        assert!((menu_preview_scale(50.0, 2.0) - 0.95).abs() < 1e-6);
        assert!((menu_preview_scale(1.0, 0.0) - 0.95).abs() < 1e-6);
    }

    #[test]
    fn fit_scale_only_shrinks() {
        assert_eq!(fit_scale(vec2(200.0, 100.0), vec2(100.0, 100.0)), 0.5);
        assert_eq!(fit_scale(vec2(50.0, 50.0), vec2(100.0, 100.0)), 1.0);
        assert_eq!(fit_scale(Vec2::ZERO, vec2(100.0, 100.0)), 1.0);
    }

    #[test]
    fn hot_zone_covers_window_from_node_origin() {
        let node = Rect::from_min_size(pos2(30.0, 40.0), vec2(10.0, 10.0));
        let window = Rect::from_min_size(pos2(0.0, 0.0), vec2(300.0, 600.0));
        let zone = full_window_hot_zone(node, window);
        assert_eq!(zone.min, pos2(-30.0, -40.0));
        assert_eq!(zone.size(), vec2(300.0, 600.0));
    }

    #[test]
    fn centered_origin_centers() {
        let frame = Rect::from_min_size(pos2(10.0, 10.0), vec2(100.0, 50.0));
        assert_eq!(centered_origin(frame, vec2(20.0, 10.0)), pos2(50.0, 30.0));
    }
}
