//! Pointer-space to image-space conversion.
//!
//! Burned-in shapes are recorded in natural pixel space (the source
//! resolution), so they are independent of the current zoom and display
//! size. The live preview overlay uses percent-of-rendered-rect
//! coordinates instead, so it tracks the image through container resizes.
//! Both functions take the *rendered* image rect, which already reflects
//! the current zoom.

use egui::{Pos2, Rect};

use crate::annotation::Point;

/// Map a pointer position to natural pixel coordinates. Positions outside
/// the rendered rect are clamped onto its edge, never rejected.
pub fn to_natural(pointer: Pos2, image_rect: Rect, natural_width: u32, natural_height: u32) -> Point {
    let (norm_x, norm_y) = normalize(pointer, image_rect);
    Point::new(
        norm_x * natural_width as f32,
        norm_y * natural_height as f32,
    )
}

/// Map a pointer position to 0–100 percentages of the rendered rect.
pub fn to_percent(pointer: Pos2, image_rect: Rect) -> Point {
    let (norm_x, norm_y) = normalize(pointer, image_rect);
    Point::new(norm_x * 100.0, norm_y * 100.0)
}

/// Inverse of [`to_percent`], used to place the preview overlay.
pub fn percent_to_screen(percent: Point, image_rect: Rect) -> Pos2 {
    Pos2::new(
        image_rect.min.x + percent.x / 100.0 * image_rect.width(),
        image_rect.min.y + percent.y / 100.0 * image_rect.height(),
    )
}

fn normalize(pointer: Pos2, image_rect: Rect) -> (f32, f32) {
    let x = (pointer.x - image_rect.min.x).clamp(0.0, image_rect.width());
    let y = (pointer.y - image_rect.min.y).clamp(0.0, image_rect.height());
    (
        x / image_rect.width().max(1.0),
        y / image_rect.height().max(1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::{percent_to_screen, to_natural, to_percent};
    use crate::annotation::Point;
    use egui::{vec2, Pos2, Rect};

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(Pos2::new(x, y), vec2(w, h))
    }

    #[test]
    fn natural_maps_through_the_rendered_rect() {
        let image_rect = rect(100.0, 50.0, 400.0, 200.0);
        let point = to_natural(Pos2::new(300.0, 150.0), image_rect, 800, 600);
        assert_eq!(point, Point::new(400.0, 300.0));
    }

    #[test]
    fn out_of_bounds_pointers_are_clamped() {
        let image_rect = rect(0.0, 0.0, 200.0, 100.0);

        let below = to_natural(Pos2::new(-50.0, -10.0), image_rect, 200, 100);
        assert_eq!(below, Point::new(0.0, 0.0));

        let beyond = to_natural(Pos2::new(900.0, 900.0), image_rect, 200, 100);
        assert_eq!(beyond, Point::new(200.0, 100.0));

        let percent = to_percent(Pos2::new(900.0, -5.0), image_rect);
        assert_eq!(percent, Point::new(100.0, 0.0));
    }

    #[test]
    fn percent_stays_within_bounds() {
        let image_rect = rect(10.0, 10.0, 300.0, 300.0);
        for pointer in [
            Pos2::new(-100.0, 160.0),
            Pos2::new(160.0, 160.0),
            Pos2::new(1000.0, 1000.0),
        ] {
            let p = to_percent(pointer, image_rect);
            assert!((0.0..=100.0).contains(&p.x));
            assert!((0.0..=100.0).contains(&p.y));
        }
    }

    #[test]
    fn natural_is_zoom_independent() {
        // The same relative pointer position yields the same natural point
        // whether the rect is rendered at 1x or 4x.
        let base = rect(0.0, 0.0, 100.0, 50.0);
        let zoomed = rect(0.0, 0.0, 400.0, 200.0);

        let at_base = to_natural(Pos2::new(25.0, 10.0), base, 1000, 500);
        let at_zoom = to_natural(Pos2::new(100.0, 40.0), zoomed, 1000, 500);
        assert_eq!(at_base, at_zoom);
    }

    #[test]
    fn percent_round_trips_to_screen() {
        let image_rect = rect(40.0, 20.0, 160.0, 80.0);
        let pointer = Pos2::new(120.0, 60.0);
        let percent = to_percent(pointer, image_rect);
        let back = percent_to_screen(percent, image_rect);
        assert!((back.x - pointer.x).abs() < 1e-4);
        assert!((back.y - pointer.y).abs() < 1e-4);
    }
}
