//! Screen space to image-relative percentage space.
//!
//! All mapping normalizes by the image's *current rendered* box, so the same
//! functions are correct at any zoom level and scroll position.

use labfolio_core::annotation::{MAX_PERCENT, MIN_PERCENT};

/// A point in screen (client) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: ScreenPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// `other - self`, component-wise.
    pub fn delta_to(self, other: ScreenPoint) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }
}

/// A point in image-relative percentages, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

/// The on-screen bounding box of the rendered (possibly zoomed) image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderedRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The box of an image laid out at `natural` size inside a viewport whose
    /// top-left corner is at `viewport_origin`, scaled by `zoom` and scrolled
    /// by `(scroll_left, scroll_top)`.
    pub fn laid_out(
        viewport_origin: ScreenPoint,
        natural_width: f64,
        natural_height: f64,
        zoom: f64,
        scroll_left: f64,
        scroll_top: f64,
    ) -> Self {
        Self {
            left: viewport_origin.x - scroll_left,
            top: viewport_origin.y - scroll_top,
            width: natural_width * zoom,
            height: natural_height * zoom,
        }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// Map a screen point to percentages within `rect`.
///
/// Returns `None` when the point falls outside the box (edges included as
/// inside) or the box has no area; callers discard such events.
pub fn to_percent(point: ScreenPoint, rect: &RenderedRect) -> Option<PercentPoint> {
    if rect.is_degenerate() {
        return None;
    }
    let x = (point.x - rect.left) / rect.width * 100.0;
    let y = (point.y - rect.top) / rect.height * 100.0;
    let in_range = |v: f64| (MIN_PERCENT..=MAX_PERCENT).contains(&v);
    (in_range(x) && in_range(y)).then_some(PercentPoint { x, y })
}

/// Map percentages back to a screen point within `rect`.
pub fn to_screen(point: PercentPoint, rect: &RenderedRect) -> ScreenPoint {
    ScreenPoint {
        x: rect.left + point.x / 100.0 * rect.width,
        y: rect.top + point.y / 100.0 * rect.height,
    }
}

/// Convert a screen-pixel movement into a percentage movement using the
/// rendered box's scale. `None` when the box has no area.
pub fn delta_to_percent(dx: f64, dy: f64, rect: &RenderedRect) -> Option<(f64, f64)> {
    if rect.is_degenerate() {
        return None;
    }
    Some((dx / rect.width * 100.0, dy / rect.height * 100.0))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const RECT: RenderedRect = RenderedRect::new(100.0, 50.0, 400.0, 200.0);

    #[test]
    fn centre_maps_to_fifty_percent() {
        let p = to_percent(ScreenPoint::new(300.0, 150.0), &RECT).unwrap();
        assert_relative_eq!(p.x, 50.0);
        assert_relative_eq!(p.y, 50.0);
    }

    #[test]
    fn edges_are_inside() {
        assert!(to_percent(ScreenPoint::new(100.0, 50.0), &RECT).is_some());
        assert!(to_percent(ScreenPoint::new(500.0, 250.0), &RECT).is_some());
    }

    #[test]
    fn outside_is_rejected() {
        assert_eq!(to_percent(ScreenPoint::new(99.9, 100.0), &RECT), None);
        assert_eq!(to_percent(ScreenPoint::new(300.0, 251.0), &RECT), None);
    }

    #[test]
    fn degenerate_rect_rejects_everything() {
        let empty = RenderedRect::new(0.0, 0.0, 0.0, 100.0);
        assert_eq!(to_percent(ScreenPoint::new(0.0, 0.0), &empty), None);
        assert_eq!(delta_to_percent(1.0, 1.0, &empty), None);
    }

    #[test]
    fn zoomed_layout_scales_deltas_down() {
        let rect = RenderedRect::laid_out(ScreenPoint::new(0.0, 0.0), 400.0, 300.0, 2.0, 0.0, 0.0);
        let (dx, dy) = delta_to_percent(8.0, 6.0, &rect).unwrap();
        assert_relative_eq!(dx, 1.0);
        assert_relative_eq!(dy, 1.0);
    }

    #[test]
    fn scroll_shifts_the_rendered_box() {
        let rect =
            RenderedRect::laid_out(ScreenPoint::new(10.0, 20.0), 400.0, 300.0, 2.0, 400.0, 0.0);
        let p = to_percent(ScreenPoint::new(10.0, 20.0), &rect).unwrap();
        assert_relative_eq!(p.x, 50.0);
        assert_relative_eq!(p.y, 0.0);
    }
}
