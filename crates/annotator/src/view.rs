//! Zoom and pan state of the image viewport.
//!
//! The content area is sized to `zoom * 100%` of the viewport; panning is
//! the viewport's scroll offset over that area. Nothing here touches
//! annotation data.

/// Lowest zoom factor (natural size).
pub const MIN_ZOOM: f64 = 1.0;

/// Highest zoom factor.
pub const MAX_ZOOM: f64 = 5.0;

/// Step used by the zoom-in / zoom-out buttons.
pub const ZOOM_STEP: f64 = 0.5;

/// Zoom change per unit of wheel `deltaY` while the modifier is held.
pub const WHEEL_ZOOM_FACTOR: f64 = 0.01;

/// Clamp a zoom factor to `[MIN_ZOOM, MAX_ZOOM]`. NaN maps to `MIN_ZOOM`.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub left: f64,
    pub top: f64,
}

impl ScrollOffset {
    pub const ORIGIN: Self = Self { left: 0.0, top: 0.0 };

    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Visible size of the scroll container, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Largest scroll offset reachable at `zoom`.
    pub fn max_scroll(&self, zoom: f64) -> ScrollOffset {
        let overflow = (zoom - 1.0).max(0.0);
        ScrollOffset {
            left: (self.width * overflow).max(0.0),
            top: (self.height * overflow).max(0.0),
        }
    }

    /// Keep `offset` within the scrollable bounds at `zoom`, the same way a
    /// browser clamps `scrollLeft` / `scrollTop`.
    pub fn clamp_scroll(&self, offset: ScrollOffset, zoom: f64) -> ScrollOffset {
        let max = self.max_scroll(zoom);
        let fit = |v: f64, hi: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, hi) };
        ScrollOffset {
            left: fit(offset.left, max.left),
            top: fit(offset.top, max.top),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    zoom: f64,
    scroll: ScrollOffset,
    labels_visible: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: MIN_ZOOM,
            scroll: ScrollOffset::ORIGIN,
            labels_visible: true,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    pub fn labels_visible(&self) -> bool {
        self.labels_visible
    }

    /// Whether the content overflows the viewport, enabling pan.
    pub fn is_zoomed(&self) -> bool {
        self.zoom > MIN_ZOOM
    }

    /// Set the zoom factor, clamped. Returns the applied value.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = clamp_zoom(zoom);
        if !self.is_zoomed() {
            self.scroll = ScrollOffset::ORIGIN;
        }
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }

    /// Back to natural size with the scroll position at the origin.
    pub fn reset_zoom(&mut self) {
        self.zoom = MIN_ZOOM;
        self.scroll = ScrollOffset::ORIGIN;
    }

    /// Zoom target for a modifier-held wheel event; the caller applies it.
    pub fn wheel_target(&self, delta_y: f64) -> f64 {
        clamp_zoom(self.zoom - delta_y * WHEEL_ZOOM_FACTOR)
    }

    /// Scroll to `offset`, clamped to the viewport's scrollable bounds when
    /// known and to non-negative values otherwise.
    pub fn scroll_to(&mut self, offset: ScrollOffset, viewport: Option<&Viewport>) {
        self.scroll = match viewport {
            Some(viewport) => viewport.clamp_scroll(offset, self.zoom),
            None => ScrollOffset {
                left: offset.left.max(0.0),
                top: offset.top.max(0.0),
            },
        };
    }

    /// Show or hide every marker and the legend. Returns the new value.
    pub fn toggle_labels(&mut self) -> bool {
        self.labels_visible = !self.labels_visible;
        self.labels_visible
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn defaults_to_natural_size_with_labels_shown() {
        let view = ViewState::new();
        assert_relative_eq!(view.zoom(), 1.0);
        assert_eq!(view.scroll(), ScrollOffset::ORIGIN);
        assert!(view.labels_visible());
        assert!(!view.is_zoomed());
    }

    #[test]
    fn zoom_steps_stay_in_range() {
        let mut view = ViewState::new();
        for _ in 0..20 {
            view.zoom_in();
        }
        assert_relative_eq!(view.zoom(), MAX_ZOOM);
        for _ in 0..20 {
            view.zoom_out();
        }
        assert_relative_eq!(view.zoom(), MIN_ZOOM);
    }

    #[test]
    fn set_zoom_ignores_nan() {
        let mut view = ViewState::new();
        view.set_zoom(3.0);
        assert_relative_eq!(view.set_zoom(f64::NAN), MIN_ZOOM);
    }

    #[test]
    fn reset_zoom_clears_scroll() {
        let mut view = ViewState::new();
        view.set_zoom(3.0);
        view.scroll_to(ScrollOffset::new(120.0, 40.0), None);
        view.reset_zoom();
        assert_relative_eq!(view.zoom(), 1.0);
        assert_eq!(view.scroll(), ScrollOffset::ORIGIN);
    }

    #[test]
    fn wheel_target_moves_against_delta() {
        let mut view = ViewState::new();
        view.set_zoom(2.0);
        assert_relative_eq!(view.wheel_target(-50.0), 2.5);
        assert_relative_eq!(view.wheel_target(100.0), 1.0);
        assert_relative_eq!(view.wheel_target(-10_000.0), MAX_ZOOM);
    }

    #[test]
    fn scroll_is_bounded_by_viewport() {
        let viewport = Viewport::new(400.0, 300.0);
        let mut view = ViewState::new();
        view.set_zoom(2.0);

        view.scroll_to(ScrollOffset::new(1_000.0, -20.0), Some(&viewport));

        assert_eq!(view.scroll(), ScrollOffset::new(400.0, 0.0));
    }

    #[test]
    fn toggling_labels_flips_visibility() {
        let mut view = ViewState::new();
        assert!(!view.toggle_labels());
        assert!(view.toggle_labels());
    }
}
