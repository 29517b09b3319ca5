//! Property tests for coordinate mapping, drag clamping and tap
//! classification.

mod common;

use approx::assert_relative_eq;
use common::{drag, labeled, record};
use labfolio_annotator::coords::{to_percent, to_screen, RenderedRect, ScreenPoint};
use labfolio_annotator::gesture::{
    transition, GestureContext, GestureEvent, GestureState, PointerTarget, TAP_TOLERANCE_PX,
};
use labfolio_annotator::store::AnnotationStore;
use labfolio_annotator::view::ScrollOffset;
use labfolio_annotator::{Editor, Frame};
use proptest::prelude::*;

proptest! {
    #[test]
    fn screen_to_percent_round_trips(
        zoom in 1.0f64..=5.0,
        left in -2_000.0f64..2_000.0,
        top in -2_000.0f64..2_000.0,
        width in 10.0f64..2_000.0,
        height in 10.0f64..2_000.0,
        fx in 0.001f64..0.999,
        fy in 0.001f64..0.999,
    ) {
        let rect = RenderedRect::new(left, top, width * zoom, height * zoom);
        let point = ScreenPoint::new(left + fx * rect.width, top + fy * rect.height);

        let percent = to_percent(point, &rect);
        prop_assert!(percent.is_some());
        let back = to_screen(percent.unwrap(), &rect);

        assert_relative_eq!(back.x, point.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, point.y, epsilon = 1e-6);
    }

    #[test]
    fn moves_always_stay_in_drag_range(
        start in (0.0f64..=100.0, 0.0f64..=100.0),
        deltas in prop::collection::vec((-300.0f64..300.0, -300.0f64..300.0), 1..30),
    ) {
        let mut store = AnnotationStore::new(vec![labeled("a", start.0, start.1, "Pith")]);
        for (dx, dy) in deltas {
            store.move_by("a", dx, dy);
            let a = store.get("a").unwrap();
            prop_assert!((1.0..=99.0).contains(&a.x), "x = {}", a.x);
            prop_assert!((1.0..=99.0).contains(&a.y), "y = {}", a.y);
        }
    }

    #[test]
    fn pointer_drags_stay_in_drag_range(
        path in prop::collection::vec((-1_500.0f64..1_500.0, -1_500.0f64..1_500.0), 1..20),
    ) {
        let mut editor = Editor::new(&record(vec![labeled("a", 50.0, 50.0, "Pith")]), false);
        let frame = Frame::new(RenderedRect::new(0.0, 0.0, 400.0, 300.0));

        drag(&mut editor, &frame, "a", (200.0, 150.0), &path);

        let a = &editor.annotations()[0];
        prop_assert!((1.0..=99.0).contains(&a.x));
        prop_assert!((1.0..=99.0).contains(&a.y));
    }

    #[test]
    fn tap_is_a_click_only_within_tolerance(
        angle in 0.0f64..std::f64::consts::TAU,
        distance in 0.0f64..20.0,
    ) {
        let ctx = GestureContext {
            zoom: 1.0,
            scroll: ScrollOffset::ORIGIN,
            image: RenderedRect::new(0.0, 0.0, 400.0, 400.0),
            read_only: false,
        };
        let press = ScreenPoint::new(200.0, 200.0);
        let release = ScreenPoint::new(
            press.x + distance * angle.cos(),
            press.y + distance * angle.sin(),
        );

        let pressed = transition(
            &GestureState::Placing { press: None },
            &GestureEvent::PointerDown { point: press, target: PointerTarget::Image },
            &ctx,
        );
        let released = transition(&pressed.state, &GestureEvent::PointerUp(release), &ctx);

        let placed = !released.effects.is_empty();
        prop_assert_eq!(placed, press.distance_to(release) <= TAP_TOLERANCE_PX);
    }
}
