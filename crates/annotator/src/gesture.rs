//! Pointer, touch and wheel disambiguation.
//!
//! [`transition`] is a pure function from the current state, one input event
//! and a snapshot of the view to the next state plus the effects the caller
//! must apply. Single-finger touches arrive as pointer events; the touch
//! events here only drive two-finger pinch.

use crate::coords::{delta_to_percent, to_percent, RenderedRect, ScreenPoint};
use crate::view::{clamp_zoom, ScrollOffset, MIN_ZOOM, WHEEL_ZOOM_FACTOR};

/// Largest press-to-release displacement, in screen pixels, that still
/// counts as a click.
pub const TAP_TOLERANCE_PX: f64 = 5.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    /// Waiting for a tap on the image. `press` is where the current press
    /// started, if one is in progress.
    Placing { press: Option<ScreenPoint> },
    PanningView {
        origin: ScreenPoint,
        start_scroll: ScrollOffset,
    },
    DraggingLabel {
        id: String,
        /// Pointer position at the last applied move.
        last: ScreenPoint,
        resume_placing: bool,
    },
    Pinching {
        initial_distance: f64,
        initial_zoom: f64,
        resume_placing: bool,
    },
}

impl GestureState {
    pub fn is_placing(&self) -> bool {
        matches!(self, Self::Placing { .. })
    }

    /// Whether a drag, pan or pinch that ends should land back in placing.
    fn resumes_placing(&self) -> bool {
        match self {
            Self::Placing { .. } => true,
            Self::DraggingLabel { resume_placing, .. } | Self::Pinching { resume_placing, .. } => {
                *resume_placing
            }
            Self::Idle | Self::PanningView { .. } => false,
        }
    }

    fn settle(resume_placing: bool) -> Self {
        if resume_placing {
            Self::Placing { press: None }
        } else {
            Self::Idle
        }
    }
}

/// What the pointer went down on.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    Image,
    /// An existing label marker, by annotation id.
    Label(String),
    Outside,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// The "add label" button.
    ToggleAddLabel,
    PointerDown {
        point: ScreenPoint,
        target: PointerTarget,
    },
    PointerMove(ScreenPoint),
    PointerUp(ScreenPoint),
    PointerCancel,
    TouchStart(Vec<ScreenPoint>),
    TouchMove(Vec<ScreenPoint>),
    /// Fingers still down after a touch lifted.
    TouchEnd { remaining: usize },
    Wheel { delta_y: f64, modifier: bool },
}

/// The parts of the view a transition depends on, sampled at event time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureContext {
    pub zoom: f64,
    pub scroll: ScrollOffset,
    /// Current on-screen box of the rendered image.
    pub image: RenderedRect,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Add an unlabeled annotation at these percentages and open it for
    /// inline editing.
    CreateAnnotation { x: f64, y: f64 },
    /// Shift an annotation by a percentage delta.
    MoveAnnotation { id: String, dx: f64, dy: f64 },
    ScrollTo(ScrollOffset),
    SetZoom(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: GestureState,
    pub effects: Vec<Effect>,
    /// The event was handled here and must not fall through to default
    /// page behavior (scrolling, text selection, browser zoom).
    pub consumed: bool,
}

impl Step {
    fn stay(state: &GestureState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
            consumed: false,
        }
    }

    fn to(state: GestureState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            consumed: true,
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Compute the next gesture state for `event`.
pub fn transition(state: &GestureState, event: &GestureEvent, ctx: &GestureContext) -> Step {
    match event {
        GestureEvent::ToggleAddLabel => toggle_placing(state, ctx),
        GestureEvent::PointerDown { point, target } => pointer_down(state, *point, target, ctx),
        GestureEvent::PointerMove(point) => pointer_move(state, *point, ctx),
        GestureEvent::PointerUp(point) => pointer_up(state, *point, ctx),
        GestureEvent::PointerCancel => match state {
            GestureState::Placing { .. } => Step::stay(&GestureState::Placing { press: None }),
            GestureState::PanningView { .. } | GestureState::DraggingLabel { .. } => {
                Step::to(GestureState::settle(state.resumes_placing()))
            }
            GestureState::Idle | GestureState::Pinching { .. } => Step::stay(state),
        },
        GestureEvent::TouchStart(touches) => touch_start(state, touches, ctx),
        GestureEvent::TouchMove(touches) => touch_move(state, touches),
        GestureEvent::TouchEnd { remaining } => match state {
            GestureState::Pinching { resume_placing, .. } if *remaining < 2 => {
                Step::to(GestureState::settle(*resume_placing))
            }
            _ => Step::stay(state),
        },
        GestureEvent::Wheel { delta_y, modifier } => {
            if !*modifier {
                return Step::stay(state);
            }
            let zoom = clamp_zoom(ctx.zoom - delta_y * WHEEL_ZOOM_FACTOR);
            Step::to(state.clone()).with(Effect::SetZoom(zoom))
        }
    }
}

fn toggle_placing(state: &GestureState, ctx: &GestureContext) -> Step {
    match state {
        GestureState::Idle if !ctx.read_only => Step::to(GestureState::Placing { press: None }),
        GestureState::Placing { .. } => Step::to(GestureState::Idle),
        _ => Step::stay(state),
    }
}

fn pointer_down(
    state: &GestureState,
    point: ScreenPoint,
    target: &PointerTarget,
    ctx: &GestureContext,
) -> Step {
    match (state, target) {
        (GestureState::Idle | GestureState::Placing { .. }, PointerTarget::Label(id))
            if !ctx.read_only =>
        {
            Step::to(GestureState::DraggingLabel {
                id: id.clone(),
                last: point,
                resume_placing: state.is_placing(),
            })
        }
        (GestureState::Placing { .. }, PointerTarget::Image | PointerTarget::Label(_)) => {
            Step::to(GestureState::Placing { press: Some(point) })
        }
        (GestureState::Idle, PointerTarget::Image | PointerTarget::Label(_))
            if ctx.zoom > MIN_ZOOM =>
        {
            Step::to(GestureState::PanningView {
                origin: point,
                start_scroll: ctx.scroll,
            })
        }
        _ => Step::stay(state),
    }
}

fn pointer_move(state: &GestureState, point: ScreenPoint, ctx: &GestureContext) -> Step {
    match state {
        GestureState::PanningView {
            origin,
            start_scroll,
        } => {
            let (dx, dy) = origin.delta_to(point);
            let scroll = ScrollOffset::new(start_scroll.left - dx, start_scroll.top - dy);
            Step::to(state.clone()).with(Effect::ScrollTo(scroll))
        }
        GestureState::DraggingLabel {
            id,
            last,
            resume_placing,
        } => {
            let next = Step::to(GestureState::DraggingLabel {
                id: id.clone(),
                last: point,
                resume_placing: *resume_placing,
            });
            let (px, py) = last.delta_to(point);
            match delta_to_percent(px, py, &ctx.image) {
                Some((dx, dy)) => next.with(Effect::MoveAnnotation { id: id.clone(), dx, dy }),
                None => next,
            }
        }
        _ => Step::stay(state),
    }
}

fn pointer_up(state: &GestureState, point: ScreenPoint, ctx: &GestureContext) -> Step {
    match state {
        GestureState::Placing { press: Some(press) } => {
            let still_placing = Step::to(GestureState::Placing { press: None });
            if ctx.read_only || press.distance_to(point) > TAP_TOLERANCE_PX {
                return still_placing;
            }
            match to_percent(point, &ctx.image) {
                Some(at) => Step::to(GestureState::Idle)
                    .with(Effect::CreateAnnotation { x: at.x, y: at.y }),
                None => still_placing,
            }
        }
        GestureState::PanningView { .. } | GestureState::DraggingLabel { .. } => {
            Step::to(GestureState::settle(state.resumes_placing()))
        }
        _ => Step::stay(state),
    }
}

/// Spread between exactly two fingers. Any other touch count is not a
/// pinch sample.
fn finger_distance(touches: &[ScreenPoint]) -> Option<f64> {
    match touches {
        [a, b] => Some(a.distance_to(*b)),
        _ => None,
    }
}

fn touch_start(state: &GestureState, touches: &[ScreenPoint], ctx: &GestureContext) -> Step {
    let Some(distance) = finger_distance(touches) else {
        return Step::stay(state);
    };
    Step::to(GestureState::Pinching {
        initial_distance: distance,
        initial_zoom: ctx.zoom,
        resume_placing: state.resumes_placing(),
    })
}

fn touch_move(state: &GestureState, touches: &[ScreenPoint]) -> Step {
    let GestureState::Pinching {
        initial_distance,
        initial_zoom,
        ..
    } = state
    else {
        return Step::stay(state);
    };
    let step = Step::to(state.clone());
    match finger_distance(touches) {
        Some(distance) if *initial_distance > 0.0 => {
            step.with(Effect::SetZoom(clamp_zoom(initial_zoom * distance / initial_distance)))
        }
        _ => step,
    }
}
