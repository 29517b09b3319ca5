//! Positioned image labels and their validation rules.
//!
//! An [`Annotation`] is a text label pinned to a point on an image. The point
//! is stored as percentages of the unscaled image's width and height, measured
//! from its top-left corner, so it stays valid at every display size.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lowest valid coordinate percentage.
pub const MIN_PERCENT: f64 = 0.0;

/// Highest valid coordinate percentage.
pub const MAX_PERCENT: f64 = 100.0;

/// Dragged labels never sit closer than this to the left/top edge.
pub const DRAG_MIN_PERCENT: f64 = 1.0;

/// Dragged labels never sit closer than this to the right/bottom edge.
pub const DRAG_MAX_PERCENT: f64 = 99.0;

/// Maximum number of annotations stored on a single image.
pub const MAX_ANNOTATIONS_PER_IMAGE: usize = 500;

/// Maximum label length, in characters.
pub const MAX_LABEL_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Label size
// ---------------------------------------------------------------------------

/// Display-size hint for a label.
///
/// Older records use the short forms `sm` / `md` / `lg`; both spellings are
/// accepted, the long form is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSize {
    #[serde(alias = "sm")]
    Small,
    #[default]
    #[serde(alias = "md")]
    Medium,
    #[serde(alias = "lg")]
    Large,
}

impl LabelSize {
    /// Next size in the `small -> medium -> large -> small` cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Small => Self::Medium,
            Self::Medium => Self::Large,
            Self::Large => Self::Small,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Single-letter badge shown on the size toggle (`S`, `M`, `L`).
    pub fn badge(self) -> char {
        match self {
            Self::Small => 'S',
            Self::Medium => 'M',
            Self::Large => 'L',
        }
    }
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// A positioned text label on an image.
///
/// This is also the exact wire shape: `{id, x, y, label, size}`. Unknown
/// fields on input (such as the retired `labelX` / `labelY`) are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub size: LabelSize,
}

impl Annotation {
    /// A new unlabeled marker at `(x, y)` with the default size.
    pub fn unlabeled(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            label: String::new(),
            size: LabelSize::default(),
        }
    }

    /// Whether the label carries any non-whitespace text.
    ///
    /// Unlabeled annotations are provisional markers, not content.
    pub fn is_labeled(&self) -> bool {
        !self.label.trim().is_empty()
    }

    /// Shift the annotation by a percentage delta, keeping it inside the
    /// drag range on both axes.
    pub fn shift(&mut self, dx: f64, dy: f64) {
        self.x = clamp_to_drag_range(self.x + dx);
        self.y = clamp_to_drag_range(self.y + dy);
    }
}

/// Clamp a coordinate to `[DRAG_MIN_PERCENT, DRAG_MAX_PERCENT]`.
///
/// Non-finite input collapses to the nearest bound (NaN to the minimum).
pub fn clamp_to_drag_range(value: f64) -> f64 {
    if value.is_nan() {
        return DRAG_MIN_PERCENT;
    }
    value.clamp(DRAG_MIN_PERCENT, DRAG_MAX_PERCENT)
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate a coordinate percentage: finite and within `[0, 100]`.
pub fn validate_percent(axis: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "{axis} must be a finite number"
        )));
    }
    if !(MIN_PERCENT..=MAX_PERCENT).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{axis} must be between {MIN_PERCENT} and {MAX_PERCENT}, got {value}"
        )));
    }
    Ok(())
}

/// Validate a single annotation.
pub fn validate_annotation(annotation: &Annotation) -> Result<(), CoreError> {
    if annotation.id.trim().is_empty() {
        return Err(CoreError::Validation(
            "annotation id must not be empty".to_string(),
        ));
    }
    validate_percent("x", annotation.x)?;
    validate_percent("y", annotation.y)?;

    let label_len = annotation.label.chars().count();
    if label_len > MAX_LABEL_LENGTH {
        return Err(CoreError::Validation(format!(
            "label is {label_len} characters, maximum is {MAX_LABEL_LENGTH}"
        )));
    }
    Ok(())
}

/// Validate a full annotation list as sent on save.
///
/// Checks the list length, every element, and id uniqueness.
pub fn validate_annotations(annotations: &[Annotation]) -> Result<(), CoreError> {
    if annotations.len() > MAX_ANNOTATIONS_PER_IMAGE {
        return Err(CoreError::Validation(format!(
            "annotations has {} elements, maximum is {MAX_ANNOTATIONS_PER_IMAGE}",
            annotations.len()
        )));
    }

    let mut seen = HashSet::with_capacity(annotations.len());
    for (i, annotation) in annotations.iter().enumerate() {
        validate_annotation(annotation).map_err(|e| match e {
            CoreError::Validation(msg) => CoreError::Validation(format!("annotations[{i}]: {msg}")),
            other => other,
        })?;
        if !seen.insert(annotation.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "annotations[{i}] reuses id '{}'",
                annotation.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
