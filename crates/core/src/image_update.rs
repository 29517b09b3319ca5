//! Single-field partial updates of an image record.
//!
//! A PATCH body must name exactly one of `description`, `notes` or
//! `annotations`. The body is parsed into an [`ImageUpdate`] before anything
//! touches the record store, so every update path is one explicit variant.

use serde::Serialize;
use serde_json::Value;

use crate::annotation::{validate_annotations, Annotation};
use crate::error::CoreError;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 2_000;

/// Maximum notes length, in characters.
pub const MAX_NOTES_LENGTH: usize = 20_000;

/// Field names recognised in a PATCH body.
pub const UPDATABLE_FIELDS: &[&str] = &["description", "notes", "annotations"];

/// One independently writable sub-resource of an image.
///
/// Serializes to the PATCH body shape, e.g. `{"notes": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ImageUpdate {
    #[serde(rename = "description")]
    SetDescription(String),
    #[serde(rename = "notes")]
    SetNotes(String),
    #[serde(rename = "annotations")]
    SetAnnotations(Vec<Annotation>),
}

impl ImageUpdate {
    /// Parse and validate a PATCH body.
    ///
    /// Unrecognised keys are ignored. Zero or several recognised keys is a
    /// validation error, as is a value of the wrong type.
    pub fn from_json(body: &Value) -> Result<Self, CoreError> {
        let obj = body.as_object().ok_or_else(|| {
            CoreError::Validation("request body must be a JSON object".to_string())
        })?;

        let present: Vec<&str> = UPDATABLE_FIELDS
            .iter()
            .copied()
            .filter(|field| obj.contains_key(*field))
            .collect();

        let field = match present.as_slice() {
            [] => {
                return Err(CoreError::Validation(format!(
                    "No valid fields to update. Expected one of: {}",
                    UPDATABLE_FIELDS.join(", ")
                )))
            }
            [single] => *single,
            several => {
                return Err(CoreError::Validation(format!(
                    "Only one field may be updated per request, got: {}",
                    several.join(", ")
                )))
            }
        };

        let value = &obj[field];
        let update = match field {
            "description" => Self::SetDescription(expect_string(field, value)?),
            "notes" => Self::SetNotes(expect_string(field, value)?),
            _ => {
                let annotations: Vec<Annotation> = serde_json::from_value(value.clone())
                    .map_err(|e| {
                        CoreError::Validation(format!("annotations is malformed: {e}"))
                    })?;
                Self::SetAnnotations(annotations)
            }
        };

        update.validate()?;
        Ok(update)
    }

    /// The record field this update writes.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::SetDescription(_) => "description",
            Self::SetNotes(_) => "notes",
            Self::SetAnnotations(_) => "annotations",
        }
    }

    /// Check length and content limits for the carried value.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::SetDescription(text) => check_length("description", text, MAX_DESCRIPTION_LENGTH),
            Self::SetNotes(text) => check_length("notes", text, MAX_NOTES_LENGTH),
            Self::SetAnnotations(list) => validate_annotations(list),
        }
    }
}

fn expect_string(field: &str, value: &Value) -> Result<String, CoreError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CoreError::Validation(format!("{field} must be a string")))
}

fn check_length(field: &str, text: &str, max: usize) -> Result<(), CoreError> {
    let len = text.chars().count();
    if len > max {
        return Err(CoreError::Validation(format!(
            "{field} is {len} characters, maximum is {max}"
        )));
    }
    Ok(())
}
