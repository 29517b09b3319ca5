//! Experiment numbering and naming rules.

use crate::error::CoreError;
use crate::types::ExperimentNumber;

/// Lowest valid experiment number.
pub const MIN_EXPERIMENT_NUMBER: ExperimentNumber = 1;

/// Maximum experiment name length, in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Validate that an experiment number is at least [`MIN_EXPERIMENT_NUMBER`].
pub fn validate_experiment_number(number: ExperimentNumber) -> Result<(), CoreError> {
    if number < MIN_EXPERIMENT_NUMBER {
        return Err(CoreError::Validation(format!(
            "Invalid experiment number {number}. Must be {MIN_EXPERIMENT_NUMBER} or greater"
        )));
    }
    Ok(())
}

/// Parse an experiment number from a URL path segment.
pub fn parse_experiment_number(raw: &str) -> Result<ExperimentNumber, CoreError> {
    let number: ExperimentNumber = raw
        .trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("Invalid experiment number '{raw}'")))?;
    validate_experiment_number(number)?;
    Ok(number)
}

/// The number assigned when a new experiment does not supply one:
/// one past the highest existing number, or 1 when there are none.
pub fn next_experiment_number(
    existing: impl IntoIterator<Item = ExperimentNumber>,
) -> ExperimentNumber {
    existing
        .into_iter()
        .max()
        .map_or(MIN_EXPERIMENT_NUMBER, |highest| highest + 1)
}

/// Name given to experiments created implicitly by an upload.
pub fn default_experiment_name(number: ExperimentNumber) -> String {
    format!("Experiment {number}")
}

/// Trim an experiment name and check it is non-empty and within limits.
pub fn normalize_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Experiment name is required".to_string(),
        ));
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Experiment name is {len} characters, maximum is {MAX_NAME_LENGTH}"
        )));
    }
    Ok(trimmed.to_string())
}
