//! Error taxonomy for plan generation.

use std::time::Duration;

/// The request was rejected before any model call was attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid request: {}", .messages.join(" "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

/// A generation attempt failed.
///
/// `Clone` so that a single outcome can be handed to every caller that was
/// deduplicated onto the same generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model output does not match the {expected} schema: {detail}")]
    SchemaMismatch {
        expected: &'static str,
        detail: String,
    },

    #[error("generation service failed: {0}")]
    Service(String),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation task aborted: {0}")]
    Aborted(String),
}

/// Error returned by coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Error splicing a meal into an existing plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpliceError {
    #[error("day index {day_index} is out of range for a {days}-day plan")]
    DayOutOfRange { day_index: usize, days: usize },
}

/// Error moving a task on a plan's schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RescheduleError {
    #[error("no schedule task with id {0:?}")]
    UnknownTask(String),

    #[error("day {day} is outside the {days}-day plan")]
    DayOutOfRange { day: u32, days: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_joins_messages() {
        let err = ValidationError {
            messages: vec!["Add at least 3 ingredients.".into(), "Too short.".into()],
        };
        assert_eq!(
            err.to_string(),
            "invalid request: Add at least 3 ingredients. Too short."
        );
    }

    #[test]
    fn plan_error_is_transparent() {
        let err = PlanError::from(GenerationError::EmptyResponse);
        assert_eq!(err.to_string(), "model returned an empty response");
    }
}
