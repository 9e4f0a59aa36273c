//! Request validation, run before any generation is attempted.

use crate::error::ValidationError;
use crate::model::{CookingRequest, IngredientSwap};

pub const MIN_INGREDIENTS: usize = 3;
pub const MIN_MINUTES: u32 = 5;
pub const MAX_DAYS: u8 = 3;

/// Return every problem with `request`, in a stable order. Empty means the
/// request is acceptable.
pub fn validate(request: &CookingRequest) -> Vec<String> {
    let mut errors = Vec::new();
    if request.ingredients.len() < MIN_INGREDIENTS {
        errors.push(format!("Add at least {MIN_INGREDIENTS} ingredients."));
    }
    if !(1..=MAX_DAYS).contains(&request.days) {
        errors.push(format!("Plan length must be between 1 and {MAX_DAYS} days."));
    }
    if request.time_available < MIN_MINUTES {
        errors.push(format!("Cooking time must be at least {MIN_MINUTES} minutes."));
    }
    errors
}

/// Problems with a swap selection.
pub fn validate_swaps(swaps: &[IngredientSwap]) -> Vec<String> {
    if swaps.iter().all(|s| s.ingredient.trim().is_empty()) {
        return vec!["Select at least one ingredient to swap.".to_string()];
    }
    Vec::new()
}

/// [`validate`] as a `Result`.
pub fn ensure_valid(request: &CookingRequest) -> Result<(), ValidationError> {
    into_result(validate(request))
}

pub(crate) fn into_result(messages: Vec<String>) -> Result<(), ValidationError> {
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { messages })
    }
}
