//! Prompt construction for plan, replacement and swap generations.
//!
//! Pure string assembly: no I/O. Each builder pairs with a schema from
//! [`crate::schema`]; the coordinator sends both through a
//! [`crate::generator::Generator`].

use crate::model::{CookingRequest, IngredientSwap, Meal};

/// Criterion used when a replacement is requested without one.
pub const DEFAULT_REPLACE_CRITERIA: &str = "Variety / Different Style";

/// Instruction text for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Standing rules for the model, sent separately from the contents when
    /// present.
    pub system_instruction: Option<String>,
    pub contents: String,
}

impl Prompt {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            contents: contents.into(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

// ---------------------------------------------------------------------------
// Full plan
// ---------------------------------------------------------------------------

fn plan_system_instruction(request: &CookingRequest) -> String {
    let goals: Vec<&str> = request.goals.iter().map(|g| g.as_str()).collect();

    let mut out = String::new();
    out.push_str(&format!(
        "You are a smart cooking assistant for a {}.\n",
        request.persona
    ));
    out.push_str(&format!(
        "Constraint: Kitchen Setup is {}.\n",
        request.kitchen_setup
    ));
    out.push_str("Rules:\n");
    out.push_str(
        "- If setup is 'basic', NO OVEN, NO AIR FRYER. Use pressure cooker or stovetop.\n",
    );
    out.push_str(&format!("- Respect Budget: {}.\n", request.budget_level));
    out.push_str(&format!("- Effort Level: {}.\n", request.effort_level));
    out.push_str(&format!(
        "- Protein Preference: {}.\n",
        request.protein_level
    ));
    out.push_str(&format!("- Goal: {}.\n", goals.join(", ")));
    out
}

/// Build the prompt for a complete plan. Locked pantry items are listed
/// separately as mandatory.
pub fn plan_prompt(request: &CookingRequest) -> Prompt {
    let mut out = String::new();
    out.push_str(&format!("Generate a {}-day meal plan.\n\n", request.days));

    out.push_str("CONTEXT:\n");
    out.push_str(&format!("- Persona: {}\n", request.persona));
    out.push_str(&format!("- Diet: {}\n", request.diet));
    out.push_str(&format!(
        "- Dislikes: {}\n",
        join_or_none(request.dislikes.iter().map(String::as_str))
    ));
    out.push_str(&format!("- Time/Meal: {}m\n", request.time_available));
    out.push_str(&format!("- Day type: {}\n", request.day_type));
    out.push_str(&format!(
        "- Effort: {} (adjust complexity accordingly)\n",
        request.effort_level
    ));
    out.push_str(&format!("- Protein: {}\n\n", request.protein_level));

    out.push_str("PANTRY RULES:\n");
    out.push_str(&format!(
        "1. MUST USE (Locked): {}\n",
        join_or_none(request.locked_ingredients())
    ));
    out.push_str(&format!(
        "2. Available: {}\n\n",
        join_or_none(request.unlocked_ingredients())
    ));

    out.push_str("OUTPUT REQUIREMENTS:\n");
    out.push_str("- Breakfast, lunch and dinner for every day.\n");
    out.push_str("- Detailed step-by-step recipes (6-10 steps).\n");
    out.push_str(&format!(
        "- Cooking methods MUST match kitchen setup ({}).\n",
        request.kitchen_setup
    ));
    out.push_str("- Reuse ingredients across meals to reduce cost.\n");
    out.push_str("- Group grocery items by category.\n");
    out.push_str("- Include schedule (shop/prep/cook) optimization.\n");
    out.push_str("- Return ONLY valid JSON matching the schema.\n");

    Prompt::new(out).with_system_instruction(plan_system_instruction(request))
}

// ---------------------------------------------------------------------------
// Single meal
// ---------------------------------------------------------------------------

/// Build the prompt asking for a different meal in place of `meal`.
///
/// A blank `criteria` falls back to [`DEFAULT_REPLACE_CRITERIA`].
pub fn replace_meal_prompt(meal: &Meal, criteria: &str, request: &CookingRequest) -> Prompt {
    let criteria = match criteria.trim() {
        "" => DEFAULT_REPLACE_CRITERIA,
        c => c,
    };

    let mut out = String::new();
    out.push_str("Replace this recipe with a DIFFERENT one.\n");
    out.push_str(&format!(
        "Original Meal: {} ({})\n\n",
        meal.name, meal.description
    ));
    out.push_str(&format!("Replacement Criteria: \"{criteria}\"\n\n"));

    out.push_str("Constraints:\n");
    out.push_str(&format!("- Diet: {}\n", request.diet));
    out.push_str(&format!("- Kitchen: {}\n", request.kitchen_setup));
    out.push_str(&format!("- Effort: {}\n", request.effort_level));
    out.push_str(&format!("- Protein: {}\n\n", request.protein_level));

    out.push_str("Output:\n");
    out.push_str("- Fully updated JSON for the single Meal object.\n");
    out.push_str("- Maintain strict schema.\n");
    out.push_str("- Generate a NEW unique ID.\n");
    Prompt::new(out)
}

fn swap_line(swap: &IngredientSwap, request: &CookingRequest) -> String {
    match &swap.replacement {
        Some(replacement) => format!(
            "- Replace \"{}\" with \"{}\"",
            swap.ingredient, replacement
        ),
        None => format!(
            "- Replace \"{}\" with the BEST SUBSTITUTE fitting the diet ({}) and budget ({}).",
            swap.ingredient, request.diet, request.budget_level
        ),
    }
}

/// Build the prompt that rewrites `meal` with the given ingredient swaps.
pub fn swap_prompt(meal: &Meal, swaps: &[IngredientSwap], request: &CookingRequest) -> Prompt {
    // Meal only holds strings and integers, so serialization cannot fail.
    let original = serde_json::to_string(meal).unwrap_or_default();
    let pantry: Vec<&str> = request.ingredients.iter().map(|i| i.name.as_str()).collect();

    let mut out = String::new();
    out.push_str("Modify this recipe based on user swaps.\n");
    out.push_str(&format!("Original Recipe: {original}\n\n"));

    out.push_str("User Swaps:\n");
    for swap in swaps {
        out.push_str(&swap_line(swap, request));
        out.push('\n');
    }
    out.push('\n');

    out.push_str("Constraints:\n");
    out.push_str(&format!("- Diet: {}\n", request.diet));
    out.push_str(&format!("- Kitchen: {}\n", request.kitchen_setup));
    out.push_str(&format!("- Pantry: {}\n\n", pantry.join(", ")));

    out.push_str("Output:\n");
    out.push_str("- Fully updated JSON for the single Meal object.\n");
    out.push_str("- Recalculate nutrition, stepByStepRecipe, and ingredient quantities.\n");
    out.push_str(&format!("- Keep ID same as original: \"{}\"\n", meal.id));
    Prompt::new(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
