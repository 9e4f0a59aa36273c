//! The cooking request: everything a consumer tells us before a plan is
//! generated.

use serde::{Deserialize, Serialize};

use super::string_tags;

string_tags! {
    /// Who the plan is for. Drives the wizard defaults in
    /// [`CookingRequest::for_persona`].
    Persona as "persona" {
        Student => "student",
        Professional => "professional",
        Family => "family",
    }
}

string_tags! {
    /// What the user wants to optimize for.
    CookingGoal as "goal" {
        SaveTime => "save_time",
        SaveMoney => "save_money",
        EatHealthy => "eat_healthy",
        BuildMuscle => "build_muscle",
    }
}

string_tags! {
    Diet as "diet" {
        Veg => "veg",
        Any => "any",
        NonVeg => "non_veg",
        Vegan => "vegan",
    }
}

string_tags! {
    /// Equipment tier. `basic` means no oven and no air fryer.
    KitchenSetup as "kitchen setup" {
        Basic => "basic",
        Medium => "medium",
        Full => "full",
    }
}

string_tags! {
    /// Energy level of the cooking day.
    DayType as "day type" {
        LowEnergy => "low_energy",
        Normal => "normal",
        HighEnergy => "high_energy",
        BusyWorkday => "busy_workday",
        RelaxedDay => "relaxed_day",
    }
}

string_tags! {
    BudgetLevel as "budget level" {
        Low => "low",
        Medium => "medium",
        Flexible => "flexible",
    }
}

string_tags! {
    EffortLevel as "effort level" {
        Minimal => "minimal",
        Balanced => "balanced",
        Ambitious => "ambitious",
    }
}

string_tags! {
    ProteinLevel as "protein level" {
        Normal => "normal",
        High => "high",
    }
}

/// A pantry ingredient. Locked items must appear somewhere in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PantryItem {
    pub name: String,
    #[serde(default)]
    pub locked: bool,
}

impl PantryItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locked: false,
        }
    }

    pub fn locked(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locked: true,
        }
    }
}

/// One ingredient swap inside a meal. `replacement = None` lets the model
/// pick the best substitute for the diet and budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientSwap {
    pub ingredient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl IngredientSwap {
    /// Build a swap, treating a blank replacement as "model's choice".
    pub fn new(ingredient: impl Into<String>, replacement: Option<&str>) -> Self {
        Self {
            ingredient: ingredient.into(),
            replacement: replacement
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        }
    }

    /// Parse the `ingredient[=replacement]` form used on the command line.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((ingredient, replacement)) => Self::new(ingredient.trim(), Some(replacement)),
            None => Self::new(spec.trim(), None),
        }
    }
}

/// An immutable planning request.
///
/// Field order of `goals`, `dislikes` and `ingredients` carries no meaning;
/// see [`crate::identity`] for which fields take part in request equivalence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookingRequest {
    pub persona: Persona,
    pub goals: Vec<CookingGoal>,
    pub diet: Diet,
    pub dislikes: Vec<String>,
    pub ingredients: Vec<PantryItem>,
    /// Minutes available per meal.
    pub time_available: u32,
    pub kitchen_setup: KitchenSetup,
    pub day_type: DayType,
    /// Number of days to plan, 1 to 3.
    pub days: u8,
    pub budget_level: BudgetLevel,
    pub effort_level: EffortLevel,
    pub protein_level: ProteinLevel,
}

impl Default for CookingRequest {
    fn default() -> Self {
        Self {
            persona: Persona::Professional,
            goals: vec![CookingGoal::SaveTime],
            diet: Diet::Veg,
            dislikes: Vec::new(),
            ingredients: Vec::new(),
            time_available: 30,
            kitchen_setup: KitchenSetup::Basic,
            day_type: DayType::Normal,
            days: 3,
            budget_level: BudgetLevel::Medium,
            effort_level: EffortLevel::Balanced,
            protein_level: ProteinLevel::Normal,
        }
    }
}

impl CookingRequest {
    /// Start a request from the defaults associated with a persona.
    pub fn for_persona(persona: Persona) -> Self {
        let mut request = Self {
            persona,
            ..Self::default()
        };
        match persona {
            Persona::Student => {
                request.budget_level = BudgetLevel::Low;
                request.kitchen_setup = KitchenSetup::Basic;
                request.goals = vec![CookingGoal::SaveMoney];
                request.effort_level = EffortLevel::Minimal;
            }
            Persona::Professional => {
                request.time_available = 30;
                request.budget_level = BudgetLevel::Flexible;
                request.goals = vec![CookingGoal::SaveTime];
                request.effort_level = EffortLevel::Balanced;
            }
            Persona::Family => {
                request.kitchen_setup = KitchenSetup::Full;
                request.goals = vec![CookingGoal::EatHealthy];
                request.effort_level = EffortLevel::Balanced;
            }
        }
        request
    }

    /// Add a pantry ingredient. Names are trimmed and lowercased; blanks and
    /// duplicates are ignored. Returns `true` if the item was added.
    pub fn add_ingredient(&mut self, name: &str, locked: bool) -> bool {
        let name = normalize_name(name);
        if name.is_empty() || self.ingredients.iter().any(|i| i.name == name) {
            return false;
        }
        self.ingredients.push(PantryItem { name, locked });
        true
    }

    /// Add a disliked ingredient with the same normalization as
    /// [`Self::add_ingredient`].
    pub fn add_dislike(&mut self, name: &str) -> bool {
        let name = normalize_name(name);
        if name.is_empty() || self.dislikes.contains(&name) {
            return false;
        }
        self.dislikes.push(name);
        true
    }

    /// Re-apply name normalization to every ingredient and dislike, keeping
    /// the first occurrence of each name. Used for requests loaded from files.
    pub fn normalized(self) -> Self {
        let mut out = Self {
            ingredients: Vec::with_capacity(self.ingredients.len()),
            dislikes: Vec::with_capacity(self.dislikes.len()),
            ..self.clone()
        };
        for item in &self.ingredients {
            out.add_ingredient(&item.name, item.locked);
        }
        for dislike in &self.dislikes {
            out.add_dislike(dislike);
        }
        out
    }

    pub fn locked_ingredients(&self) -> impl Iterator<Item = &str> {
        self.ingredients
            .iter()
            .filter(|i| i.locked)
            .map(|i| i.name.as_str())
    }

    pub fn unlocked_ingredients(&self) -> impl Iterator<Item = &str> {
        self.ingredients
            .iter()
            .filter(|i| !i.locked)
            .map(|i| i.name.as_str())
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
