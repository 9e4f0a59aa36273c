//! Meal plan types as produced by the model and refined by us.

use serde::{Deserialize, Serialize};

use super::request::BudgetLevel;
use super::{string_tags, whole_number};
use crate::error::SpliceError;

string_tags! {
    /// Grocery aisle grouping.
    GroceryCategory as "grocery category" {
        Produce => "produce",
        Protein => "protein",
        Pantry => "pantry",
        Dairy => "dairy",
        Grains => "grains",
        Other => "other",
    }
}

string_tags! {
    BudgetVerdict as "budget verdict" {
        Feasible => "feasible",
        Tight => "tight",
        Stretch => "stretch",
    }
}

string_tags! {
    /// The three meals of a day. Used to address a meal inside a plan.
    MealSlot as "meal slot" {
        Breakfast => "breakfast",
        Lunch => "lunch",
        Dinner => "dinner",
    }
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];
}

/// Type of a schedule task.
///
/// The output schema only admits `shop`, `prep` and `cook`; anything else
/// decodes as [`TaskKind::Other`] and sorts with shopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Shop,
    Prep,
    Cook,
    #[serde(other)]
    Other,
}

impl TaskKind {
    /// Tags the model may emit.
    pub const VALUES: &'static [&'static str] = &["shop", "prep", "cook"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shop => "shop",
            Self::Prep => "prep",
            Self::Cook => "cook",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub calories_range: String,
    pub protein_range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepChecklist {
    pub washing: Vec<String>,
    pub chopping: Vec<String>,
    pub marinating: Vec<String>,
}

/// A single recipe inside a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    /// Opaque id. Kept across ingredient swaps, re-minted on replacement.
    pub id: String,
    pub name: String,
    pub description: String,
    pub cooking_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_alternatives: Option<Vec<String>>,
    #[serde(deserialize_with = "whole_number")]
    pub prep_time_minutes: u32,
    #[serde(deserialize_with = "whole_number")]
    pub cooking_time_minutes: u32,
    pub todo_list: Vec<String>,
    pub step_by_step_recipe: Vec<String>,
    pub prep_checklist: PrepChecklist,
    pub cooking_sequence: Vec<String>,
    pub used_ingredients: Vec<String>,
    pub nutrition: Nutrition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leftover_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMeals {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
}

impl DayMeals {
    pub fn get(&self, slot: MealSlot) -> &Meal {
        match slot {
            MealSlot::Breakfast => &self.breakfast,
            MealSlot::Lunch => &self.lunch,
            MealSlot::Dinner => &self.dinner,
        }
    }

    pub fn get_mut(&mut self, slot: MealSlot) -> &mut Meal {
        match slot {
            MealSlot::Breakfast => &mut self.breakfast,
            MealSlot::Lunch => &mut self.lunch,
            MealSlot::Dinner => &mut self.dinner,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MealSlot, &Meal)> {
        MealSlot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(deserialize_with = "whole_number")]
    pub day: u32,
    pub meals: DayMeals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItem {
    pub ingredient: String,
    /// `false` when the user already has it in the pantry.
    pub needed: bool,
    #[serde(deserialize_with = "whole_number")]
    pub used_in_meals: u32,
    pub category: GroceryCategory,
}

/// A shop/prep/cook task on the plan's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(deserialize_with = "whole_number")]
    pub day: u32,
    /// Free text from the model (e.g. "Sunday evening"); cook tasks are
    /// rewritten to `Day N @ HH:00` by the schedule refiner.
    pub time_block: String,
    pub description: String,
    #[serde(deserialize_with = "whole_number")]
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub original: String,
    pub substitute: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub level: BudgetLevel,
    pub verdict: BudgetVerdict,
    pub strategy: Vec<String>,
}

impl Default for BudgetSummary {
    fn default() -> Self {
        Self {
            level: BudgetLevel::Medium,
            verdict: BudgetVerdict::Feasible,
            strategy: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNutrition {
    #[serde(deserialize_with = "whole_number")]
    pub day: u32,
    pub calories_range: String,
    pub protein_range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionSummary {
    pub per_day: Vec<DayNutrition>,
}

/// A complete multi-day plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub days: Vec<DayPlan>,
    pub grocery_list: Vec<GroceryItem>,
    pub schedule: Vec<ScheduleItem>,
    pub substitutions: Vec<Substitution>,
    pub budget_summary: BudgetSummary,
    pub nutrition_summary: NutritionSummary,
}

impl MealPlan {
    /// Look up a meal by zero-based day index and slot.
    pub fn meal(&self, day_index: usize, slot: MealSlot) -> Option<&Meal> {
        self.days.get(day_index).map(|d| d.meals.get(slot))
    }

    /// Like [`Self::meal`], but reports a missing day as an error.
    pub fn meal_at(&self, day_index: usize, slot: MealSlot) -> Result<&Meal, SpliceError> {
        self.meal(day_index, slot).ok_or(SpliceError::DayOutOfRange {
            day_index,
            days: self.days.len(),
        })
    }

    /// Replace the meal at `day_index`/`slot`, returning the previous meal.
    /// The rest of the plan is left untouched.
    pub fn splice_meal(
        &mut self,
        day_index: usize,
        slot: MealSlot,
        meal: Meal,
    ) -> Result<Meal, SpliceError> {
        let days = self.days.len();
        let day = self
            .days
            .get_mut(day_index)
            .ok_or(SpliceError::DayOutOfRange { day_index, days })?;
        Ok(std::mem::replace(day.meals.get_mut(slot), meal))
    }

    /// Iterate over every meal with its position.
    pub fn meals(&self) -> impl Iterator<Item = (usize, MealSlot, &Meal)> {
        self.days
            .iter()
            .enumerate()
            .flat_map(|(i, d)| d.meals.iter().map(move |(slot, meal)| (i, slot, meal)))
    }
}
