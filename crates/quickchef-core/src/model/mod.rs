//! Domain model: cooking requests coming in, meal plans going out.
//!
//! Plan types mirror the JSON the model is asked to produce (camelCase keys);
//! request types use snake_case tags so they read naturally in request files.

pub mod plan;
pub mod request;

pub use plan::{
    BudgetSummary, BudgetVerdict, DayMeals, DayNutrition, DayPlan, GroceryCategory, GroceryItem,
    Meal, MealPlan, MealSlot, Nutrition, NutritionSummary, PrepChecklist, ScheduleItem,
    Substitution, TaskKind,
};
pub use request::{
    BudgetLevel, CookingGoal, CookingRequest, DayType, Diet, EffortLevel, IngredientSwap,
    KitchenSetup, PantryItem, Persona, ProteinLevel,
};

/// Error returned when parsing an unknown tag into one of the model enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?} (expected one of: {expected})")]
pub struct TagParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Declares a closed set of string tags with serde, `Display`, `FromStr` and
/// the literal list used by the output schema.
macro_rules! string_tags {
    (
        $(#[$meta:meta])*
        $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $tag)] $variant, )+
        }

        impl $name {
            /// Every tag, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($tag),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $tag, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::model::TagParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $tag => Ok(Self::$variant), )+
                    other => Err($crate::model::TagParseError {
                        kind: $kind,
                        value: other.to_owned(),
                        expected: Self::VALUES.join(", "),
                    }),
                }
            }
        }
    };
}

pub(crate) use string_tags;

/// Deserialize a non-negative whole number that the model may have written
/// as a float (`30`, `30.0`).
pub(crate) fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) || value.fract() != 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        )));
    }
    Ok(value as u32)
}
