//! Output schemas: the contract the model's JSON must satisfy.
//!
//! A [`Schema`] is plain data. It is rendered into the request sent to the
//! generation service ([`Schema::to_json`]) and used again to check what
//! comes back ([`Schema::check`]) before the payload is decoded into typed
//! model values ([`Schema::decode`]).

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::GenerationError;
use crate::model::{BudgetLevel, BudgetVerdict, GroceryCategory, TaskKind};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A typed description of a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String {
        description: Option<&'static str>,
    },
    Number {
        description: Option<&'static str>,
    },
    Boolean {
        description: Option<&'static str>,
    },
    /// A string restricted to a fixed set of literals. When `strict` is
    /// false the literals are only offered to the model and [`Schema::check`]
    /// accepts any string.
    Enum {
        values: &'static [&'static str],
        strict: bool,
        description: Option<&'static str>,
    },
    Array {
        items: Box<Schema>,
        description: Option<&'static str>,
    },
    Object {
        fields: Vec<Field>,
        description: Option<&'static str>,
    },
}

/// A named member of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: true,
        }
    }

    pub fn optional(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: false,
        }
    }
}

/// The first place where a value departs from its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct SchemaViolation {
    /// JSON path of the offending value, rooted at `$`.
    pub path: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Schema {
    pub fn string() -> Self {
        Self::String { description: None }
    }

    pub fn number() -> Self {
        Self::Number { description: None }
    }

    pub fn boolean() -> Self {
        Self::Boolean { description: None }
    }

    pub fn enumeration(values: &'static [&'static str]) -> Self {
        Self::Enum {
            values,
            strict: true,
            description: None,
        }
    }

    /// Like [`Schema::enumeration`], but values outside the set still pass
    /// [`Schema::check`]. For fields whose Rust type has a catch-all variant.
    pub fn open_enumeration(values: &'static [&'static str]) -> Self {
        Self::Enum {
            values,
            strict: false,
            description: None,
        }
    }

    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Box::new(items),
            description: None,
        }
    }

    pub fn object(fields: Vec<Field>) -> Self {
        Self::Object {
            fields,
            description: None,
        }
    }

    /// Attach a description for the model.
    pub fn describe(mut self, text: &'static str) -> Self {
        match &mut self {
            Self::String { description }
            | Self::Number { description }
            | Self::Boolean { description }
            | Self::Enum { description, .. }
            | Self::Array { description, .. }
            | Self::Object { description, .. } => *description = Some(text),
        }
        self
    }

    fn description(&self) -> Option<&'static str> {
        match self {
            Self::String { description }
            | Self::Number { description }
            | Self::Boolean { description }
            | Self::Enum { description, .. }
            | Self::Array { description, .. }
            | Self::Object { description, .. } => *description,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } | Self::Enum { .. } => "STRING",
            Self::Number { .. } => "NUMBER",
            Self::Boolean { .. } => "BOOLEAN",
            Self::Array { .. } => "ARRAY",
            Self::Object { .. } => "OBJECT",
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl Schema {
    /// Render into the OpenAPI-subset dialect accepted as `responseSchema`
    /// by the generation service.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), Value::from(self.type_name()));
        if let Some(description) = self.description() {
            out.insert("description".into(), Value::from(description));
        }
        match self {
            Self::String { .. } | Self::Number { .. } | Self::Boolean { .. } => {}
            Self::Enum { values, .. } => {
                out.insert("enum".into(), Value::from(values.to_vec()));
            }
            Self::Array { items, .. } => {
                out.insert("items".into(), items.to_json());
            }
            Self::Object { fields, .. } => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|f| (f.name.to_string(), f.schema.to_json()))
                    .collect();
                let required: Vec<&str> = fields
                    .iter()
                    .filter(|f| f.required)
                    .map(|f| f.name)
                    .collect();
                let ordering: Vec<&str> = fields.iter().map(|f| f.name).collect();
                out.insert("properties".into(), Value::Object(properties));
                out.insert("required".into(), Value::from(required));
                out.insert("propertyOrdering".into(), Value::from(ordering));
            }
        }
        Value::Object(out)
    }
}

// ---------------------------------------------------------------------------
// Checking and decoding
// ---------------------------------------------------------------------------

impl Schema {
    /// Check `value` against this schema. Unknown object members are allowed;
    /// missing or `null` required members are not.
    pub fn check(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.check_at(value, "$")
    }

    fn check_at(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let violation = |message: String| SchemaViolation {
            path: path.to_string(),
            message,
        };
        match self {
            Self::String { .. } => {
                if !value.is_string() {
                    return Err(violation(format!("expected string, got {}", kind(value))));
                }
            }
            Self::Number { .. } => {
                if !value.is_number() {
                    return Err(violation(format!("expected number, got {}", kind(value))));
                }
            }
            Self::Boolean { .. } => {
                if !value.is_boolean() {
                    return Err(violation(format!("expected boolean, got {}", kind(value))));
                }
            }
            Self::Enum { values, strict, .. } => match value.as_str() {
                Some(s) if !strict || values.contains(&s) => {}
                Some(s) => {
                    return Err(violation(format!(
                        "{s:?} is not one of {}",
                        values.join("|")
                    )));
                }
                None => {
                    return Err(violation(format!("expected string, got {}", kind(value))));
                }
            },
            Self::Array { items, .. } => {
                let array = value
                    .as_array()
                    .ok_or_else(|| violation(format!("expected array, got {}", kind(value))))?;
                for (i, item) in array.iter().enumerate() {
                    items.check_at(item, &format!("{path}[{i}]"))?;
                }
            }
            Self::Object { fields, .. } => {
                let object = value
                    .as_object()
                    .ok_or_else(|| violation(format!("expected object, got {}", kind(value))))?;
                for field in fields {
                    let child_path = format!("{path}.{}", field.name);
                    match object.get(field.name) {
                        None | Some(Value::Null) if field.required => {
                            return Err(SchemaViolation {
                                path: child_path,
                                message: "missing required field".to_string(),
                            });
                        }
                        None | Some(Value::Null) => {}
                        Some(child) => field.schema.check_at(child, &child_path)?,
                    }
                }
            }
        }
        Ok(())
    }

    /// Parse `text`, check it against this schema and decode it as `T`.
    ///
    /// `expected` names the payload in error messages ("plan", "meal").
    pub fn decode<T: DeserializeOwned>(
        &self,
        expected: &'static str,
        text: &str,
    ) -> Result<T, GenerationError> {
        let payload = strip_code_fence(text.trim());
        if payload.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        let mismatch = |detail: String| GenerationError::SchemaMismatch { expected, detail };

        let value: Value =
            serde_json::from_str(payload).map_err(|e| mismatch(format!("invalid JSON: {e}")))?;
        if value.is_null() {
            return Err(GenerationError::EmptyResponse);
        }
        self.check(&value).map_err(|v| mismatch(v.to_string()))?;
        serde_json::from_value(value).map_err(|e| mismatch(e.to_string()))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Some models wrap JSON in a markdown fence even when asked not to.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ---------------------------------------------------------------------------
// Plan and meal schemas
// ---------------------------------------------------------------------------

fn string_list() -> Schema {
    Schema::array(Schema::string())
}

fn nutrition_range() -> Schema {
    Schema::object(vec![
        Field::required("caloriesRange", Schema::string()),
        Field::required("proteinRange", Schema::string()),
    ])
}

/// Schema of a single meal; reused by swap and replace.
pub fn meal_schema() -> Schema {
    Schema::object(vec![
        Field::required(
            "id",
            Schema::string().describe("Unique ID for this meal instance"),
        ),
        Field::required("name", Schema::string()),
        Field::required("description", Schema::string()),
        Field::required(
            "cookingMethod",
            Schema::string()
                .describe("e.g., Pan fry, Pressure cooker. NO OVEN for basic setup."),
        ),
        Field::optional(
            "equipmentAlternatives",
            string_list().describe("Alternative tools if main tool unavailable"),
        ),
        Field::required("prepTimeMinutes", Schema::number()),
        Field::required("cookingTimeMinutes", Schema::number()),
        Field::required("todoList", string_list()),
        Field::required(
            "stepByStepRecipe",
            string_list().describe("6-10 clear cooking steps"),
        ),
        Field::required(
            "prepChecklist",
            Schema::object(vec![
                Field::required("washing", string_list()),
                Field::required("chopping", string_list()),
                Field::required("marinating", string_list()),
            ]),
        ),
        Field::required("cookingSequence", string_list()),
        Field::required("usedIngredients", string_list()),
        Field::required("nutrition", nutrition_range()),
        Field::optional("leftoverStrategy", Schema::string()),
        Field::optional("swapOptions", string_list()),
    ])
}

pub fn grocery_item_schema() -> Schema {
    Schema::object(vec![
        Field::required("ingredient", Schema::string()),
        Field::required(
            "needed",
            Schema::boolean()
                .describe("True if not in pantry, False if user already has it"),
        ),
        Field::required("usedInMeals", Schema::number()),
        Field::required("category", Schema::enumeration(GroceryCategory::VALUES)),
    ])
}

pub fn schedule_item_schema() -> Schema {
    Schema::object(vec![
        Field::required("id", Schema::string()),
        Field::required("type", Schema::open_enumeration(TaskKind::VALUES)),
        Field::required("day", Schema::number()),
        Field::required("timeBlock", Schema::string()),
        Field::required("description", Schema::string()),
        Field::required("durationMinutes", Schema::number()),
    ])
}

pub fn substitution_schema() -> Schema {
    Schema::object(vec![
        Field::required("original", Schema::string()),
        Field::required("substitute", Schema::string()),
        Field::required("reason", Schema::string()),
    ])
}

pub fn budget_summary_schema() -> Schema {
    Schema::object(vec![
        Field::required("level", Schema::enumeration(BudgetLevel::VALUES)),
        Field::required("verdict", Schema::enumeration(BudgetVerdict::VALUES)),
        Field::required("strategy", string_list()),
    ])
}

pub fn nutrition_summary_schema() -> Schema {
    Schema::object(vec![Field::required(
        "perDay",
        Schema::array(Schema::object(vec![
            Field::required("day", Schema::number()),
            Field::required("caloriesRange", Schema::string()),
            Field::required("proteinRange", Schema::string()),
        ])),
    )])
}

/// Schema of a complete multi-day plan.
pub fn plan_schema() -> Schema {
    let day = Schema::object(vec![
        Field::required("day", Schema::number()),
        Field::required(
            "meals",
            Schema::object(vec![
                Field::required("breakfast", meal_schema()),
                Field::required("lunch", meal_schema()),
                Field::required("dinner", meal_schema()),
            ]),
        ),
    ]);

    Schema::object(vec![
        Field::required("days", Schema::array(day)),
        Field::required("groceryList", Schema::array(grocery_item_schema())),
        Field::required("schedule", Schema::array(schedule_item_schema())),
        Field::required("substitutions", Schema::array(substitution_schema())),
        Field::required("budgetSummary", budget_summary_schema()),
        Field::required("nutritionSummary", nutrition_summary_schema()),
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
