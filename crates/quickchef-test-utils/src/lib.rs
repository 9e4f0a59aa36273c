//! Shared test utilities for quickchef integration tests.
//!
//! Provides [`ScriptedGenerator`], a [`Generator`] that replays canned
//! replies and records every prompt it receives, plus JSON fixtures for
//! plans and meals that satisfy the output schemas.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use quickchef_core::generator::Generator;
use quickchef_core::model::{CookingRequest, PantryItem};
use quickchef_core::prompt::Prompt;
use quickchef_core::schema::Schema;

/// One scripted generator outcome.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return this text as the model output.
    Text(String),
    /// Fail with this message, as a transport or service error would.
    Fail(String),
    /// Never answer.
    Hang,
    /// Panic inside the generation task.
    Panic,
}

impl Reply {
    pub fn json(value: &Value) -> Self {
        Self::Text(value.to_string())
    }
}

/// A [`Generator`] that answers from a queue of [`Reply`] values.
///
/// When the queue runs dry, every further call fails. An optional gate
/// holds each call until a permit is released, which lets tests pile up
/// concurrent callers behind a single outstanding generation.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<Prompt>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedGenerator {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Hold every call until a permit is added to `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &Prompt, _schema: &Schema) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.map_err(|e| anyhow!("gate closed: {e}"))?;
            permit.forget();
        }

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => bail!(message),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Panic) => panic!("scripted generator panic"),
            None => bail!("scripted generator has no replies left"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A valid one-day request over the given pantry items.
pub fn sample_request(ingredients: &[&str]) -> CookingRequest {
    CookingRequest {
        days: 1,
        ingredients: ingredients.iter().map(|n| PantryItem::new(*n)).collect(),
        ..CookingRequest::default()
    }
}

/// A meal payload that satisfies the meal schema.
pub fn sample_meal_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Meal {id}"),
        "description": "One-pot lentils with rice",
        "cookingMethod": "Pressure cooker",
        "prepTimeMinutes": 10,
        "cookingTimeMinutes": 20,
        "todoList": ["rinse dal", "chop onion"],
        "stepByStepRecipe": [
            "Rinse the dal and rice.",
            "Heat oil in the cooker.",
            "Temper cumin seeds.",
            "Add onion and saute.",
            "Add dal, rice and water.",
            "Pressure cook for 3 whistles."
        ],
        "prepChecklist": {"washing": ["dal", "rice"], "chopping": ["onion"], "marinating": []},
        "cookingSequence": ["temper", "saute", "pressure cook"],
        "usedIngredients": ["dal 1/2 cup", "rice 1/2 cup", "onion 1"],
        "nutrition": {"caloriesRange": "450-500", "proteinRange": "15-18g"},
        "leftoverStrategy": "Pack for lunch"
    })
}

/// A plan payload with `days` days that satisfies the plan schema.
///
/// The schedule is deliberately out of order (cook before shop, day 2
/// before day 1) so tests can observe refinement.
pub fn sample_plan_json(days: u32) -> Value {
    let day_entries: Vec<Value> = (1..=days)
        .map(|d| {
            json!({
                "day": d,
                "meals": {
                    "breakfast": sample_meal_json(&format!("d{d}-breakfast")),
                    "lunch": sample_meal_json(&format!("d{d}-lunch")),
                    "dinner": sample_meal_json(&format!("d{d}-dinner")),
                }
            })
        })
        .collect();

    let mut schedule: Vec<Value> = Vec::new();
    for d in (1..=days).rev() {
        schedule.push(json!({
            "id": format!("cook-{d}"), "type": "cook", "day": d,
            "timeBlock": "Evening", "description": "Cook dinner", "durationMinutes": 40
        }));
        schedule.push(json!({
            "id": format!("shop-{d}"), "type": "shop", "day": d,
            "timeBlock": "Morning", "description": "Buy vegetables", "durationMinutes": 30
        }));
    }

    let per_day: Vec<Value> = (1..=days)
        .map(|d| json!({"day": d, "caloriesRange": "1600-1800", "proteinRange": "50-60g"}))
        .collect();

    json!({
        "days": day_entries,
        "groceryList": [
            {"ingredient": "onion", "needed": false, "usedInMeals": 3, "category": "produce"},
            {"ingredient": "curd", "needed": true, "usedInMeals": 1, "category": "dairy"}
        ],
        "schedule": schedule,
        "substitutions": [],
        "budgetSummary": {"level": "medium", "verdict": "feasible", "strategy": ["reuse onion"]},
        "nutritionSummary": {"perDay": per_day}
    })
}
