//! Plan coordinator: validation, caching and request deduplication in front
//! of a [`Generator`].
//!
//! Equivalent requests (same [`RequestIdentity`]) that arrive while a
//! generation is outstanding share that generation instead of starting their
//! own. Each generation runs on its own task, so a caller that stops waiting
//! never cancels it for the others. The in-flight entry is removed by the
//! task itself, after a successful plan has been cached and before any
//! waiting caller is woken.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::cache::PlanCache;
use crate::config::PlannerConfig;
use crate::error::{GenerationError, PlanError};
use crate::generator::Generator;
use crate::identity::RequestIdentity;
use crate::model::{CookingRequest, IngredientSwap, Meal, MealPlan};
use crate::prompt::{self, Prompt};
use crate::schedule;
use crate::schema::{self, Schema};
use crate::validate;

type GenerationOutcome = Result<Arc<MealPlan>, GenerationError>;
type SharedGeneration = Shared<BoxFuture<'static, GenerationOutcome>>;

struct Inner {
    generator: Arc<dyn Generator>,
    cache: PlanCache,
    in_flight: Mutex<HashMap<RequestIdentity, SharedGeneration>>,
    config: PlannerConfig,
}

impl Inner {
    fn in_flight(&self) -> MutexGuard<'_, HashMap<RequestIdentity, SharedGeneration>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One bounded generator call, decoded against `schema`.
    async fn call_generator<T: DeserializeOwned>(
        &self,
        prompt: &Prompt,
        schema: &Schema,
        expected: &'static str,
    ) -> Result<T, GenerationError> {
        let limit = self.config.generation_timeout();
        let text = tokio::time::timeout(limit, self.generator.generate(prompt, schema))
            .await
            .map_err(|_| GenerationError::Timeout(limit))?
            .map_err(|e| GenerationError::Service(format!("{e:#}")))?;
        schema.decode(expected, &text)
    }

    async fn generate_plan(&self, request: &CookingRequest) -> Result<MealPlan, GenerationError> {
        let prompt = prompt::plan_prompt(request);
        let mut plan: MealPlan = self
            .call_generator(&prompt, &schema::plan_schema(), "plan")
            .await?;
        schedule::refine_plan(&mut plan, self.config.cook_start_hour());
        Ok(plan)
    }
}

/// Removes an identity from the in-flight map when dropped, including when
/// the generation task panics.
struct InFlightGuard {
    inner: Arc<Inner>,
    identity: RequestIdentity,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight().remove(&self.identity);
    }
}

/// Cheaply cloneable handle to the plan cache, the in-flight map and the
/// generator behind them.
#[derive(Clone)]
pub struct PlanCoordinator {
    inner: Arc<Inner>,
}

impl PlanCoordinator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self::with_config(generator, PlannerConfig::default())
    }

    pub fn with_config(generator: Arc<dyn Generator>, config: PlannerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                generator,
                cache: PlanCache::new(config.cache_capacity),
                in_flight: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    pub fn cache(&self) -> &PlanCache {
        &self.inner.cache
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.inner.config
    }

    pub fn generator_name(&self) -> &str {
        self.inner.generator.name()
    }

    /// Number of generations currently outstanding.
    pub fn in_flight_len(&self) -> usize {
        self.inner.in_flight().len()
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        tracing::info!("plan cache cleared");
    }

    /// Return a plan for `request`, from the cache when possible.
    ///
    /// Invalid requests fail before the generator is touched. Concurrent
    /// equivalent requests share one generation and observe the same
    /// outcome. Failures are never cached.
    pub async fn obtain_plan(&self, request: &CookingRequest) -> Result<Arc<MealPlan>, PlanError> {
        validate::ensure_valid(request)?;

        let identity = RequestIdentity::of(request);
        if let Some(plan) = self.inner.cache.lookup(&identity) {
            tracing::debug!(identity = %identity.fingerprint(), "plan cache hit");
            return Ok(plan);
        }

        let generation = {
            let mut in_flight = self.inner.in_flight();
            if let Some(existing) = in_flight.get(&identity) {
                tracing::debug!(
                    identity = %identity.fingerprint(),
                    "joining in-flight generation"
                );
                existing.clone()
            } else if let Some(plan) = self.inner.cache.lookup(&identity) {
                // Settled between the first lookup and taking the lock.
                return Ok(plan);
            } else {
                let generation = self.spawn_generation(identity.clone(), request.clone());
                in_flight.insert(identity, generation.clone());
                generation
            }
        };

        Ok(generation.await?)
    }

    /// Must be called with the in-flight lock held, so the task's guard
    /// cannot run before the entry is registered.
    fn spawn_generation(
        &self,
        identity: RequestIdentity,
        request: CookingRequest,
    ) -> SharedGeneration {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _guard = InFlightGuard {
                inner: Arc::clone(&inner),
                identity: identity.clone(),
            };
            let started = Instant::now();
            tracing::info!(
                identity = %identity.fingerprint(),
                generator = %inner.generator.name(),
                days = request.days,
                "generating plan"
            );

            match inner.generate_plan(&request).await {
                Ok(plan) => {
                    let plan = Arc::new(plan);
                    inner.cache.insert(identity.clone(), Arc::clone(&plan));
                    tracing::info!(
                        identity = %identity.fingerprint(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "plan generated"
                    );
                    Ok(plan)
                }
                Err(e) => {
                    tracing::warn!(
                        identity = %identity.fingerprint(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "plan generation failed"
                    );
                    Err(e)
                }
            }
        });

        task.map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) => Err(GenerationError::Aborted(e.to_string())),
        })
        .boxed()
        .shared()
    }

    /// Generate a different meal to take the place of `meal`. The result
    /// always carries a freshly minted id.
    pub async fn replace_meal(
        &self,
        meal: &Meal,
        criteria: &str,
        request: &CookingRequest,
    ) -> Result<Meal, PlanError> {
        let prompt = prompt::replace_meal_prompt(meal, criteria, request);
        let mut replacement: Meal = self
            .inner
            .call_generator(&prompt, &schema::meal_schema(), "meal")
            .await?;
        replacement.id = Uuid::new_v4().to_string();
        tracing::info!(
            original = %meal.id,
            replacement = %replacement.id,
            name = %replacement.name,
            "meal replaced"
        );
        Ok(replacement)
    }

    /// Regenerate `meal` with the given ingredient swaps. The result keeps
    /// the original meal's id.
    pub async fn swap_ingredients(
        &self,
        meal: &Meal,
        swaps: &[IngredientSwap],
        request: &CookingRequest,
    ) -> Result<Meal, PlanError> {
        validate::into_result(validate::validate_swaps(swaps))?;
        let swaps: Vec<IngredientSwap> = swaps
            .iter()
            .filter(|s| !s.ingredient.trim().is_empty())
            .cloned()
            .collect();

        let prompt = prompt::swap_prompt(meal, &swaps, request);
        let mut updated: Meal = self
            .inner
            .call_generator(&prompt, &schema::meal_schema(), "meal")
            .await?;
        updated.id = meal.id.clone();
        tracing::info!(meal = %meal.id, swaps = swaps.len(), "ingredients swapped");
        Ok(updated)
    }
}

impl std::fmt::Debug for PlanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCoordinator")
            .field("generator", &self.inner.generator.name())
            .field("cache", &self.inner.cache)
            .field("in_flight", &self.in_flight_len())
            .field("config", &self.inner.config)
            .finish()
    }
}
