use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use quickchef_core::model::{CookingRequest, IngredientSwap, Meal, MealPlan, MealSlot};
use quickchef_core::{PlanCoordinator, PlanError, SpliceError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
    details: Vec<String>,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
            details: Vec::new(),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Validation(v) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: "invalid request".to_string(),
                details: v.messages,
            },
            PlanError::Generation(g) => Self {
                status: StatusCode::BAD_GATEWAY,
                message: g.to_string(),
                details: Vec::new(),
            },
        }
    }
}

impl From<SpliceError> for AppError {
    fn from(err: SpliceError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = if self.details.is_empty() {
            serde_json::json!({ "error": self.message })
        } else {
            serde_json::json!({ "error": self.message, "details": self.details })
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReplaceMealBody {
    pub request: CookingRequest,
    pub plan: MealPlan,
    pub day_index: usize,
    pub slot: MealSlot,
    #[serde(default)]
    pub criteria: String,
}

#[derive(Debug, Deserialize)]
pub struct SwapMealBody {
    pub request: CookingRequest,
    pub plan: MealPlan,
    pub day_index: usize,
    pub slot: MealSlot,
    pub swaps: Vec<IngredientSwap>,
}

#[derive(Debug, Serialize)]
pub struct MealEditResponse {
    pub meal: Meal,
    pub plan: MealPlan,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub generator: String,
    pub cached_plans: usize,
    pub in_flight: usize,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(coordinator: PlanCoordinator) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/plans", post(create_plan))
        .route("/api/meals/replace", post(replace_meal))
        .route("/api/meals/swap", post(swap_meal))
        .route("/api/cache", delete(clear_cache))
        .layer(CorsLayer::permissive())
        .with_state(coordinator)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(coordinator: PlanCoordinator, bind: &str, port: u16) -> Result<()> {
    let app = build_router(coordinator);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("quickchef serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("quickchef serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health(State(coordinator): State<PlanCoordinator>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        generator: coordinator.generator_name().to_string(),
        cached_plans: coordinator.cache().len(),
        in_flight: coordinator.in_flight_len(),
    })
}

async fn create_plan(
    State(coordinator): State<PlanCoordinator>,
    Json(request): Json<CookingRequest>,
) -> Result<Response, AppError> {
    let plan = coordinator.obtain_plan(&request.normalized()).await?;
    Ok(Json(&*plan).into_response())
}

async fn replace_meal(
    State(coordinator): State<PlanCoordinator>,
    Json(body): Json<ReplaceMealBody>,
) -> Result<Json<MealEditResponse>, AppError> {
    let ReplaceMealBody {
        request,
        mut plan,
        day_index,
        slot,
        criteria,
    } = body;
    let original = plan.meal_at(day_index, slot)?.clone();

    let meal = coordinator
        .replace_meal(&original, &criteria, &request)
        .await?;
    plan.splice_meal(day_index, slot, meal.clone())?;
    Ok(Json(MealEditResponse { meal, plan }))
}

async fn swap_meal(
    State(coordinator): State<PlanCoordinator>,
    Json(body): Json<SwapMealBody>,
) -> Result<Json<MealEditResponse>, AppError> {
    let SwapMealBody {
        request,
        mut plan,
        day_index,
        slot,
        swaps,
    } = body;
    let original = plan.meal_at(day_index, slot)?.clone();

    let meal = coordinator
        .swap_ingredients(&original, &swaps, &request)
        .await?;
    plan.splice_meal(day_index, slot, meal.clone())?;
    Ok(Json(MealEditResponse { meal, plan }))
}

async fn clear_cache(State(coordinator): State<PlanCoordinator>) -> StatusCode {
    coordinator.clear_cache();
    StatusCode::NO_CONTENT
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use quickchef_core::PlanCoordinator;
    use quickchef_test_utils::{Reply, ScriptedGenerator, sample_meal_json, sample_plan_json};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn coordinator(replies: Vec<Reply>) -> (PlanCoordinator, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator::new(replies));
        (PlanCoordinator::new(generator.clone()), generator)
    }

    async fn send(
        coordinator: &PlanCoordinator,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let app = super::build_router(coordinator.clone());
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request_json() -> Value {
        json!({
            "days": 1,
            "ingredients": [{"name": "Rice"}, {"name": "dal", "locked": true}, {"name": "onion"}]
        })
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_health() {
        let (coordinator, _) = coordinator(vec![]);
        let response = send(&coordinator, "GET", "/api/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["generator"], "scripted");
        assert_eq!(body["cached_plans"], 0);
    }

    #[tokio::test]
    async fn test_create_plan_then_cache_hit() {
        let (coordinator, generator) = coordinator(vec![Reply::json(&sample_plan_json(1))]);

        let response = send(&coordinator, "POST", "/api/plans", Some(request_json())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["days"].as_array().unwrap().len(), 1);
        assert_eq!(body["schedule"][0]["type"], "shop");
        assert_eq!(body["schedule"][1]["timeBlock"], "Day 1 @ 18:00");

        let response = send(&coordinator, "POST", "/api/plans", Some(request_json())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_create_plan_invalid_is_422() {
        let (coordinator, generator) = coordinator(vec![]);
        let response = send(
            &coordinator,
            "POST",
            "/api/plans",
            Some(json!({"ingredients": [{"name": "rice"}]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["details"][0], "Add at least 3 ingredients.");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_plan_generation_failure_is_502() {
        let (coordinator, _) = coordinator(vec![Reply::Fail("quota exceeded".into())]);
        let response = send(&coordinator, "POST", "/api/plans", Some(request_json())).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(
            body["error"].as_str().unwrap().contains("quota exceeded"),
            "unexpected body: {body}"
        );
    }

    #[tokio::test]
    async fn test_replace_meal_splices_plan() {
        let (coordinator, _) = coordinator(vec![Reply::json(&sample_meal_json("d1-dinner"))]);
        let response = send(
            &coordinator,
            "POST",
            "/api/meals/replace",
            Some(json!({
                "request": request_json(),
                "plan": sample_plan_json(1),
                "day_index": 0,
                "slot": "dinner",
                "criteria": "lighter"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let new_id = body["meal"]["id"].as_str().unwrap().to_string();
        assert_ne!(new_id, "d1-dinner");
        assert_eq!(body["plan"]["days"][0]["meals"]["dinner"]["id"], new_id);
        assert_eq!(body["plan"]["days"][0]["meals"]["lunch"]["id"], "d1-lunch");
    }

    #[tokio::test]
    async fn test_swap_meal_keeps_id() {
        let (coordinator, _) = coordinator(vec![Reply::json(&sample_meal_json("other"))]);
        let response = send(
            &coordinator,
            "POST",
            "/api/meals/swap",
            Some(json!({
                "request": request_json(),
                "plan": sample_plan_json(1),
                "day_index": 0,
                "slot": "breakfast",
                "swaps": [{"ingredient": "dal", "replacement": "moong"}]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["meal"]["id"], "d1-breakfast");
    }

    #[tokio::test]
    async fn test_swap_without_ingredients_is_422() {
        let (coordinator, _) = coordinator(vec![]);
        let response = send(
            &coordinator,
            "POST",
            "/api/meals/swap",
            Some(json!({
                "request": request_json(),
                "plan": sample_plan_json(1),
                "day_index": 0,
                "slot": "lunch",
                "swaps": []
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["details"][0], "Select at least one ingredient to swap.");
    }

    #[tokio::test]
    async fn test_replace_out_of_range_is_400() {
        let (coordinator, generator) = coordinator(vec![]);
        let response = send(
            &coordinator,
            "POST",
            "/api/meals/replace",
            Some(json!({
                "request": request_json(),
                "plan": sample_plan_json(1),
                "day_index": 4,
                "slot": "lunch"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let (coordinator, generator) = coordinator(vec![
            Reply::json(&sample_plan_json(1)),
            Reply::json(&sample_plan_json(1)),
        ]);
        send(&coordinator, "POST", "/api/plans", Some(request_json())).await;
        assert_eq!(coordinator.cache().len(), 1);

        let response = send(&coordinator, "DELETE", "/api/cache", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(coordinator.cache().is_empty());

        send(&coordinator, "POST", "/api/plans", Some(request_json())).await;
        assert_eq!(generator.calls(), 2);
    }
}
