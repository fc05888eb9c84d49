//! # REST API for Meals

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::CreateMealRequest;
use tracing::{error, info};

use crate::domain::MealService;
use crate::io::rest::AuthenticatedSession;
use crate::AppState;

pub async fn list_meals(
    State(state): State<AppState>,
    session: AuthenticatedSession,
) -> impl IntoResponse {
    info!("GET /api/meals - session: {}", session.session_id);

    let service = MealService::new(state.repository(&session.state));
    let response = service.list_meals().await;
    if let Some(message) = &response.error {
        error!("Meal listing degraded: {}", message);
    }
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn create_meal(
    State(state): State<AppState>,
    session: AuthenticatedSession,
    Json(request): Json<CreateMealRequest>,
) -> impl IntoResponse {
    info!("POST /api/meals - session: {}, type: {}", session.session_id, request.meal_type);

    let service = MealService::new(state.repository(&session.state));
    match service.create_meal(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to record meal: {}", e);
            e.into_response()
        }
    }
}
