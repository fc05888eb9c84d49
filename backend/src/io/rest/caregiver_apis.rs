//! # REST API for Caregivers
//!
//! Roster listing and registration.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::CreateCaregiverRequest;
use tracing::{error, info};

use crate::domain::CaregiverService;
use crate::io::rest::AuthenticatedSession;
use crate::AppState;

pub async fn list_caregivers(
    State(state): State<AppState>,
    session: AuthenticatedSession,
) -> impl IntoResponse {
    info!("GET /api/caregivers - session: {}", session.session_id);

    let service = CaregiverService::new(state.repository(&session.state));
    let response = service.list_caregivers().await;
    if let Some(message) = &response.error {
        error!("Caregiver listing degraded: {}", message);
    }
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn create_caregiver(
    State(state): State<AppState>,
    session: AuthenticatedSession,
    Json(request): Json<CreateCaregiverRequest>,
) -> impl IntoResponse {
    info!("POST /api/caregivers - session: {}, name: {}", session.session_id, request.name);

    let service = CaregiverService::new(state.repository(&session.state));
    match service.create_caregiver(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to register caregiver: {}", e);
            e.into_response()
        }
    }
}
