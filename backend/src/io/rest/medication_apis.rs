//! # REST API for Medications

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::CreateMedicationRequest;
use tracing::{error, info};

use crate::domain::MedicationService;
use crate::io::rest::AuthenticatedSession;
use crate::AppState;

pub async fn list_medications(
    State(state): State<AppState>,
    session: AuthenticatedSession,
) -> impl IntoResponse {
    info!("GET /api/medications - session: {}", session.session_id);

    let service = MedicationService::new(state.repository(&session.state));
    let response = service.list_medications().await;
    if let Some(message) = &response.error {
        error!("Medication listing degraded: {}", message);
    }
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn create_medication(
    State(state): State<AppState>,
    session: AuthenticatedSession,
    Json(request): Json<CreateMedicationRequest>,
) -> impl IntoResponse {
    info!("POST /api/medications - session: {}, name: {}", session.session_id, request.name);

    let service = MedicationService::new(state.repository(&session.state));
    match service.create_medication(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to register medication: {}", e);
            e.into_response()
        }
    }
}
