//! # REST API for Form Options
//!
//! Everything a client needs to render the selection widgets of the forms.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{info, warn};

use crate::domain::FormOptionsService;
use crate::io::rest::AuthenticatedSession;
use crate::AppState;

pub async fn get_form_options(
    State(state): State<AppState>,
    session: AuthenticatedSession,
) -> impl IntoResponse {
    info!("GET /api/forms/options - session: {}", session.session_id);

    let service = FormOptionsService::new(
        state.repository(&session.state),
        state.config.patient_name.clone(),
    );
    let response = service.form_options().await;
    for message in &response.errors {
        warn!("Form options incomplete: {}", message);
    }
    (StatusCode::OK, Json(response)).into_response()
}
