//! # REST API for Daily Logs
//!
//! Submission of the daily log form, the raw listing and the overview table.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::CreateDailyLogRequest;
use tracing::{error, info};

use crate::domain::{DailyLogService, DailyLogTableQuery, DailyLogTableService};
use crate::io::rest::AuthenticatedSession;
use crate::AppState;

/// Query string of the overview table. `columns` is comma separated.
#[derive(Debug, Default, Deserialize)]
pub struct DailyLogTableParams {
    pub column: Option<String>,
    pub value: Option<String>,
    pub columns: Option<String>,
}

impl From<DailyLogTableParams> for DailyLogTableQuery {
    fn from(params: DailyLogTableParams) -> Self {
        let columns = params
            .columns
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        DailyLogTableQuery {
            column: params.column,
            value: params.value,
            columns,
        }
    }
}

pub async fn list_daily_logs(
    State(state): State<AppState>,
    session: AuthenticatedSession,
) -> impl IntoResponse {
    info!("GET /api/daily-logs - session: {}", session.session_id);

    let service = DailyLogService::new(state.repository(&session.state));
    let response = service.list_daily_logs().await;
    if let Some(message) = &response.error {
        error!("Daily log listing degraded: {}", message);
    }
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn create_daily_log(
    State(state): State<AppState>,
    session: AuthenticatedSession,
    Json(request): Json<CreateDailyLogRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/daily-logs - session: {}, caregiver: {:?}, medications: {:?}",
        session.session_id, request.caregiver, request.medication_ids
    );

    let service = DailyLogService::new(state.repository(&session.state));
    match service.submit(request).await {
        Ok(response) => {
            if !response.link_failures.is_empty() {
                error!(
                    "Daily log {} saved with {} unlinked medication(s)",
                    response.daily_log.id,
                    response.link_failures.len()
                );
            }
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to submit daily log: {}", e);
            e.into_response()
        }
    }
}

pub async fn get_daily_log_table(
    State(state): State<AppState>,
    session: AuthenticatedSession,
    Query(params): Query<DailyLogTableParams>,
) -> impl IntoResponse {
    info!("GET /api/daily-logs/table - session: {}, {:?}", session.session_id, params);

    let listing = DailyLogService::new(state.repository(&session.state))
        .list_daily_logs()
        .await;
    let query = DailyLogTableQuery::from(params);
    match DailyLogTableService::new().build_table(listing, &query) {
        Ok(table) => (StatusCode::OK, Json(table)).into_response(),
        Err(e) => {
            error!("Failed to build daily log table: {}", e);
            e.into_response()
        }
    }
}
