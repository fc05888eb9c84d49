//! Error taxonomy shared by every layer of the backend.
//!
//! Validation failures never reach the store, authentication failures leave
//! the session untouched, and store failures abort only the operation that
//! raised them. Each variant maps to one HTTP status in [`IntoResponse`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CareError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type CareResult<T> = std::result::Result<T, CareError>;

impl CareError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CareError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CareError::Validation { .. } => "validation",
            CareError::Auth(_) | CareError::NotAuthenticated => "auth",
            CareError::SessionNotFound(_) => "session",
            CareError::Store(_) => "store",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CareError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CareError::Auth(_) | CareError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            CareError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            CareError::Store(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for CareError {
    fn from(e: reqwest::Error) -> Self {
        CareError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for CareError {
    fn from(e: serde_json::Error) -> Self {
        CareError::Store(format!("Unexpected payload: {}", e))
    }
}

impl IntoResponse for CareError {
    fn into_response(self) -> Response {
        let field = match &self {
            CareError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            kind: self.kind().to_string(),
            field,
            message: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}
