//! # REST API for Authentication
//!
//! Login, sign-up, logout and session inspection. These are the only
//! endpoints an anonymous client may call.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::{
    LoginRequest, LogoutResponse, OAuthProviderResponse, SignUpRequest, SignUpResponse,
    TokenLoginRequest, TokenLoginResponse,
};
use tracing::{error, info};

use crate::error::CareError;
use crate::io::rest::mappers::SessionMapper;
use crate::io::rest::SessionHeader;
use crate::AppState;

/// Query string of the OAuth relay page
#[derive(Debug, Deserialize)]
pub struct TokenCallbackQuery {
    pub token: Option<String>,
}

/// Password login
pub async fn login(
    State(state): State<AppState>,
    SessionHeader(session_id): SessionHeader,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/login");

    match state
        .session_service
        .login_with_password(session_id, &request.email, &request.password)
        .await
    {
        Ok((id, session)) => (StatusCode::OK, Json(SessionMapper::to_dto(id, &session))).into_response(),
        Err(e) => {
            error!("Login failed: {}", e);
            e.into_response()
        }
    }
}

/// Token login with the token in the body
pub async fn login_with_token(
    State(state): State<AppState>,
    SessionHeader(session_id): SessionHeader,
    Json(request): Json<TokenLoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/token");

    match state.session_service.login_with_token(session_id, &request.token).await {
        Ok(login) => (StatusCode::OK, Json(SessionMapper::to_token_login_dto(login))).into_response(),
        Err(e) => {
            error!("Token login failed: {}", e);
            e.into_response()
        }
    }
}

/// Token login from the `token` query parameter relayed by the OAuth redirect
/// page. Without the parameter this only reports the session.
pub async fn token_callback(
    State(state): State<AppState>,
    SessionHeader(session_id): SessionHeader,
    Query(query): Query<TokenCallbackQuery>,
) -> impl IntoResponse {
    info!("GET /api/auth/callback - token present: {}", query.token.is_some());

    let Some(token) = query.token else {
        let (id, session) = state.session_service.open(session_id).await;
        let response = TokenLoginResponse {
            session: SessionMapper::to_dto(id, &session),
            already_processed: session.token_consumed,
            clear_token: false,
        };
        return (StatusCode::OK, Json(response)).into_response();
    };

    match state.session_service.login_with_token(session_id, &token).await {
        Ok(login) => (StatusCode::OK, Json(SessionMapper::to_token_login_dto(login))).into_response(),
        Err(e) => {
            error!("Token callback failed: {}", e);
            e.into_response()
        }
    }
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/signup");

    match state.session_service.sign_up(&request.email, &request.password).await {
        Ok(()) => {
            let response = SignUpResponse {
                success_message: "Account created. Check your email to confirm it.".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Sign-up failed: {}", e);
            e.into_response()
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    SessionHeader(session_id): SessionHeader,
) -> impl IntoResponse {
    info!("POST /api/auth/logout");

    let Some(id) = session_id else {
        return CareError::NotAuthenticated.into_response();
    };

    match state.session_service.logout(id).await {
        Ok(()) => {
            let response = LogoutResponse {
                success_message: "Logged out".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Logout failed: {}", e);
            e.into_response()
        }
    }
}

/// Current session, opening an anonymous one when the client has none
pub async fn get_session(
    State(state): State<AppState>,
    SessionHeader(session_id): SessionHeader,
) -> impl IntoResponse {
    info!("GET /api/auth/session");

    let (id, session) = state.session_service.open(session_id).await;
    (StatusCode::OK, Json(SessionMapper::to_dto(id, &session))).into_response()
}

pub async fn oauth_provider(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/auth/providers/{}", provider);

    match state.session_service.authorize_url(&provider) {
        Ok(authorize_url) => {
            let response = OAuthProviderResponse {
                provider: provider.to_ascii_lowercase(),
                authorize_url,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("OAuth provider lookup failed: {}", e);
            e.into_response()
        }
    }
}
