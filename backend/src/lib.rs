//! # Care Records Backend
//!
//! HTTP backend for a home-care team keeping records about one patient:
//! daily vital-sign logs, the caregiver roster, the medication catalog and
//! meals. Records live in a hosted Supabase project; this service owns the
//! sessions, validates every form, and talks to the store on behalf of the
//! signed-in caregiver.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      IO Layer (REST API)                    │
//! │  auth_apis, caregiver_apis, daily_log_apis, meal_apis, ...  │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼───────────────────────────────┐
//! │                       Domain Layer                          │
//! │  SessionService, DailyLogService, CaregiverService, ...     │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼───────────────────────────────┐
//! │                       Storage Layer                         │
//! │  RecordRepository over a RemoteStore                        │
//! │  (SupabaseStore, or MemoryStore for local runs and tests)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Domain services are cheap to build and are created per request for the
//! caller's session, so every store call carries that session's access token.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod storage;

use config::{Config, StoreBackend};
use domain::{SessionService, SessionState};
use io::rest::{
    auth_apis, caregiver_apis, daily_log_apis, form_options_apis, meal_apis, medication_apis,
    SESSION_HEADER,
};
use storage::{MemoryStore, RecordRepository, RemoteStore, SupabaseStore};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RemoteStore>,
    pub session_service: SessionService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn RemoteStore>, config: Config) -> Self {
        let session_service = SessionService::new(store.clone(), config.oauth_redirect.clone())
            .with_anonymous_idle_timeout(config.anonymous_session_idle);
        Self {
            store,
            session_service,
            config: Arc::new(config),
        }
    }

    /// Repository acting with the session's credentials
    pub fn repository(&self, session: &SessionState) -> RecordRepository {
        RecordRepository::new(self.store.clone(), session.access_token.clone())
    }
}

/// Initialize the backend with all required services
pub fn initialize_backend(config: Config) -> Result<AppState> {
    info!("Setting up remote store");
    let store: Arc<dyn RemoteStore> = match &config.store {
        StoreBackend::Supabase { url, api_key } => {
            info!("Using Supabase project at {}", url);
            Arc::new(SupabaseStore::new(url, api_key).context("Failed to create Supabase client")?)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; records are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    info!("Setting up application state");
    Ok(AppState::new(store, config))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Result<Router> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", app_state.config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(SESSION_HEADER)]);

    let auth_routes = Router::new()
        .route("/login", post(auth_apis::login))
        .route("/token", post(auth_apis::login_with_token))
        .route("/callback", get(auth_apis::token_callback))
        .route("/signup", post(auth_apis::sign_up))
        .route("/logout", post(auth_apis::logout))
        .route("/session", get(auth_apis::get_session))
        .route("/providers/:provider", get(auth_apis::oauth_provider));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route(
            "/daily-logs",
            get(daily_log_apis::list_daily_logs).post(daily_log_apis::create_daily_log),
        )
        .route("/daily-logs/table", get(daily_log_apis::get_daily_log_table))
        .route(
            "/caregivers",
            get(caregiver_apis::list_caregivers).post(caregiver_apis::create_caregiver),
        )
        .route(
            "/medications",
            get(medication_apis::list_medications).post(medication_apis::create_medication),
        )
        .route("/meals", get(meal_apis::list_meals).post(meal_apis::create_meal))
        .route("/forms/options", get(form_options_apis::get_form_options));

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}
