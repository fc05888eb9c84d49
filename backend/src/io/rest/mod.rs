//! # REST API Interface Layer
//!
//! HTTP handlers, one module per workflow. Handlers log the request, build
//! the domain service for the caller's session, and translate the outcome
//! into a status code. They carry no business rules.

pub mod auth_apis;
pub mod caregiver_apis;
pub mod daily_log_apis;
pub mod form_options_apis;
pub mod mappers;
pub mod meal_apis;
pub mod medication_apis;
pub mod session_extractor;

pub use session_extractor::{AuthenticatedSession, SessionHeader, SESSION_HEADER};
