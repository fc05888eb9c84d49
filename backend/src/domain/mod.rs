//! # Domain Module
//!
//! Business rules of the caregiving record system.
//!
//! ## Module Organization
//!
//! - **session_service**: authentication state machine and access guard
//! - **form_fields**: field coercion and validation shared by the forms
//! - **caregiver_service**: caregiver roster registration and lookup
//! - **daily_log_service**: daily log submission and medication linking
//! - **daily_log_table**: overview table formatting, filtering, projection
//! - **medication_service**: medication catalog
//! - **meal_service**: meal records
//! - **form_options**: selection choices for every form
//!
//! ## Business Rules
//!
//! - No record operation runs for an unauthenticated session
//! - Invalid input is rejected before any store call
//! - Caregivers are chosen from the live roster and referenced by name on
//!   daily logs and meals, by id on medications and meals
//! - Records are never updated or deleted, except for linking a medication
//!   to the daily log it was given under

pub mod caregiver_service;
pub mod daily_log_service;
pub mod daily_log_table;
pub mod form_fields;
pub mod form_options;
pub mod meal_service;
pub mod medication_service;
pub mod session_service;

pub use caregiver_service::CaregiverService;
pub use daily_log_service::DailyLogService;
pub use daily_log_table::{DailyLogTableQuery, DailyLogTableService};
pub use form_options::FormOptionsService;
pub use meal_service::MealService;
pub use medication_service::MedicationService;
pub use session_service::{SessionService, SessionState, TokenLogin};
