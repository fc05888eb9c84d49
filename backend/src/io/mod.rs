//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: REST endpoints for the login workflow and the four
//!   record workflows
//! - **Session Transport**: reading the session id header and gating record
//!   endpoints behind an authenticated session
//! - **Error Translation**: `CareError` variants become HTTP status codes
//!   with a JSON body
//! - **Serialization**: JSON request/response DTOs from the `shared` crate

pub mod rest;

pub use rest::*;
