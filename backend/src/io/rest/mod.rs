//! # REST API Interface Layer
//!
//! Axum handlers for the registration form, the admin dashboard, and client
//! log forwarding. Each `*_apis` module exposes a `router()` that is nested
//! under `/api` by `create_router`.
//!
//! ## Error Translation
//!
//! - validation rejection -> 422
//! - profile image upload failure -> 502
//! - record insert failure -> 500
//! - unknown registration session or student -> 404
//! - operation on a submitted registration -> 409
//! - bad credentials, missing or expired admin token -> 401
//!
//! Error bodies are `{ "error": <message>, "code": <CODE> }`.

pub mod admin_apis;
pub mod logging_apis;
pub mod mappers;
pub mod registration_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// JSON error body with a stable machine-readable code
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let body = json!({
        "error": message.into(),
        "code": code,
    });
    (status, Json(body)).into_response()
}
