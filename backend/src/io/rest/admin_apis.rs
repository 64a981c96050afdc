//! # REST API for the Admin Dashboard
//!
//! Login hands out a bearer token; every other endpoint needs
//! `Authorization: Bearer <token>`.

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post, put},
    Router,
};
use chrono::{Local, SecondsFormat, Utc};
use shared::{AdminLoginRequest, AdminLoginResponse, DashboardQueryRequest, SetPageRequest};
use tracing::{info, warn};

use crate::domain::admin_service::AdminError;
use crate::domain::commands::admin::AdminLoginCommand;
use crate::domain::list_query::QueryPage;
use crate::io::rest::error_response;
use crate::io::rest::mappers::{DashboardMapper, StudentMapper};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/reload", post(reload_dashboard))
        .route("/dashboard/query", patch(update_dashboard_query))
        .route("/dashboard/page", put(set_dashboard_page))
        .route("/students/:id", get(get_student))
}

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn admin_error_response(e: AdminError) -> Response {
    let (status, code) = match &e {
        AdminError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        AdminError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        AdminError::SessionExpired => (StatusCode::UNAUTHORIZED, "SESSION_EXPIRED"),
        AdminError::StudentNotFound(_) => (StatusCode::NOT_FOUND, "STUDENT_NOT_FOUND"),
        AdminError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
    };
    error_response(status, code, e.to_string())
}

fn missing_token() -> Response {
    admin_error_response(AdminError::Unauthorized)
}

fn dashboard_response(result: Result<QueryPage, AdminError>) -> Response {
    match result {
        Ok(page) => {
            let today = Local::now().date_naive();
            (StatusCode::OK, Json(DashboardMapper::to_dto(page, today))).into_response()
        }
        Err(e) => {
            warn!("Dashboard request refused: {}", e);
            admin_error_response(e)
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> impl IntoResponse {
    // Never log the password
    info!("POST /api/admin/login - username: {}", request.username);

    let command = AdminLoginCommand {
        username: request.username,
        password: request.password,
    };

    match state.admin_service.login(command, Utc::now()).await {
        Ok(session) => {
            let response = AdminLoginResponse {
                token: session.token,
                expires_at: session.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                success_message: "Login successful".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => admin_error_response(e),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    info!("POST /api/admin/logout");

    let Some(token) = bearer_token(&headers) else {
        return missing_token();
    };

    match state.admin_service.logout(token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => admin_error_response(e),
    }
}

pub async fn get_dashboard(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    info!("GET /api/admin/dashboard");

    let Some(token) = bearer_token(&headers) else {
        return missing_token();
    };

    let today = Local::now().date_naive();
    dashboard_response(state.admin_service.dashboard(token, Utc::now(), today).await)
}

/// Fetch the records again
pub async fn reload_dashboard(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    info!("POST /api/admin/dashboard/reload");

    let Some(token) = bearer_token(&headers) else {
        return missing_token();
    };

    let today = Local::now().date_naive();
    dashboard_response(state.admin_service.reload(token, Utc::now(), today).await)
}

pub async fn update_dashboard_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DashboardQueryRequest>,
) -> impl IntoResponse {
    info!("PATCH /api/admin/dashboard/query - request: {:?}", request);

    let Some(token) = bearer_token(&headers) else {
        return missing_token();
    };

    let command = match DashboardMapper::to_query_command(request) {
        Ok(command) => command,
        Err(e) => {
            warn!("Rejected dashboard query: {:#}", e);
            return error_response(StatusCode::BAD_REQUEST, "INVALID_INPUT", format!("{:#}", e));
        }
    };

    let today = Local::now().date_naive();
    dashboard_response(
        state
            .admin_service
            .update_query(token, command, Utc::now(), today)
            .await,
    )
}

pub async fn set_dashboard_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SetPageRequest>,
) -> impl IntoResponse {
    info!("PUT /api/admin/dashboard/page - page: {}", request.page);

    let Some(token) = bearer_token(&headers) else {
        return missing_token();
    };

    let today = Local::now().date_naive();
    dashboard_response(
        state
            .admin_service
            .set_page(token, request.page, Utc::now(), today)
            .await,
    )
}

/// Full record for one student
pub async fn get_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/admin/students/{}", student_id);

    let Some(token) = bearer_token(&headers) else {
        return missing_token();
    };

    match state.admin_service.student_detail(token, &student_id, Utc::now()).await {
        Ok(student) => {
            let today = Local::now().date_naive();
            (StatusCode::OK, Json(StudentMapper::to_detail_dto(student, today))).into_response()
        }
        Err(e) => admin_error_response(e),
    }
}
