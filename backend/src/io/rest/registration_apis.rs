//! # REST API for the Registration Form
//!
//! One server-side form session per applicant. Every endpoint answers with
//! the session snapshot, including on rejected steps and failed submissions,
//! so the client can always render the notifications it is given.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{Local, Utc};
use shared::{ProfileImageQuery, UpdateDraftRequest};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::form_state_machine::FormError;
use crate::domain::models::ProfileImage;
use crate::domain::record_assembler::SubmissionError;
use crate::domain::registration_service::{RegistrationError, SessionView, StepOutcome};
use crate::io::rest::error_response;
use crate::io::rest::mappers::RegistrationMapper;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_registration))
        .route(
            "/:id",
            get(get_registration)
                .patch(update_registration)
                .delete(discard_registration),
        )
        .route(
            "/:id/profile-image",
            put(upload_profile_image).delete(remove_profile_image),
        )
        .route("/:id/advance", post(advance_registration))
        .route("/:id/retreat", post(retreat_registration))
        .route("/:id/reset", post(reset_registration))
}

fn outcome_status(outcome: &StepOutcome) -> StatusCode {
    match outcome {
        StepOutcome::Accepted => StatusCode::OK,
        StepOutcome::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StepOutcome::SubmissionFailed(SubmissionError::Incomplete(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StepOutcome::SubmissionFailed(SubmissionError::UploadFailed(_)) => StatusCode::BAD_GATEWAY,
        StepOutcome::SubmissionFailed(SubmissionError::SaveFailed(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn snapshot_response(view: SessionView) -> Response {
    let status = outcome_status(&view.outcome);
    (status, Json(RegistrationMapper::to_snapshot_dto(view))).into_response()
}

fn registration_error_response(e: RegistrationError) -> Response {
    match &e {
        RegistrationError::SessionNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", e.to_string())
        }
        RegistrationError::Form(FormError::AlreadySubmitted) => {
            error_response(StatusCode::CONFLICT, "ALREADY_SUBMITTED", e.to_string())
        }
        RegistrationError::Form(FormError::NotOnFinalStep) => {
            error_response(StatusCode::CONFLICT, "NOT_ON_FINAL_STEP", e.to_string())
        }
    }
}

fn respond(result: Result<SessionView, RegistrationError>) -> Response {
    match result {
        Ok(view) => snapshot_response(view),
        Err(e) => {
            warn!("Registration request failed: {}", e);
            registration_error_response(e)
        }
    }
}

/// Start a new registration session
pub async fn create_registration(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/registrations");

    let view = state.registration_service.create_session().await;
    (StatusCode::CREATED, Json(RegistrationMapper::to_snapshot_dto(view))).into_response()
}

pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("GET /api/registrations/{}", id);
    respond(state.registration_service.get_session(id).await)
}

/// Merge field edits into the draft
pub async fn update_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDraftRequest>,
) -> impl IntoResponse {
    info!("PATCH /api/registrations/{}", id);

    let update = match RegistrationMapper::to_domain_update(request) {
        Ok(update) => update,
        Err(e) => {
            warn!("Rejected draft update for {}: {:#}", id, e);
            return error_response(StatusCode::BAD_REQUEST, "INVALID_INPUT", format!("{:#}", e));
        }
    };

    respond(state.registration_service.update_draft(id, update).await)
}

/// Attach a profile image; the raw request body is the file content
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ProfileImageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    info!(
        "PUT /api/registrations/{}/profile-image - filename: {}, {} bytes",
        id,
        query.filename,
        body.len()
    );

    if query.filename.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "INVALID_INPUT", "Filename cannot be empty");
    }

    let mut image = ProfileImage::new(query.filename, body.to_vec());
    image.content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    respond(state.registration_service.set_profile_image(id, image).await)
}

pub async fn remove_profile_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("DELETE /api/registrations/{}/profile-image", id);
    respond(state.registration_service.clear_profile_image(id).await)
}

/// Validate the current step and go to the next one, submitting after step 3
pub async fn advance_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("POST /api/registrations/{}/advance", id);

    let today = Local::now().date_naive();
    let result = state.registration_service.advance(id, today, Utc::now()).await;

    if let Ok(SessionView {
        outcome: StepOutcome::SubmissionFailed(e),
        ..
    }) = &result
    {
        error!("Registration {} could not be submitted: {}", id, e);
    }
    respond(result)
}

pub async fn retreat_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("POST /api/registrations/{}/retreat", id);
    respond(state.registration_service.retreat(id).await)
}

pub async fn reset_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("POST /api/registrations/{}/reset", id);
    respond(state.registration_service.reset(id).await)
}

pub async fn discard_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("DELETE /api/registrations/{}", id);

    match state.registration_service.discard(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => registration_error_response(e),
    }
}
