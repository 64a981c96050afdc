use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use shared::{LogEntry, LogResponse};
use tracing::{debug, error, info, warn};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/logs", post(log_message))
}

/// Re-emit a client-side log line through the server's subscriber
pub async fn log_message(
    State(_app_state): State<AppState>,
    Json(request): Json<LogEntry>,
) -> Result<Json<LogResponse>, StatusCode> {
    let component = request.component.as_deref().unwrap_or("frontend");
    let message = format!("[{}] {}", component, request.message);

    match request.level.to_lowercase().as_str() {
        "debug" => debug!("{}", message),
        "info" => info!("{}", message),
        "warn" => warn!("{}", message),
        "error" => error!("{}", message),
        _ => info!("{}", message), // Default to info for unknown levels
    }

    Ok(Json(LogResponse { success: true }))
}
