//! Player error report intake
//!
//! `POST /api/player-errors` accepts one [`PlayerErrorReport`] per request.
//! The body is validated by the typed extractor, so a payload without
//! `errorCode` is rejected with 422 before it reaches the handler.

use ambience_common::player_errors::PLAYER_ERRORS_PATH;
use ambience_common::PlayerErrorReport;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::AppState;

/// POST /api/player-errors
pub async fn receive_player_error(
    State(state): State<AppState>,
    Json(report): Json<PlayerErrorReport>,
) -> (StatusCode, Json<Value>) {
    match state.log.log(&report) {
        Ok(_) => {
            let total = state.record_report();
            debug!(error_code = report.error_code, total, "Player error report accepted");
            (StatusCode::ACCEPTED, Json(json!({ "status": "accepted" })))
        }
        Err(e) => {
            error!("Failed to record player error report: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": e.to_string() })),
            )
        }
    }
}

/// Build player error routes
pub fn player_error_routes() -> Router<AppState> {
    Router::new().route(PLAYER_ERRORS_PATH, post(receive_player_error))
}
