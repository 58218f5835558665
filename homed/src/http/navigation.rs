use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use home_core::navigation::QrDetection;
use std::sync::PoisonError;

pub async fn list_rooms(State(app): State<AppState>) -> impl IntoResponse {
    let nav = app.navigation.lock().unwrap_or_else(PoisonError::into_inner);
    Json(nav.rooms().rooms().to_vec())
}

/// Entry point for the glasses' QR decoder. Replies with what navigation made of the scan.
pub async fn qr_detected(
    State(app): State<AppState>,
    Json(scan): Json<QrDetection>,
) -> impl IntoResponse {
    // scans are serialised by the scanner lock, so the outcome read below is this one
    let scanner = app.scanner.lock().unwrap_or_else(PoisonError::into_inner);
    scanner.on_qr_detected(scan.room_id, scan.position, scan.rotation);
    let outcome =
        app.navigation.lock().unwrap_or_else(PoisonError::into_inner).last_outcome().cloned();
    drop(scanner);

    match outcome {
        Some(outcome) => Json(outcome).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "scan was not handled").into_response(),
    }
}
