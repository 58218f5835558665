use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use home_core::{
    model::{DeviceId, DeviceState},
    schedule::Sequence,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineStep {
    #[serde(default)]
    pub after_ms: u64,
    pub state: DeviceState,
}

#[derive(Debug, Deserialize)]
pub struct NewRoutine {
    pub steps: Vec<RoutineStep>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineStarted {
    pub routine_id: Uuid,
    pub steps: usize,
}

/// Schedules a series of state changes on one device. Each step's delay is
/// relative to the step before it.
pub async fn start(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NewRoutine>,
) -> impl IntoResponse {
    let Ok(device_id) = id.parse::<DeviceId>() else {
        return (StatusCode::BAD_REQUEST, "invalid device id").into_response();
    };
    if body.steps.is_empty() {
        return (StatusCode::BAD_REQUEST, "routine needs at least one step").into_response();
    }
    if app.home.lock().await.find_device(device_id).is_none() {
        return (StatusCode::NOT_FOUND, "no such device").into_response();
    }

    let routine_id = Uuid::new_v4();
    let steps = body.steps.len();
    let mut seq = Sequence::new();
    for step in body.steps {
        let home = app.home.clone();
        let state = step.state;
        seq = seq.then_async(Duration::from_millis(step.after_ms), move || async move {
            if home.lock().await.update_device_state(device_id, state).is_none() {
                tracing::debug!(%device_id, "routine step skipped, device gone");
            }
        });
    }
    let routines = app.routines.clone();
    seq = seq.then_async(Duration::ZERO, move || async move {
        routines.lock().await.remove(&routine_id);
    });

    // hold the map lock across start so the final step cannot run before the insert
    let mut active = app.routines.lock().await;
    active.insert(routine_id, seq.start());
    drop(active);

    tracing::info!(%routine_id, %device_id, steps, "routine started");
    (StatusCode::CREATED, Json(RoutineStarted { routine_id, steps })).into_response()
}

pub async fn list(State(app): State<AppState>) -> impl IntoResponse {
    let mut ids: Vec<Uuid> = app.routines.lock().await.keys().copied().collect();
    ids.sort();
    Json(ids)
}

pub async fn cancel(State(app): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Ok(routine_id) = Uuid::try_parse(&id) else {
        return (StatusCode::BAD_REQUEST, "invalid routine id").into_response();
    };
    let handle = app.routines.lock().await.remove(&routine_id);
    match handle {
        Some(mut h) => {
            h.cancel();
            tracing::info!(%routine_id, "routine cancelled");
            StatusCode::NO_CONTENT.into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such routine").into_response(),
    }
}
