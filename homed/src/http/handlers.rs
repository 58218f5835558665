use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use home_core::model::{ControllerId, DeviceId, DeviceState, NewController, NewDevice};
use serde_json::Value;
use std::collections::BTreeMap;

const DEFAULT_HISTORY_LIMIT: usize = 20;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn clear_all(State(app): State<AppState>) -> impl IntoResponse {
    app.home.lock().await.clear_all();
    StatusCode::NO_CONTENT
}

pub async fn list_devices(State(app): State<AppState>) -> impl IntoResponse {
    Json(app.home.lock().await.list_devices())
}

pub async fn add_device(
    State(app): State<AppState>,
    Json(body): Json<NewDevice>,
) -> impl IntoResponse {
    if let Err(e) = body.validate() {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    let device = app.home.lock().await.add_device(body);
    (StatusCode::CREATED, Json(device)).into_response()
}

pub async fn get_device(State(app): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Ok(id) = parse_device_id(&id) else {
        return (StatusCode::BAD_REQUEST, "invalid device id").into_response();
    };
    match app.home.lock().await.find_device(id) {
        Some(d) => Json(d).into_response(),
        None => (StatusCode::NOT_FOUND, "no such device").into_response(),
    }
}

/// Unknown ids are a no-op, so this answers 204 either way.
pub async fn remove_device(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(id) = parse_device_id(&id) else {
        return (StatusCode::BAD_REQUEST, "invalid device id").into_response();
    };
    app.home.lock().await.remove_device(id);
    StatusCode::NO_CONTENT.into_response()
}

#[derive(serde::Deserialize)]
pub struct SetStateBody {
    state: DeviceState,
}

pub async fn set_device_state(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetStateBody>,
) -> impl IntoResponse {
    let Ok(id) = parse_device_id(&id) else {
        return (StatusCode::BAD_REQUEST, "invalid device id").into_response();
    };
    match app.home.lock().await.update_device_state(id, body.state) {
        Some(d) => Json(d).into_response(),
        None => (StatusCode::NOT_FOUND, "no such device").into_response(),
    }
}

pub async fn list_controllers(State(app): State<AppState>) -> impl IntoResponse {
    Json(app.home.lock().await.list_controllers())
}

pub async fn add_controller(
    State(app): State<AppState>,
    Json(body): Json<NewController>,
) -> impl IntoResponse {
    if let Err(e) = body.validate() {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    let controller = app.home.lock().await.add_controller(body);
    (StatusCode::CREATED, Json(controller)).into_response()
}

pub async fn remove_controller(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(id) = id.parse::<ControllerId>() else {
        return (StatusCode::BAD_REQUEST, "invalid controller id").into_response();
    };
    app.home.lock().await.remove_controller(id);
    StatusCode::NO_CONTENT.into_response()
}

#[derive(serde::Deserialize)]
pub struct ConnectionBody {
    connected: bool,
}

pub async fn set_connection(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ConnectionBody>,
) -> impl IntoResponse {
    let Ok(id) = id.parse::<ControllerId>() else {
        return (StatusCode::BAD_REQUEST, "invalid controller id").into_response();
    };
    match app.home.lock().await.set_connected(id, body.connected) {
        Some(c) => Json(c).into_response(),
        None => (StatusCode::NOT_FOUND, "no such controller").into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

pub async fn command_history(
    State(app): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> impl IntoResponse {
    Json(app.home.lock().await.history(q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)))
}

pub async fn device_commands(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<LimitQuery>,
) -> impl IntoResponse {
    let Ok(id) = parse_device_id(&id) else {
        return (StatusCode::BAD_REQUEST, "invalid device id").into_response();
    };
    let home = app.home.lock().await;
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(home.command_log().history_for_device(id, limit)).into_response()
}

pub async fn top_commands(
    State(app): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> impl IntoResponse {
    let home = app.home.lock().await;
    match q.limit {
        Some(n) => Json(home.top_commands(n)),
        None => Json(home.most_used()),
    }
}

pub async fn get_appliance(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(id) = parse_device_id(&id) else {
        return (StatusCode::BAD_REQUEST, "invalid device id").into_response();
    };
    match app.home.lock().await.appliance_info().get(id) {
        Some(rec) => Json(rec.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "no appliance info").into_response(),
    }
}

pub async fn update_appliance(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(info): Json<BTreeMap<String, Value>>,
) -> impl IntoResponse {
    let Ok(id) = parse_device_id(&id) else {
        return (StatusCode::BAD_REQUEST, "invalid device id").into_response();
    };
    let mut home = app.home.lock().await;
    if home.find_device(id).is_none() {
        return (StatusCode::NOT_FOUND, "no such device").into_response();
    }
    Json(home.update_appliance_info(id, info)).into_response()
}

fn parse_device_id(s: &str) -> Result<DeviceId, ()> {
    s.parse().map_err(|_| ())
}
