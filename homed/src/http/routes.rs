use crate::{
    http::{handlers as h, navigation as nav, routine, ws},
    state::AppState,
};
use axum::{
    Router,
    routing::{delete, get, post},
};

pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(h::healthz))
        .route("/data", delete(h::clear_all))
        .route("/devices", get(h::list_devices).post(h::add_device))
        .route("/devices/{id}", get(h::get_device).delete(h::remove_device))
        .route("/devices/{id}/state", post(h::set_device_state))
        .route("/devices/{id}/commands", get(h::device_commands))
        .route("/devices/{id}/routine", post(routine::start))
        .route("/routines", get(routine::list))
        .route("/routines/{id}", delete(routine::cancel))
        .route("/controllers", get(h::list_controllers).post(h::add_controller))
        .route("/controllers/{id}", delete(h::remove_controller))
        .route("/controllers/{id}/connection", post(h::set_connection))
        .route("/commands", get(h::command_history))
        .route("/commands/top", get(h::top_commands))
        .route("/appliances/{id}", get(h::get_appliance).post(h::update_appliance))
        .route("/rooms", get(nav::list_rooms))
        .route("/navigation/qr", post(nav::qr_detected))
        .merge(ws::router())
        .with_state(state)
}
