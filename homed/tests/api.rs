use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use home_core::{
    events::HomeEvent,
    model::{Command, Controller, Device, DeviceId, DeviceState},
};
use homed::{config::Config, http::build_router, state::AppState, wiring::build_state};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

async fn test_app() -> (Router, AppState) {
    let state = build_state(&Config::default()).await.expect("build state");
    (build_router(state.clone()), state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    (status, bytes.to_vec())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).expect("request")
}

async fn add_lamp(app: &Router) -> Device {
    let (status, body) =
        send(app, post_json("/devices", json!({"name": "Lamp", "type": "Light", "location": "Hall"})))
            .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_slice(&body).expect("device json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn device_lifecycle_over_http() {
    let (app, _) = test_app().await;
    let lamp = add_lamp(&app).await;
    assert_eq!(lamp.state, DeviceState::Off);
    assert_eq!(lamp.location.as_deref(), Some("Hall"));

    let (status, body) =
        send(&app, post_json(&format!("/devices/{}/state", lamp.id), json!({"state": "ON"}))).await;
    assert_eq!(status, StatusCode::OK);
    let updated: Device = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated.usage_count, 1);

    let (_, body) = send(&app, get(&format!("/devices/{}", lamp.id))).await;
    let fetched: Device = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched, updated);

    let (_, body) = send(&app, get("/commands?limit=5")).await;
    let history: Vec<Command> = serde_json::from_slice(&body).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "ON");

    let (_, body) = send(&app, get(&format!("/devices/{}/commands", lamp.id))).await;
    let per_device: Vec<Command> = serde_json::from_slice(&body).unwrap();
    assert_eq!(per_device, history);

    let (_, body) = send(&app, get("/commands/top")).await;
    let top: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(top[0]["count"], 1);
    assert_eq!(top[0]["deviceId"], lamp.id.to_string());

    let (status, _) = send(&app, delete(&format!("/devices/{}", lamp.id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, get(&format!("/devices/{}", lamp.id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clearing_data_empties_the_home() {
    let (app, _) = test_app().await;
    add_lamp(&app).await;
    let (status, _) = send(&app, delete("/data")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, get("/devices")).await;
    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let (app, _) = test_app().await;
    let missing = DeviceId::new();

    let (status, _) = send(&app, delete(&format!("/devices/{missing}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) =
        send(&app, post_json(&format!("/devices/{missing}/state"), json!({"state": "ON"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/devices/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn device_validation_rejects_blank_name() {
    let (app, _) = test_app().await;
    let (status, _) = send(&app, post_json("/devices", json!({"name": " ", "type": "Light"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn controllers_validate_and_toggle() {
    let (app, _) = test_app().await;

    let (status, _) =
        send(&app, post_json("/controllers", json!({"name": "Phone", "type": "bluetooth"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        post_json(
            "/controllers",
            json!({"name": "Phone", "type": "bluetooth", "macAddress": "00:1A:7D:DA:71:13"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let phone: Controller = serde_json::from_slice(&body).unwrap();
    assert!(!phone.connected);

    let (status, body) = send(
        &app,
        post_json(&format!("/controllers/{}/connection", phone.id), json!({"connected": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let phone: Controller = serde_json::from_slice(&body).unwrap();
    assert!(phone.connected);

    let (status, _) = send(&app, delete(&format!("/controllers/{}", phone.id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, get("/controllers")).await;
    let list: Vec<Controller> = serde_json::from_slice(&body).unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn appliance_info_merges() {
    let (app, _) = test_app().await;
    let lamp = add_lamp(&app).await;
    let uri = format!("/appliances/{}", lamp.id);

    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, post_json(&uri, json!({"model": "E27", "watts": 9}))).await;
    let (status, body) = send(&app, post_json(&uri, json!({"watts": 11}))).await;
    assert_eq!(status, StatusCode::OK);
    let rec: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rec["model"], "E27");
    assert_eq!(rec["watts"], 11);
    assert!(rec.get("lastUpdated").is_some());

    let (status, _) = send(&app, post_json(&format!("/appliances/{}", DeviceId::new()), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn qr_scan_reports_navigation_outcome() {
    let mut cfg = Config::default();
    cfg.navigation.target = Some("Exit".into());
    let state = build_state(&cfg).await.unwrap();
    let app = build_router(state);

    let (_, body) = send(&app, get("/rooms")).await;
    let rooms: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(rooms.len(), 9);

    let scan = |room: &str| {
        post_json(
            "/navigation/qr",
            json!({"roomId": room, "position": {"x": 0.0, "y": 1.6, "z": 0.0}}),
        )
    };
    let (_, body) = send(&app, scan("LabA")).await;
    let out: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(out, json!({"outcome": "guiding", "from": "LabA", "to": "Exit"}));

    let (_, body) = send(&app, scan("Nowhere")).await;
    let out: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(out["outcome"], "unknown_room");

    let (_, body) = send(&app, scan("Exit")).await;
    let out: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(out["outcome"], "destination_reached");
}

#[tokio::test]
async fn mutations_are_broadcast() {
    let (app, state) = test_app().await;
    let mut rx = state.events.subscribe();

    let lamp = add_lamp(&app).await;
    match rx.recv().await.unwrap() {
        HomeEvent::DeviceAdded { device } => assert_eq!(device.id, lamp.id),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn routine_runs_and_can_be_cancelled() {
    let (app, state) = test_app().await;
    let lamp = add_lamp(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/devices/{}/routine", lamp.id),
            json!({"steps": [{"afterMs": 0, "state": "ON"}, {"afterMs": 1000, "state": "OFF"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let started: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(started["steps"], 2);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let device = state.home.lock().await.find_device(lamp.id).unwrap();
    assert_eq!(device.state, DeviceState::Off);
    assert_eq!(device.usage_count, 1);
    let (_, body) = send(&app, get("/routines")).await;
    assert_eq!(body, b"[]");

    let (_, body) = send(
        &app,
        post_json(
            &format!("/devices/{}/routine", lamp.id),
            json!({"steps": [{"afterMs": 60000, "state": "RUNNING"}]}),
        ),
    )
    .await;
    let started: Value = serde_json::from_slice(&body).unwrap();
    let rid = started["routineId"].as_str().unwrap().to_string();

    let (status, _) = send(&app, delete(&format!("/routines/{rid}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, delete(&format!("/routines/{rid}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    tokio::time::sleep(Duration::from_secs(120)).await;
    let device = state.home.lock().await.find_device(lamp.id).unwrap();
    assert_eq!(device.state, DeviceState::Off);
}

#[tokio::test]
async fn routine_rejects_empty_steps() {
    let (app, _) = test_app().await;
    let lamp = add_lamp(&app).await;
    let (status, _) =
        send(&app, post_json(&format!("/devices/{}/routine", lamp.id), json!({"steps": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
