use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use futures::StreamExt;
use tokio::select;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};

pub fn router() -> Router<AppState> {
    Router::new().route("/ws/events", get(events))
}

pub async fn events(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, app))
}

async fn handle_ws(stream: WebSocket, app: AppState) {
    let mut ws = stream;
    let mut sub = BroadcastStream::new(app.events.subscribe());

    loop {
        select! {
            msg = ws.next() => {
                if client_gone(&msg) {
                    break;
                }
            }
            maybe_event = sub.next() => {
                match maybe_event {
                    Some(Ok(ev)) => {
                        let json = match serde_json::to_string(&ev) {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::warn!("failed to encode home event: {e}");
                                continue;
                            }
                        };
                        if ws.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(BroadcastStreamRecvError::Lagged(n))) => {
                        tracing::warn!(skipped = n, "websocket client lagging behind events");
                    }
                    None => break,
                }
            }
        }
    }
}

/// Ended stream, read error and Close frame all mean the client is gone.
fn client_gone(msg: &Option<Result<Message, axum::Error>>) -> bool {
    matches!(msg, None | Some(Err(_)) | Some(Ok(Message::Close(_))))
}
