use crate::state::AppState;
use home_core::events::HomeEvent;
use metrics::{counter, gauge};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

pub fn spawn(app: AppState) {
    let mut stream = BroadcastStream::new(app.events.subscribe());
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            let ev = match item {
                Ok(ev) => ev,
                Err(e) => {
                    counter!("home.events.lagged").increment(1);
                    tracing::warn!("usage metrics lagged: {e}");
                    continue;
                }
            };
            counter!("home.events", "kind" => ev.kind()).increment(1);
            match &ev {
                HomeEvent::CommandRecorded { command } => {
                    counter!("home.command.recorded", "action" => command.action.clone())
                        .increment(1);
                }
                HomeEvent::DeviceStateChanged { usage_count, .. } => {
                    gauge!("home.device.last_usage_count").set(*usage_count as f64);
                }
                _ => {}
            }
        }
    });
}
