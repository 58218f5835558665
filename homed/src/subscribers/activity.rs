use crate::state::AppState;
use home_core::events::HomeEvent;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

/// Writes a human-readable activity line per home event.
pub fn spawn(app: AppState) {
    let mut stream = BroadcastStream::new(app.events.subscribe());
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(ev) => log_event(&ev),
                Err(e) => tracing::warn!("activity log lagged: {e}"),
            }
        }
    });
}

fn log_event(ev: &HomeEvent) {
    match ev {
        HomeEvent::DeviceAdded { device } => {
            tracing::info!(device_id = %device.id, name = %device.name, "device added")
        }
        HomeEvent::DeviceRemoved { device_id } => {
            tracing::info!(%device_id, "device removed")
        }
        HomeEvent::DeviceStateChanged { device_id, from, to, .. } => {
            tracing::info!(%device_id, %from, %to, "device manually set to {to}")
        }
        HomeEvent::ControllerAdded { controller } => {
            tracing::info!(controller_id = %controller.id, name = %controller.name, "controller added")
        }
        HomeEvent::ControllerRemoved { controller_id } => {
            tracing::info!(%controller_id, "controller removed")
        }
        HomeEvent::ControllerConnection { controller_id, connected } => {
            tracing::info!(%controller_id, connected, "controller connection changed")
        }
        HomeEvent::CommandRecorded { command } => {
            tracing::debug!(device_id = %command.device_id, action = %command.action, "command recorded")
        }
        HomeEvent::ApplianceInfoUpdated { device_id } => {
            tracing::info!(%device_id, "appliance info updated")
        }
        HomeEvent::HomeCleared => tracing::info!("all home data cleared"),
    }
}
