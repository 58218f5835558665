pub mod config;
pub mod http;
pub mod state;
pub mod subscribers;
pub mod telemetry;
pub mod wiring;

use crate::{config::Config, http::serve, telemetry::init_tracing, wiring::build_state};

pub async fn run(cfg: Config) -> anyhow::Result<()> {
    init_tracing(&cfg)?;
    let app_state = build_state(&cfg).await?;
    subscribers::spawn_all(app_state.clone());
    serve(app_state.clone(), cfg).await?;
    app_state.home.lock().await.persistence().flush().await;
    Ok(())
}
