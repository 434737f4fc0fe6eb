//! Process entry point: settings, tracing, store selection and both
//! listeners.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use location_tracker::inbound::http::health::HealthState;
use server::ServerSettings;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let settings =
        ServerSettings::load().map_err(|error| eyre!("failed to load settings: {error}"))?;
    let tracker = server::build_tracker(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    let rpc = server::create_rpc_server(health_state.clone(), tracker.clone(), settings.rpc_bind())?;
    let ws = server::create_ws_server(health_state.clone(), tracker, settings.ws_bind())?;

    health_state.mark_ready();
    info!("location tracker ready");
    let outcome = tokio::try_join!(rpc, ws);
    health_state.mark_unhealthy();
    outcome?;
    info!("location tracker stopped");
    Ok(())
}
