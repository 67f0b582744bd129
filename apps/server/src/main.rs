#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use pagewatch_service::Orchestrator;
use pagewatch_service::config::{Config, TRIGGER_SECRET_VAR, trigger_secret};
use tracing::{info, warn};

mod error;
mod routes;
mod state;

use error::AppError;
use logger::init_tracing;
use state::AppState;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config_path = std::env::var("PAGEWATCH_CONFIG").ok();
    let config = Config::from_config(config_path.as_ref()).context("failed to load configuration")?;
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    let secret = trigger_secret();
    if secret.is_none() {
        warn!("{TRIGGER_SECRET_VAR} is not set, the trigger endpoint will reject every request");
    }

    let orchestrator = Arc::new(Orchestrator::open(config).await?);
    let state = web::Data::new(AppState::new(orchestrator, secret));

    info!("Listening on {addr}");
    run_server(addr, state).await
}

async fn run_server(addr: SocketAddr, state: web::Data<AppState>) -> Result<(), AppError> {
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}
