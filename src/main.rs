//! # YourDrobe API - backend for the YourDrobe wardrobe planner
//!
//! ## Environment Variables
//!
//! - `MONGODB_URI`: MongoDB connection string (required)
//! - `JWT_SECRET`: token signing secret (required)
//! - `APP_ENV`, `PORT`, `JWT_EXPIRES_IN`, `CORS_ORIGINS`: see [`config`]
//! - `RUST_LOG`: log filter, defaults to `yourdrobe_api=info,rocket=info`

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::CliCommand;
use crate::config::Settings;
use crate::db::MongoLifecycle;
use crate::errors::AppError;

pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod server;

/// Plain output without ANSI colours in production.
fn init_tracing(production: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yourdrobe_api=info,rocket=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(!production))
        .init();
}

/// Loads settings, then either runs a CLI command or serves HTTP.
///
/// When serving, MongoDB is connected during ignition; a failed connection
/// aborts startup before the listener is bound.
#[rocket::main]
async fn main() -> Result<(), AppError> {
    let command = cli::parse(std::env::args_os()).unwrap_or_else(|e| e.exit());

    let settings = Settings::from_env();
    init_tracing(settings.as_ref().is_ok_and(Settings::is_production));

    let settings = settings.inspect_err(|e| {
        error!(error = %e, "Failed to load settings");
    })?;

    info!(
        app_env = %settings.app_env,
        development = settings.is_development(),
        port = settings.port,
        cors_origins = ?settings.cors_origins,
        "Settings loaded"
    );

    if let Some(CliCommand::Ping) = command {
        return Ok(cli::ping(&settings).await?);
    }

    let mongo = Arc::new(MongoLifecycle::default());
    let rocket = server::build(&settings, Arc::clone(&mongo))?
        .attach(mongo.fairing(settings.mongodb_uri.clone()));

    if let Err(e) = rocket.launch().await {
        error!(error = %e, "Server stopped with an error");
        return Err(Box::new(e).into());
    }

    info!("Shutdown complete");
    Ok(())
}
