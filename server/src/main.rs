// antrian/server/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod pipelines;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::PgLedger;
use crate::errors::AppError;
use crate::services::ChannelNotifier;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use antrian::{QueueService, SystemClock};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` overrides the default `info` filter; `LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);

  let json = std::env::var("LOG_FORMAT")
    .map(|v| v.eq_ignore_ascii_case("json"))
    .unwrap_or(false);
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

fn startup_error(err: AppError) -> std::io::Error {
  tracing::error!(error = %err, "Startup failed.");
  std::io::Error::other(err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing();
  tracing::info!("Starting antrian server...");

  let app_config = AppConfig::from_env().map_err(startup_error)?;

  let db_pool = db::connect(&app_config.database_url, app_config.database_max_connections)
    .await
    .map_err(|e| startup_error(AppError::Sqlx(e)))?;
  tracing::info!("Successfully connected to the database.");

  if app_config.run_migrations {
    db::MIGRATOR
      .run(&db_pool)
      .await
      .map_err(|e| startup_error(AppError::Migrate(e)))?;
    tracing::info!("Database migrations applied.");
  }

  let channel = Arc::new(ChannelNotifier::new(app_config.channel_sender.clone()));
  let service = QueueService::new(
    Arc::new(PgLedger::new(db_pool)),
    Arc::new(SystemClock),
    channel.clone(),
    app_config.queue_settings(),
  );

  let server_address = app_config.bind_address();
  let app_state = AppState::new(service, app_config);
  let service = app_state.service.clone();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  service.flush_notifications().await;
  channel.drop_connection();
  tracing::info!(delivered = channel.delivered(), "Server stopped.");
  Ok(())
}
