// antrian/server/src/config.rs

use crate::errors::{AppError, Result};
use antrian::{NotifyPolicy, QueueSettings};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  pub page_size: u32,
  /// When set, payment callbacks must present it in `X-Callback-Token`.
  pub payment_callback_token: Option<String>,

  pub notify_timeout: Duration,
  pub notify_max_reconnects: u32,
  pub notify_reconnect_backoff: Duration,
  pub channel_sender: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    let config = Self::from_lookup(|name| env::var(name).ok())?;
    tracing::info!("Application configuration loaded successfully.");
    Ok(config)
  }

  /// Builds the configuration from any variable source. Blank values count
  /// as unset.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_or(&get, "SERVER_PORT", 8080u16)?;
    let database_url =
      get("DATABASE_URL").ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;
    let database_max_connections = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10u32)?;
    let run_migrations = parse_or(&get, "RUN_MIGRATIONS", true)?;

    let page_size = parse_or(&get, "PAGE_SIZE", 20u32)?;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
      return Err(AppError::Config(format!(
        "Invalid PAGE_SIZE: {} (expected 1..={})",
        page_size, MAX_PAGE_SIZE
      )));
    }
    let payment_callback_token = get("PAYMENT_CALLBACK_TOKEN");

    let notify_timeout = Duration::from_millis(parse_or(&get, "NOTIFY_TIMEOUT_MS", 3000u64)?);
    let notify_max_reconnects = parse_or(&get, "NOTIFY_MAX_RECONNECTS", 3u32)?;
    let notify_reconnect_backoff = Duration::from_millis(parse_or(&get, "NOTIFY_RECONNECT_BACKOFF_MS", 200u64)?);
    let channel_sender = get("CHANNEL_SENDER").unwrap_or_else(|| "antrian-bot".to_string());

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      page_size,
      payment_callback_token,
      notify_timeout,
      notify_max_reconnects,
      notify_reconnect_backoff,
      channel_sender,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }

  /// The subset handed to the queue core.
  pub fn queue_settings(&self) -> QueueSettings {
    QueueSettings {
      page_size: self.page_size,
      notify: NotifyPolicy {
        timeout: self.notify_timeout,
        max_reconnects: self.notify_max_reconnects,
        reconnect_backoff: self.notify_reconnect_backoff,
      },
    }
  }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
  G: Fn(&str) -> Option<String>,
{
  match get(name) {
    None => Ok(default),
    Some(raw) => raw
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
  }
}
