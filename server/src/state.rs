// antrian/server/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use antrian::{QueueService, Registry};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub service: Arc<QueueService>,
  /// Pipelines of the HTTP surface itself (payment callbacks).
  pub pipelines: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new(service: QueueService, config: AppConfig) -> Self {
    let pipelines = Registry::new();
    crate::pipelines::register_all_pipelines(&pipelines);
    Self {
      service: Arc::new(service),
      pipelines: Arc::new(pipelines),
      config: Arc::new(config),
    }
  }
}
