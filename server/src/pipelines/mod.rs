// antrian/server/src/pipelines/mod.rs

//! Pipelines owned by the HTTP surface. Queue operations themselves run as
//! the core's pipelines inside `QueueService`.

use crate::errors::AppError;
use antrian::Registry;

pub mod contexts;
pub mod payment_callback_pipeline;

pub fn register_all_pipelines(registry: &Registry<AppError>) {
  payment_callback_pipeline::register_payment_callback_pipeline(registry);
  tracing::info!("Server pipelines registered.");
}
