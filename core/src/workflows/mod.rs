// antrian/core/src/workflows/mod.rs

//! The pipelines behind every mutating queue operation.

pub mod checkout;
pub mod contexts;
pub mod transition;

use crate::error::QueueError;
use crate::registry::Registry;

pub use contexts::{CheckoutCtxData, QueueDeps, TransitionCtxData};

pub fn register_all_pipelines(registry: &Registry<QueueError>) {
  checkout::register_checkout_pipeline(registry);
  transition::register_transition_pipeline(registry);
}
