// antrian/core/src/error.rs
use crate::model::OrderStatus;
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures raised by the step pipeline engine itself, independent of any
/// business rule.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No pipeline registered for context type {context_type}")]
  NotRegistered { context_type: String },

  #[error("Context type mismatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },
}

/// The error taxonomy of every queue operation.
#[derive(Debug, Error)]
pub enum QueueError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Invalid status transition from {from} to {to}")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  #[error("Not Authorized: {0}")]
  Authorization(String),

  #[error("Internal Error: {0}")]
  Internal(String),

  #[error("Pipeline Error: {source}")]
  Pipeline {
    #[from]
    source: PipelineError,
  },
}

impl QueueError {
  /// Stable name of the error class, used as a log field and in API bodies.
  pub fn kind(&self) -> &'static str {
    match self {
      QueueError::Validation(_) => "validation",
      QueueError::NotFound(_) => "not_found",
      QueueError::InvalidTransition { .. } => "invalid_transition",
      QueueError::Authorization(_) => "authorization",
      QueueError::Internal(_) | QueueError::Pipeline { .. } => "internal",
    }
  }
}

// Ledger and notifier implementations may bubble up anyhow errors.
impl From<AnyhowError> for QueueError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<QueueError>() {
      Ok(queue_err) => queue_err,
      Err(other) => QueueError::Internal(format!("{:#}", other)),
    }
  }
}

pub type Result<T, E = QueueError> = std::result::Result<T, E>;
