// antrian/server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use antrian::{PipelineError, QueueError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Queue(#[from] QueueError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}

impl AppError {
  pub fn validation(message: impl Into<String>) -> Self {
    AppError::Queue(QueueError::Validation(message.into()))
  }

  pub fn unauthorized(message: impl Into<String>) -> Self {
    AppError::Queue(QueueError::Authorization(message.into()))
  }

  /// Error class used for logging; matches [`QueueError::kind`].
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Queue(err) => err.kind(),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) => "internal",
    }
  }
}

// Server-side pipelines share the core engine.
impl From<PipelineError> for AppError {
  fn from(err: PipelineError) -> Self {
    AppError::Queue(QueueError::from(err))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Queue(QueueError::Validation(_)) => StatusCode::BAD_REQUEST,
      AppError::Queue(QueueError::NotFound(_)) => StatusCode::NOT_FOUND,
      AppError::Queue(QueueError::InvalidTransition { .. }) => StatusCode::CONFLICT,
      AppError::Queue(QueueError::Authorization(_)) => StatusCode::FORBIDDEN,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(error_kind = self.kind(), application_error = %self, "Responding with error");
    } else {
      tracing::warn!(error_kind = self.kind(), application_error = %self, "Rejecting request");
    }

    // Store and configuration failures stay in the logs.
    let message = match self {
      AppError::Queue(QueueError::Internal(_)) | AppError::Queue(QueueError::Pipeline { .. }) => {
        "An internal error occurred".to_string()
      }
      AppError::Queue(err) => err.to_string(),
      AppError::Sqlx(_) | AppError::Migrate(_) => "Database operation failed".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
    };
    HttpResponse::build(status).json(json!({ "error": message, "kind": self.kind() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use antrian::OrderStatus;

  #[test]
  fn queue_errors_map_to_their_status_codes() {
    let cases = [
      (AppError::validation("bad cart"), StatusCode::BAD_REQUEST),
      (AppError::Queue(QueueError::NotFound("order 1".into())), StatusCode::NOT_FOUND),
      (
        AppError::Queue(QueueError::InvalidTransition {
          from: OrderStatus::Pending,
          to: OrderStatus::Done,
        }),
        StatusCode::CONFLICT,
      ),
      (AppError::unauthorized("not yours"), StatusCode::FORBIDDEN),
      (AppError::Queue(QueueError::Internal("boom".into())), StatusCode::INTERNAL_SERVER_ERROR),
      (AppError::Config("PAGE_SIZE".into()), StatusCode::INTERNAL_SERVER_ERROR),
      (AppError::Sqlx(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, expected) in cases {
      assert_eq!(err.status_code(), expected, "{}", err);
    }
  }

  #[test]
  fn store_failures_are_not_leaked() {
    let response = AppError::Sqlx(sqlx::Error::PoolTimedOut).error_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let internal = AppError::Queue(QueueError::Internal("password=hunter2".into()));
    assert_eq!(internal.kind(), "internal");
  }

  #[test]
  fn pipeline_errors_become_internal_queue_errors() {
    let err = AppError::from(PipelineError::NotRegistered {
      context_type: "PaymentCallbackCtxData".to_string(),
    });
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.kind(), "internal");
  }
}
