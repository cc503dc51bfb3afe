// antrian/server/src/pipelines/payment_callback_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::{PaymentCallback, PaymentCallbackCtxData};
use crate::services::classify_transaction;
use antrian::pipeline::SkipCondition;
use antrian::{ContextData, Pipeline, PipelineControl, Registry};
use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use tracing::{info, warn};

/// Compares the presented callback token without leaking how much of it matched.
fn callback_token_matches(expected: &str, presented: Option<&str>) -> bool {
  match presented {
    Some(presented) if presented.len() == expected.len() => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
    _ => false,
  }
}

pub fn register_payment_callback_pipeline(registry: &Registry<AppError>) {
  let no_token_configured: SkipCondition<PaymentCallbackCtxData> =
    Arc::new(|ctx_data: ContextData<PaymentCallbackCtxData>| {
      ctx_data.read().app_state.config.payment_callback_token.is_none()
    });

  let mut p = Pipeline::<PaymentCallbackCtxData, AppError>::new(&[
    ("verify_callback_token", false, Some(no_token_configured)),
    ("parse_callback_payload", false, None),
    ("classify_transaction", false, None),
    ("confirm_payment", false, None),
  ]);

  p.on_root("verify_callback_token", |ctx_data: ContextData<PaymentCallbackCtxData>| {
    Box::pin(async move {
      let (expected, presented) = {
        let guard = ctx_data.read();
        (
          guard.app_state.config.payment_callback_token.clone(),
          guard.presented_token.clone(),
        )
      };
      if let Some(expected) = expected.as_deref() {
        if callback_token_matches(expected, presented.as_deref()) {
          return Ok::<_, AppError>(PipelineControl::Continue);
        }
      }
      warn!(token_present = presented.is_some(), "Payment callback rejected: bad callback token.");
      Err(AppError::unauthorized("Invalid or missing callback token."))
    })
  });

  p.on_root("parse_callback_payload", |ctx_data: ContextData<PaymentCallbackCtxData>| {
    Box::pin(async move {
      let raw_payload = ctx_data.read().raw_payload.clone();
      let callback: PaymentCallback = serde_json::from_slice(&raw_payload)
        .map_err(|e| AppError::validation(format!("Invalid payment callback payload: {}", e)))?;
      info!(
        order_id = callback.order_id,
        transaction_status = %callback.transaction_status,
        "Payment callback received."
      );
      ctx_data.write().callback = Some(callback);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Statuses that settle nothing are acknowledged and go no further.
  p.on_root("classify_transaction", |ctx_data: ContextData<PaymentCallbackCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let Some(callback) = guard.callback.as_ref() else {
        return Err(AppError::validation("Payment callback was not parsed."));
      };
      match classify_transaction(&callback.transaction_status) {
        Some(outcome) => {
          guard.outcome = Some(outcome);
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        None => {
          info!(
            order_id = callback.order_id,
            transaction_status = %callback.transaction_status,
            "Ignoring non-final payment status."
          );
          Ok(PipelineControl::Stop)
        }
      }
    })
  });

  p.on_root("confirm_payment", |ctx_data: ContextData<PaymentCallbackCtxData>| {
    Box::pin(async move {
      let (service, order_id, outcome) = {
        let guard = ctx_data.read();
        let order_id = guard.callback.as_ref().map(|c| c.order_id);
        match (order_id, guard.outcome) {
          (Some(order_id), Some(outcome)) => (guard.app_state.service.clone(), order_id, outcome),
          _ => return Err(AppError::validation("Payment callback was not classified.")),
        }
      };

      let transition = service.confirm_payment(order_id, outcome).await?;
      ctx_data.write().transition = Some(transition);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}
