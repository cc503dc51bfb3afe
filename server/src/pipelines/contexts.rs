// antrian/server/src/pipelines/contexts.rs

use crate::state::AppState;
use actix_web::web::Bytes;
use antrian::{PaymentOutcome, TransitionOutcome};
use serde::Deserialize;

/// Body of a payment gateway callback.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
  pub order_id: i64,
  pub transaction_status: String,
}

#[derive(Clone)]
pub struct PaymentCallbackCtxData {
  pub app_state: AppState,
  pub raw_payload: Bytes,
  /// Value of the `X-Callback-Token` header, if any.
  pub presented_token: Option<String>,
  pub callback: Option<PaymentCallback>,
  pub outcome: Option<PaymentOutcome>,
  pub transition: Option<TransitionOutcome>,
}

impl PaymentCallbackCtxData {
  pub fn new(app_state: AppState, raw_payload: Bytes, presented_token: Option<String>) -> Self {
    Self {
      app_state,
      raw_payload,
      presented_token,
      callback: None,
      outcome: None,
      transition: None,
    }
  }
}
