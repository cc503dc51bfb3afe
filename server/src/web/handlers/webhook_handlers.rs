// antrian/server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use antrian::{ContextData, PipelineResult};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::PaymentCallbackCtxData;
use crate::state::AppState;

pub const CALLBACK_TOKEN_HEADER: &str = "X-Callback-Token";

#[instrument(name = "handler::payment_callback", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn payment_callback_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let presented_token = req
    .headers()
    .get(CALLBACK_TOKEN_HEADER)
    .and_then(|value| value.to_str().ok())
    .map(String::from);

  let ctx_data = ContextData::new(PaymentCallbackCtxData::new(
    app_state.get_ref().clone(),
    body,
    presented_token,
  ));

  match app_state.pipelines.run(ctx_data.clone()).await {
    Ok(PipelineResult::Completed) => {
      let guard = ctx_data.read();
      let transition = guard
        .transition
        .as_ref()
        .ok_or_else(|| AppError::Queue(antrian::QueueError::Internal("payment confirmation left no outcome".into())))?;
      info!(
        order_id = transition.order.id,
        previous = %transition.previous,
        status = %transition.order.status,
        changed = transition.changed,
        "Payment callback processed."
      );
      Ok(HttpResponse::Ok().json(json!({
        "status": "processed",
        "order_id": transition.order.id,
        "order_status": transition.order.status,
        "changed": transition.changed,
      })))
    }
    // Non-final gateway statuses: acknowledge so the gateway stops retrying.
    Ok(PipelineResult::Stopped) => Ok(HttpResponse::Ok().json(json!({ "status": "ignored" }))),
    Err(app_err) => {
      warn!(error_kind = app_err.kind(), "Payment callback failed: {}", app_err);
      Err(app_err)
    }
  }
}
