// antrian/core/src/workflows/checkout.rs
use crate::error::QueueError;
use crate::model::DeliveryType;
use crate::notify::OrderEvent;
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::registry::Registry;
use crate::workflows::contexts::CheckoutCtxData;
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_checkout_pipeline(registry: &Registry<QueueError>) {
  let nothing_to_announce: SkipCondition<CheckoutCtxData> =
    Arc::new(|ctx_data: ContextData<CheckoutCtxData>| ctx_data.read().created_order.is_none());

  let mut p = Pipeline::<CheckoutCtxData, QueueError>::new(&[
    ("validate_checkout_request", false, None),
    ("commit_order", false, None),
    ("announce_order", true, Some(nothing_to_announce)),
  ]);

  // Step 1: reject malformed input before anything is read or written.
  p.on_root("validate_checkout_request", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      if guard.buyer_id.trim().is_empty() {
        return Err(QueueError::Validation("Buyer id is required.".to_string()));
      }
      let needs_address = guard.delivery.delivery_type == DeliveryType::Delivery;
      let has_address = guard
        .delivery
        .delivery_address
        .as_deref()
        .is_some_and(|a| !a.trim().is_empty());
      if needs_address && !has_address {
        return Err(QueueError::Validation(
          "Delivery address is required for delivery orders.".to_string(),
        ));
      }
      guard.now = Some(guard.deps.clock.now());
      Ok::<_, QueueError>(PipelineControl::Continue)
    })
  });

  // Step 2: one atomic ledger write covering order, lines and cart.
  p.on_root("commit_order", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (ledger, buyer_id, delivery, now) = {
        let guard = ctx_data.read();
        let now = guard
          .now
          .ok_or_else(|| QueueError::Internal("checkout clock was not read".to_string()))?;
        (guard.deps.ledger.clone(), guard.buyer_id.clone(), guard.delivery.clone(), now)
      };

      let order = ledger.checkout(&buyer_id, &delivery, now).await?;
      info!(
        order_id = order.id,
        kiosk_id = order.kiosk_id,
        total_price = order.total_price,
        total_estimated_minutes = order.total_estimated_minutes,
        "Order created."
      );
      ctx_data.write().created_order = Some(order);
      Ok::<_, QueueError>(PipelineControl::Continue)
    })
  });

  // Step 3: best effort. Nothing here may fail the checkout.
  p.on_root("announce_order", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (deps, order) = {
        let guard = ctx_data.read();
        match &guard.created_order {
          Some(order) => (guard.deps.clone(), order.clone()),
          None => return Ok::<_, QueueError>(PipelineControl::Continue),
        }
      };

      let item_count = match deps.ledger.order_lines(&[order.id]).await {
        Ok(lines) => lines.iter().map(|l| i64::from(l.quantity)).sum(),
        Err(e) => {
          warn!(order_id = order.id, error = %e, "Could not count order lines for the announcement.");
          return Ok(PipelineControl::Continue);
        }
      };

      deps.gateway.publish(OrderEvent::Created {
        order_id: order.id,
        kiosk_id: order.kiosk_id,
        item_count,
        total_price: order.total_price,
      });
      Ok(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  info!("Checkout pipeline registered.");
}
