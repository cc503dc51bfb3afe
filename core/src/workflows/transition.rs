// antrian/core/src/workflows/transition.rs
use crate::error::QueueError;
use crate::notify::OrderEvent;
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::registry::Registry;
use crate::status::Actor;
use crate::workflows::contexts::TransitionCtxData;
use std::sync::Arc;
use tracing::{debug, info};

pub fn register_transition_pipeline(registry: &Registry<QueueError>) {
  let system_actor: SkipCondition<TransitionCtxData> =
    Arc::new(|ctx_data: ContextData<TransitionCtxData>| ctx_data.read().actor == Actor::System);
  let not_done: SkipCondition<TransitionCtxData> =
    Arc::new(|ctx_data: ContextData<TransitionCtxData>| !ctx_data.read().order_is_done());

  let mut p = Pipeline::<TransitionCtxData, QueueError>::new(&[
    ("load_order", false, None),
    ("authorize_actor", false, Some(system_actor)),
    ("apply_transition", false, None),
    ("notify_completion", true, Some(not_done)),
  ]);

  p.on_root("load_order", |ctx_data: ContextData<TransitionCtxData>| {
    Box::pin(async move {
      let (ledger, clock, order_id) = {
        let guard = ctx_data.read();
        (guard.deps.ledger.clone(), guard.deps.clock.clone(), guard.order_id)
      };
      let order = ledger
        .find_order(order_id)
        .await?
        .ok_or_else(|| QueueError::NotFound(format!("Order {} not found.", order_id)))?;

      let mut guard = ctx_data.write();
      guard.loaded_order = Some(order);
      guard.now = Some(clock.now());
      Ok::<_, QueueError>(PipelineControl::Continue)
    })
  });

  // Operators may only move orders of the kiosk they own.
  p.on_root("authorize_actor", |ctx_data: ContextData<TransitionCtxData>| {
    Box::pin(async move {
      let (ledger, actor, kiosk_id, order_id) = {
        let guard = ctx_data.read();
        let kiosk_id = guard
          .loaded_order
          .as_ref()
          .map(|o| o.kiosk_id)
          .ok_or_else(|| QueueError::Internal("order was not loaded".to_string()))?;
        (guard.deps.ledger.clone(), guard.actor, kiosk_id, guard.order_id)
      };

      let Actor::Operator(operator_id) = actor else {
        return Ok::<_, QueueError>(PipelineControl::Continue);
      };
      let owner = ledger.kiosk_owner(kiosk_id).await?;
      if owner != Some(operator_id) {
        return Err(QueueError::Authorization(format!(
          "Operator {} does not own the kiosk of order {}.",
          operator_id, order_id
        )));
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("apply_transition", |ctx_data: ContextData<TransitionCtxData>| {
    Box::pin(async move {
      let (ledger, order_id, request, now) = {
        let guard = ctx_data.read();
        let now = guard
          .now
          .ok_or_else(|| QueueError::Internal("transition clock was not read".to_string()))?;
        (guard.deps.ledger.clone(), guard.order_id, guard.request, now)
      };

      let outcome = ledger.apply_transition(order_id, request, now).await?;
      if outcome.changed {
        info!(
          order_id,
          kiosk_id = outcome.order.kiosk_id,
          from = %outcome.previous,
          to = %outcome.order.status,
          estimated_start_at = ?outcome.order.estimated_start_at,
          estimated_finish_at = ?outcome.order.estimated_finish_at,
          "Order status changed."
        );
      } else {
        debug!(order_id, status = %outcome.order.status, requested = %request.target, "Transition was a no-op.");
      }
      ctx_data.write().outcome = Some(outcome);
      Ok::<_, QueueError>(PipelineControl::Continue)
    })
  });

  p.on_root("notify_completion", |ctx_data: ContextData<TransitionCtxData>| {
    Box::pin(async move {
      let (gateway, completed) = {
        let guard = ctx_data.read();
        let completed = guard.outcome.as_ref().map(|o| OrderEvent::Completed {
          order_id: o.order.id,
          buyer_id: o.order.buyer_id.clone(),
        });
        (guard.deps.gateway.clone(), completed)
      };
      if let Some(completed) = completed {
        gateway.publish(completed);
      }
      Ok::<_, QueueError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  info!("Status transition pipeline registered.");
}
