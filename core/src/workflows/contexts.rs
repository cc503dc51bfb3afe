// antrian/core/src/workflows/contexts.rs

//! Data carried through the queue pipelines. Handlers receive these wrapped
//! in [`ContextData`](crate::pipeline::ContextData).

use crate::checkout::DeliveryInfo;
use crate::clock::Clock;
use crate::ledger::{OrderLedger, TransitionOutcome};
use crate::model::{Order, OrderId, OrderStatus};
use crate::notify::NotifierGateway;
use crate::status::{Actor, TransitionRequest};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Collaborators every pipeline needs.
#[derive(Clone)]
pub struct QueueDeps {
  pub ledger: Arc<dyn OrderLedger>,
  pub clock: Arc<dyn Clock>,
  pub gateway: Arc<NotifierGateway>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub deps: QueueDeps,
  pub buyer_id: String,
  pub delivery: DeliveryInfo,
  pub now: Option<DateTime<Utc>>,
  pub created_order: Option<Order>,
}

impl CheckoutCtxData {
  pub fn new(deps: QueueDeps, buyer_id: &str, delivery: DeliveryInfo) -> Self {
    Self {
      deps,
      buyer_id: buyer_id.to_string(),
      delivery,
      now: None,
      created_order: None,
    }
  }
}

#[derive(Clone)]
pub struct TransitionCtxData {
  pub deps: QueueDeps,
  pub order_id: OrderId,
  pub actor: Actor,
  pub request: TransitionRequest,
  pub now: Option<DateTime<Utc>>,
  /// Row as loaded before authorization.
  pub loaded_order: Option<Order>,
  pub outcome: Option<TransitionOutcome>,
}

impl TransitionCtxData {
  pub fn new(deps: QueueDeps, order_id: OrderId, actor: Actor, request: TransitionRequest) -> Self {
    Self {
      deps,
      order_id,
      actor,
      request,
      now: None,
      loaded_order: None,
      outcome: None,
    }
  }

  /// Whether the order ended this run in `done`, freshly or from a retry.
  pub fn order_is_done(&self) -> bool {
    self
      .outcome
      .as_ref()
      .is_some_and(|o| o.order.status == OrderStatus::Done)
  }
}
